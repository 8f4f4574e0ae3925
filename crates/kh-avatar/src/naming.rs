//! Random filenames for stored pictures.

use rand::RngCore;

use crate::policy::extension_of;

/// Number of random bytes in a generated name (16 hex characters).
const RANDOM_BYTES: usize = 8;

/// Produce `<16 lowercase hex chars>.<ext>` for an uploaded file.
///
/// The extension is copied from `original_filename` with its case intact. A
/// name without a dot yields the bare hex string.
pub fn generate(original_filename: &str) -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let stem = hex::encode(bytes);

    match extension_of(original_filename) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}
