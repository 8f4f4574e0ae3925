//! bcrypt password hashing.

use kh_core::{Error, Result};

/// Hash a plaintext password with bcrypt's default cost.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| Error::Internal(format!("bcrypt error: {e}")))
}

/// Check `password` against a stored hash. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    hash.starts_with("$2") && bcrypt::verify(password, hash).unwrap_or(false)
}
