//! Profile picture update workflow.
//!
//! [`ProfilePictureService::update_profile_picture`] validates an upload,
//! stores its thumbnail under a fresh name, points the user's record at it
//! and finally removes the picture it superseded. The record never refers
//! to a file that is not on disk: the new file exists before the record is
//! updated, and the old file is deleted only after the update committed.

use std::sync::Arc;

use dashmap::DashMap;
use kh_core::account::is_default_profile_image;
use kh_core::{Error, Result, UserId};
use parking_lot::Mutex;

use crate::naming;
use crate::policy::ExtensionPolicy;
use crate::store::ImageStore;

/// Anything that carries an uploaded file's client-side name and contents.
pub trait ImageUpload {
    fn filename(&self) -> &str;
    fn bytes(&self) -> &[u8];
}

/// An upload held fully in memory.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

impl ImageUpload for UploadedImage {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Result of an update attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The picture was stored and the profile now references `filename`.
    Stored { filename: String },
    /// The extension is not accepted; nothing was changed.
    Rejected { allowed: Vec<String> },
}

/// Access to the `profile_image` field of user records.
pub trait ProfileRepository: Send + Sync {
    /// Current picture filename. Missing users are [`Error::NotFound`].
    fn profile_image(&self, user_id: UserId) -> Result<String>;

    /// Replace the picture filename in a single write.
    fn set_profile_image(&self, user_id: UserId, filename: &str) -> Result<()>;
}

/// Runs picture updates against a repository and an image store.
///
/// Updates for the same user are serialized; different users proceed in
/// parallel.
pub struct ProfilePictureService<R> {
    repo: R,
    policy: ExtensionPolicy,
    store: ImageStore,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl<R: ProfileRepository> ProfilePictureService<R> {
    pub fn new(repo: R, policy: ExtensionPolicy, store: ImageStore) -> Self {
        Self {
            repo,
            policy,
            store,
            locks: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &ExtensionPolicy {
        &self.policy
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Replace `user_id`'s profile picture with `upload`.
    ///
    /// Blocking: decodes and encodes the image and touches the filesystem
    /// and database. Async callers should run it on a blocking thread.
    pub fn update_profile_picture(
        &self,
        user_id: UserId,
        upload: &dyn ImageUpload,
    ) -> Result<UploadOutcome> {
        let lock = Arc::clone(&self.locks.entry(user_id).or_default());
        let result = {
            let _guard = lock.lock();
            self.update_locked(user_id, upload)
        };
        drop(lock);
        // Cloning happens under the map's shard lock, so a count of one
        // means no other caller is waiting on this entry.
        self.locks
            .remove_if(&user_id, |_, l| Arc::strong_count(l) == 1);
        result
    }

    fn update_locked(&self, user_id: UserId, upload: &dyn ImageUpload) -> Result<UploadOutcome> {
        let previous = self.repo.profile_image(user_id)?;

        if !self.policy.is_allowed(upload.filename()) {
            tracing::debug!(
                %user_id,
                filename = upload.filename(),
                "Rejected profile picture extension"
            );
            return Ok(UploadOutcome::Rejected {
                allowed: self.policy.allowed().to_vec(),
            });
        }

        let filename = naming::generate(upload.filename());
        let target = self
            .store
            .path_for(&filename)
            .ok_or_else(|| Error::Internal(format!("unusable stored filename '{filename}'")))?;

        self.store.store_thumbnail(upload.bytes(), &target)?;

        if let Err(e) = self.repo.set_profile_image(user_id, &filename) {
            if let Err(cleanup) = self.store.remove_if_exists(&target) {
                tracing::warn!(
                    path = %target.display(),
                    error = %cleanup,
                    "Failed to remove unreferenced thumbnail"
                );
            }
            return Err(e);
        }

        if !is_default_profile_image(&previous) {
            self.remove_superseded(&previous);
        }

        tracing::info!(%user_id, %filename, "Profile picture updated");
        Ok(UploadOutcome::Stored { filename })
    }

    fn remove_superseded(&self, previous: &str) {
        let Some(path) = self.store.path_for(previous) else {
            tracing::warn!(filename = previous, "Superseded picture has no usable path");
            return;
        };
        match self.store.remove_if_exists(&path) {
            Ok(true) => tracing::debug!(path = %path.display(), "Removed superseded picture"),
            Ok(false) => {}
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove superseded picture"
            ),
        }
    }
}
