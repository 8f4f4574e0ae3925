//! kh-avatar: profile picture handling.
//!
//! - [`policy`] decides which uploads are acceptable by file extension
//! - [`naming`] produces collision-resistant stored filenames
//! - [`store`] thumbnails uploads into the storage directory
//! - [`workflow`] ties the above to a user's profile record
//! - [`repo`] is the SQLite-backed profile repository

pub mod naming;
pub mod policy;
pub mod repo;
pub mod store;
pub mod workflow;

pub use policy::ExtensionPolicy;
pub use repo::DbProfileRepository;
pub use store::{ImageStore, Thumbnail, THUMBNAIL_SIZE};
pub use workflow::{
    ImageUpload, ProfilePictureService, ProfileRepository, UploadOutcome, UploadedImage,
};
