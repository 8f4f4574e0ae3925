//! Constants describing a user account.

/// Sentinel `profile_image` value meaning "no custom picture set".
///
/// The file of this name in the storage directory is shared by every user
/// and is never written or deleted by the upload workflow.
pub const DEFAULT_PROFILE_IMAGE: &str = "default.png";

/// Role assigned to newly registered users.
pub const DEFAULT_ROLE: i64 = 1;

/// Status assigned to newly registered users.
pub const DEFAULT_STATUS: i64 = 1;

/// URL prefix under which the storage directory is served.
pub const PROFILE_PICS_ROUTE: &str = "/profile-pics";

/// True when `filename` is the shared default picture.
pub fn is_default_profile_image(filename: &str) -> bool {
    filename == DEFAULT_PROFILE_IMAGE
}

/// Public URL of a stored profile picture.
pub fn profile_image_url(filename: &str) -> String {
    format!("{PROFILE_PICS_ROUTE}/{filename}")
}
