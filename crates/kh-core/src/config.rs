//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server, auth and upload sections. Every section defaults sensibly so a
//! completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.auth.session_timeout_hours == 0 {
            warnings.push("auth.session_timeout_hours is 0; sessions expire immediately".into());
        } else if self.auth.session_timeout_hours > MAX_SESSION_TIMEOUT_HOURS {
            warnings.push(format!(
                "auth.session_timeout_hours is {}; capped at {MAX_SESSION_TIMEOUT_HOURS}",
                self.auth.session_timeout_hours
            ));
        }

        if self.uploads.allowed_extensions.is_empty() {
            warnings.push("uploads.allowed_extensions is empty; every upload will be rejected".into());
        }

        for ext in &self.uploads.allowed_extensions {
            if ext.is_empty() || ext.contains('.') {
                warnings.push(format!(
                    "uploads.allowed_extensions entry '{ext}' should be a bare extension such as 'png'"
                ));
            }
        }

        if self.uploads.max_upload_bytes == 0 {
            warnings.push("uploads.max_upload_bytes is 0; every upload will be refused".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("./data/keyhold.db"),
        }
    }
}

/// Session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(default = "default_session_timeout")]
    pub session_timeout_hours: u64,
    /// Mark the session cookie `Secure` (set when served over HTTPS).
    pub secure_cookie: bool,
}

fn default_session_timeout() -> u64 {
    24
}

/// Longest session lifetime handed out, ten years.
pub const MAX_SESSION_TIMEOUT_HOURS: u64 = 24 * 365 * 10;

impl AuthConfig {
    /// Session lifetime in hours, capped at [`MAX_SESSION_TIMEOUT_HOURS`].
    pub fn session_hours(&self) -> i64 {
        self.session_timeout_hours.min(MAX_SESSION_TIMEOUT_HOURS) as i64
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_timeout_hours: default_session_timeout(),
            secure_cookie: false,
        }
    }
}

/// Profile picture upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Flat directory holding stored thumbnails and the static `default.png`.
    pub storage_dir: PathBuf,
    /// Extensions (without the dot) accepted for profile pictures.
    pub allowed_extensions: Vec<String>,
    /// Request body limit for multipart uploads.
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./data/profile_pics"),
            allowed_extensions: vec!["jpg".into(), "png".into()],
            max_upload_bytes: 4 * 1024 * 1024,
        }
    }
}
