//! Application context shared by request handlers.

use std::sync::Arc;

use kh_avatar::{DbProfileRepository, ExtensionPolicy, ImageStore, ProfilePictureService};
use kh_core::config::Config;
use kh_db::pool::DbPool;

/// Picture service wired to the SQLite repository.
pub type PictureService = ProfilePictureService<DbProfileRepository>;

/// State handed to every handler through Axum.
///
/// This is cheaply cloneable because it only holds `Arc`s and the pool.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Profile picture workflow.
    pub pictures: Arc<PictureService>,
}

impl AppContext {
    /// Build the context from a config and an initialized pool.
    pub fn new(config: Config, db: DbPool) -> Self {
        let pictures = ProfilePictureService::new(
            DbProfileRepository::new(db.clone()),
            ExtensionPolicy::new(&config.uploads.allowed_extensions),
            ImageStore::new(config.uploads.storage_dir.clone()),
        );
        Self {
            db,
            config: Arc::new(config),
            pictures: Arc::new(pictures),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_follows_config() {
        let mut config = Config::default();
        config.uploads.allowed_extensions = vec!["PNG".into(), "webp".into()];
        let ctx = AppContext::new(config, kh_db::pool::init_memory_pool().unwrap());

        let policy = ctx.pictures.policy();
        assert!(policy.is_allowed("a.webp"));
        assert!(!policy.is_allowed("a.jpg"));
        assert_eq!(policy.allowed(), ["png".to_string(), "webp".to_string()]);
    }
}
