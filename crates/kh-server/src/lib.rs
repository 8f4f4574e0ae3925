//! kh-server: HTTP API server.
//!
//! Ties the kh-* crates into a running axum application:
//!
//! - registration, sign-in and session-cookie authentication
//! - account viewing and updating, including the profile picture upload
//! - static serving of stored pictures
//! - graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod password;
pub mod router;
pub mod routes;

use std::net::SocketAddr;

use chrono::Utc;
use kh_avatar::ImageStore;
use kh_core::account::DEFAULT_PROFILE_IMAGE;
use kh_core::config::Config;

use crate::context::AppContext;

/// Start the keyhold server.
///
/// Initializes the database and storage directory, builds the
/// [`AppContext`] and serves HTTP until a shutdown signal arrives.
pub async fn start(config: Config) -> kh_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    // Database.
    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created database directory {}", parent.display());
        }
    }
    let db_str = db_path.to_string_lossy();
    let db = kh_db::pool::init_pool(&db_str)?;
    if existed {
        tracing::info!("Database opened (existing) at {db_str}");
    } else {
        tracing::info!("Database created (new) at {db_str}");
    }

    {
        let conn = kh_db::pool::get_conn(&db)?;
        let purged =
            kh_db::queries::auth::delete_expired_tokens(&conn, &Utc::now().to_rfc3339())?;
        if purged > 0 {
            tracing::info!("Purged {purged} expired session tokens");
        }
    }

    // Picture storage.
    let store = ImageStore::new(config.uploads.storage_dir.clone());
    store.ensure_dir()?;
    if !store.dir().join(DEFAULT_PROFILE_IMAGE).exists() {
        tracing::warn!(
            "No {DEFAULT_PROFILE_IMAGE} in {}; new accounts will show a missing picture",
            store.dir().display()
        );
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| kh_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = AppContext::new(config, db);
    let app = router::build_router(ctx);

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| kh_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
