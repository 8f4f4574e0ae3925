//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a scratch picture
//! directory (seeded with `default.png`) and a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use kh_core::account::DEFAULT_PROFILE_IMAGE;
use kh_core::config::Config;
use kh_core::UserId;
use kh_db::models::User;
use kh_db::pool::{init_memory_pool, DbPool};
use kh_server::context::AppContext;
use kh_server::router::build_router;
use tempfile::TempDir;

/// Password used for every account created through the harness.
pub const PASSWORD: &str = "password123";

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub storage_dir: PathBuf,
    _scratch: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The storage
    /// directory is always replaced by a fresh temporary one.
    pub fn with_config(mut config: Config) -> Self {
        let scratch = tempfile::tempdir().expect("failed to create temp dir");
        let storage_dir = scratch.path().join("profile_pics");
        std::fs::create_dir_all(&storage_dir).expect("failed to create storage dir");
        std::fs::write(
            storage_dir.join(DEFAULT_PROFILE_IMAGE),
            png_bytes(125, 125),
        )
        .expect("failed to seed default picture");
        config.uploads.storage_dir = storage_dir.clone();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone());

        Self {
            ctx,
            db,
            storage_dir,
            _scratch: scratch,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> kh_db::pool::PooledConnection {
        kh_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Insert a user whose password is [`PASSWORD`].
    pub fn create_user(&self, name: &str, email: &str) -> User {
        let hash = kh_server::password::hash_password(PASSWORD).expect("hash failed");
        kh_db::queries::users::create_user(&self.conn(), name, email, &hash)
            .expect("failed to create user")
    }

    /// Current `profile_image` of a user.
    pub fn profile_image(&self, user_id: UserId) -> String {
        kh_db::queries::users::get_profile_image(&self.conn(), user_id)
            .expect("query failed")
            .expect("user missing")
    }

    /// Point a user at `filename` and place a file of that name in storage.
    pub fn seed_picture(&self, user_id: UserId, filename: &str) {
        std::fs::write(self.storage_dir.join(filename), png_bytes(20, 20))
            .expect("failed to seed picture");
        kh_db::queries::users::set_profile_image(&self.conn(), user_id, filename)
            .expect("failed to set picture");
    }

    /// Sorted names of the files in the storage directory.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.storage_dir)
            .expect("failed to read storage dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Sign in over HTTP and return the session token.
pub async fn login(addr: SocketAddr, email: &str) -> String {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "login failed for {email}");
    let json: serde_json::Value = resp.json().await.unwrap();
    json["token"].as_str().unwrap().to_string()
}

/// Encode a solid-colour PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([30, 120, 220, 255]),
    ));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Multipart form with just a picture part.
pub fn picture_form(filename: &str, bytes: Vec<u8>) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().part(
        "profile_picture",
        reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
    )
}
