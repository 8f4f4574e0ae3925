//! Integration tests for registration, sign-in and session handling.

mod common;

use common::{login, TestHarness, PASSWORD};
use kh_core::config::Config;

#[tokio::test]
async fn register_creates_account_with_defaults() {
    let (h, addr) = TestHarness::with_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/register"))
        .json(&serde_json::json!({
            "name": "Test User",
            "email": "test@example.com",
            "password": PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["account"]["profile_image"], "default.png");
    assert_eq!(json["account"]["profile_image_url"], "/profile-pics/default.png");
    assert_eq!(json["account"]["role"], 1);
    assert_eq!(json["account"]["status"], 1);

    let user = kh_db::queries::users::get_user_by_email(&h.conn(), "test@example.com")
        .unwrap()
        .unwrap();
    assert_ne!(user.password_hash, PASSWORD);
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("Existing", "taken@example.com");

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/register"))
        .json(&serde_json::json!({
            "name": "Newcomer",
            "email": "TAKEN@example.com",
            "password": PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(json["error"].as_str().unwrap().contains("This email already exists"));
}

#[tokio::test]
async fn register_validates_fields() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/register"))
        .json(&serde_json::json!({
            "name": "abc",
            "email": "not-an-email",
            "password": "short",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "validation_error");
    let msg = json["error"].as_str().unwrap();
    assert!(msg.contains("name:"), "{msg}");
    assert!(msg.contains("email:"), "{msg}");
    assert!(msg.contains("password:"), "{msg}");
}

#[tokio::test]
async fn login_success_sets_cookie_and_greets() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("Test User", "test@example.com");

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/login"))
        .json(&serde_json::json!({ "email": "test@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let cookie = resp
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("keyhold_session="));
    assert!(cookie.contains("HttpOnly"));

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Welcome Test User");
    let token = json["token"].as_str().unwrap();
    assert!(cookie.contains(token));
}

#[tokio::test]
async fn login_wrong_password_is_unauthorized() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("Test User", "test@example.com");

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/login"))
        .json(&serde_json::json!({ "email": "test@example.com", "password": "wrongpassword" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("Login unsuccessful, please check email and password"));
}

#[tokio::test]
async fn login_unknown_email_is_unauthorized() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/login"))
        .json(&serde_json::json!({ "email": "nobody@example.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn welcome_requires_session() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("Test User", "test@example.com");
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{addr}/api/welcome"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let token = login(addr, "test@example.com").await;
    let resp = client
        .get(format!("http://{addr}/api/welcome"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Welcome Test User");
}

#[tokio::test]
async fn session_cookie_authenticates() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("Test User", "test@example.com");
    let token = login(addr, "test@example.com").await;

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/welcome"))
        .header("cookie", format!("keyhold_session={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    let user = h.create_user("Test User", "test@example.com");
    kh_db::queries::auth::create_token(&h.conn(), user.id, "stale", "2000-01-01T00:00:00+00:00")
        .unwrap();

    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/welcome"))
        .bearer_auth("stale")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn logout_invalidates_token() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("Test User", "test@example.com");
    let token = login(addr, "test@example.com").await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cookie = resp.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
    assert!(kh_db::queries::auth::get_token(&h.conn(), &token)
        .unwrap()
        .is_none());

    let resp = client
        .get(format!("http://{addr}/api/welcome"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn logout_with_unknown_token_still_clears_cookie() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/auth/logout"))
        .bearer_auth("not-a-session")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cookie = resp.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn status_reflects_session() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("Test User", "test@example.com");
    let client = reqwest::Client::new();

    let json: serde_json::Value = client
        .get(format!("http://{addr}/api/auth/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["authenticated"], false);

    let token = login(addr, "test@example.com").await;
    let json: serde_json::Value = client
        .get(format!("http://{addr}/api/auth/status"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["authenticated"], true);
    assert_eq!(json["name"], "Test User");
    assert_eq!(json["email"], "test@example.com");
}

#[tokio::test]
async fn change_password_round_trip() {
    let (h, addr) = TestHarness::with_server().await;
    h.create_user("Test User", "test@example.com");
    let token = login(addr, "test@example.com").await;
    let client = reqwest::Client::new();

    let resp = client
        .put(format!("http://{addr}/api/auth/password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "current_password": "not-the-password",
            "new_password": "brand-new-secret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .put(format!("http://{addr}/api/auth/password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "current_password": PASSWORD,
            "new_password": "brand-new-secret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("http://{addr}/api/auth/login"))
        .json(&serde_json::json!({
            "email": "test@example.com",
            "password": "brand-new-secret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn oversized_session_timeout_still_issues_usable_token() {
    let mut config = Config::default();
    config.auth.session_timeout_hours = u64::MAX;
    let (h, addr) = TestHarness::with_server_config(config).await;
    h.create_user("Test User", "test@example.com");

    let token = login(addr, "test@example.com").await;
    let resp = reqwest::Client::new()
        .get(format!("http://{addr}/api/welcome"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
