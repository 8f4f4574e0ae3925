//! Authentication route handlers: register, login, logout, status, password.

use axum::extract::{Extension, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{Duration, Utc};
use kh_core::{Error, UserId};
use serde::Serialize;
use validator::Validate;

use crate::context::AppContext;
use crate::error::AppError;
use crate::forms::{ChangePasswordForm, LoginForm, RegisterForm};
use crate::middleware::auth::{extract_token, resolve_token, SESSION_COOKIE};
use crate::password::{hash_password, verify_password};
use crate::routes::account::AccountResponse;

const LOGIN_FAILED: &str = "Login unsuccessful, please check email and password";

/// Generic success/failure message, optionally carrying a session token.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Registration result.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub account: AccountResponse,
}

/// Auth status response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// `Set-Cookie` value carrying a session token.
fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that makes the browser drop the session.
fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn set_cookie_header(value: &str) -> Result<[(header::HeaderName, HeaderValue); 1], AppError> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| Error::Internal(format!("invalid cookie header: {e}")))?;
    Ok([(header::SET_COOKIE, value)])
}

/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterForm,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid form fields"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(ctx): State<AppContext>,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, AppError> {
    form.validate()?;

    let conn = kh_db::pool::get_conn(&ctx.db)?;
    if kh_db::queries::users::email_exists(&conn, &form.email, None)? {
        return Err(Error::Conflict("This email already exists".into()).into());
    }

    let hash = hash_password(&form.password)?;
    let user = kh_db::queries::users::create_user(&conn, &form.name, &form.email, &hash)?;
    tracing::info!(user_id = %user.id, "Registered new user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "You are now registered and can log in".into(),
            account: AccountResponse::from(user),
        }),
    ))
}

/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginForm,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid form fields"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(ctx): State<AppContext>,
    Json(form): Json<LoginForm>,
) -> Result<Response, AppError> {
    form.validate()?;

    let conn = kh_db::pool::get_conn(&ctx.db)?;
    let user = kh_db::queries::users::get_user_by_email(&conn, &form.email)?
        .filter(|u| verify_password(&form.password, &u.password_hash))
        .ok_or_else(|| Error::Unauthorized(LOGIN_FAILED.into()))?;

    let hours = ctx.config.auth.session_hours();
    let token = uuid::Uuid::new_v4().to_string();
    let expires = Utc::now() + Duration::hours(hours);
    kh_db::queries::auth::create_token(&conn, user.id, &token, &expires.to_rfc3339())?;
    tracing::debug!(user_id = %user.id, "Session created");

    let cookie = session_cookie(&token, hours * 3600, ctx.config.auth.secure_cookie);
    Ok((
        StatusCode::OK,
        set_cookie_header(&cookie)?,
        Json(AuthResponse {
            success: true,
            message: format!("Welcome {}", user.name),
            token: Some(token),
        }),
    )
        .into_response())
}

/// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out", body = AuthResponse))
)]
pub async fn logout(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = extract_token(&headers) {
        let ended = kh_db::pool::get_conn(&ctx.db).and_then(|conn| {
            let session = kh_db::queries::auth::get_token(&conn, &token)?;
            kh_db::queries::auth::delete_token(&conn, &token)?;
            Ok(session)
        });
        match ended {
            Ok(Some(session)) => tracing::info!(user_id = %session.user_id, "Session ended"),
            Ok(None) => tracing::debug!("Logout with unknown session token"),
            Err(e) => tracing::warn!("Failed to delete session token: {e}"),
        }
    }

    Ok((
        StatusCode::OK,
        set_cookie_header(&clear_session_cookie())?,
        Json(AuthResponse {
            success: true,
            message: "Logged out".into(),
            token: None,
        }),
    )
        .into_response())
}

/// GET /api/auth/status
#[utoipa::path(
    get,
    path = "/api/auth/status",
    responses((status = 200, description = "Auth status", body = AuthStatusResponse))
)]
pub async fn auth_status(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Json<AuthStatusResponse>, AppError> {
    let anonymous = AuthStatusResponse {
        authenticated: false,
        user_id: None,
        name: None,
        email: None,
    };

    let Some(token) = extract_token(&headers) else {
        return Ok(Json(anonymous));
    };
    let Some(user_id) = resolve_token(&ctx.db, &token)? else {
        return Ok(Json(anonymous));
    };

    let conn = kh_db::pool::get_conn(&ctx.db)?;
    Ok(Json(match kh_db::queries::users::get_user_by_id(&conn, user_id)? {
        Some(user) => AuthStatusResponse {
            authenticated: true,
            user_id: Some(user.id.to_string()),
            name: Some(user.name),
            email: Some(user.email),
        },
        None => anonymous,
    }))
}

/// PUT /api/auth/password
#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordForm,
    responses(
        (status = 200, description = "Password changed", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Current password incorrect")
    )
)]
pub async fn change_password(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<ChangePasswordForm>,
) -> Result<Json<AuthResponse>, AppError> {
    form.validate()?;

    let conn = kh_db::pool::get_conn(&ctx.db)?;
    let user = kh_db::queries::users::get_user_by_id(&conn, user_id)?
        .ok_or_else(|| Error::Unauthorized("User not found".into()))?;

    if !verify_password(&form.current_password, &user.password_hash) {
        return Err(Error::Unauthorized("Current password is incorrect".into()).into());
    }

    let new_hash = hash_password(&form.new_password)?;
    kh_db::queries::users::update_password(&conn, user.id, &new_hash)?;
    tracing::info!(%user_id, "Password changed");

    Ok(Json(AuthResponse {
        success: true,
        message: "Password changed".into(),
        token: None,
    }))
}
