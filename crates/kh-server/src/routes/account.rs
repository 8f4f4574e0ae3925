//! Account routes: view and update the signed-in user's profile and picture.
//!
//! Both update endpoints take `multipart/form-data`. The picture part is
//! named `profile_picture`; on `POST /api/account` it is optional and a part
//! with an empty filename counts as absent.

use std::sync::Arc;

use axum::extract::{Extension, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kh_avatar::{UploadOutcome, UploadedImage};
use kh_core::account::profile_image_url;
use kh_core::{Error, UserId};
use kh_db::models::User;
use serde::Serialize;
use validator::Validate;

use crate::context::AppContext;
use crate::error::AppError;
use crate::forms::AccountForm;

/// Public view of a user record.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_image: String,
    pub profile_image_url: String,
    pub role: i64,
    pub status: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for AccountResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id.to_string(),
            profile_image_url: profile_image_url(&u.profile_image),
            name: u.name,
            email: u.email,
            profile_image: u.profile_image,
            role: u.role,
            status: u.status,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Result of a successful account update.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AccountUpdateResponse {
    pub success: bool,
    pub message: String,
    pub account: AccountResponse,
}

/// Stored picture.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PictureResponse {
    pub filename: String,
    pub url: String,
}

/// Body returned when an upload's extension is not accepted.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RejectedUploadResponse {
    pub success: bool,
    pub message: String,
    pub allowed_extensions: Vec<String>,
}

impl RejectedUploadResponse {
    fn new(allowed: Vec<String>) -> Self {
        Self {
            success: false,
            message: format!(
                "File extension is not allowed, only {}",
                allowed.join(", ")
            ),
            allowed_extensions: allowed,
        }
    }
}

impl IntoResponse for RejectedUploadResponse {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

/// Multipart schema for `POST /api/account`.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct AccountUpdateForm {
    name: String,
    email: String,
    #[schema(value_type = Option<String>, format = Binary)]
    profile_picture: Option<Vec<u8>>,
}

/// Multipart schema for `POST /api/account/picture`.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct PictureUploadForm {
    #[schema(value_type = String, format = Binary)]
    profile_picture: Vec<u8>,
}

/// Parts of an account multipart body we care about.
#[derive(Default)]
struct AccountParts {
    name: Option<String>,
    email: Option<String>,
    picture: Option<UploadedImage>,
}

async fn read_parts(mut multipart: Multipart) -> Result<AccountParts, AppError> {
    let bad_body = |e: axum::extract::multipart::MultipartError| {
        Error::Validation(format!("invalid multipart body: {}", e.body_text()))
    };

    let mut parts = AccountParts::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
        let part = field.name().map(str::to_owned);
        match part.as_deref() {
            Some("name") => parts.name = Some(field.text().await.map_err(bad_body)?),
            Some("email") => parts.email = Some(field.text().await.map_err(bad_body)?),
            Some("profile_picture") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_body)?;
                if !filename.is_empty() {
                    parts.picture = Some(UploadedImage::new(filename, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }
    Ok(parts)
}

/// Run the picture workflow off the async runtime.
async fn update_picture(
    ctx: &AppContext,
    user_id: UserId,
    upload: UploadedImage,
) -> Result<UploadOutcome, AppError> {
    let pictures = Arc::clone(&ctx.pictures);
    let outcome = tokio::task::spawn_blocking(move || {
        pictures.update_profile_picture(user_id, &upload)
    })
    .await
    .map_err(|e| Error::Internal(format!("picture task failed: {e}")))??;
    Ok(outcome)
}

fn load_user(ctx: &AppContext, user_id: UserId) -> Result<User, AppError> {
    let conn = kh_db::pool::get_conn(&ctx.db)?;
    let user = kh_db::queries::users::get_user_by_id(&conn, user_id)?
        .ok_or_else(|| Error::not_found("user", user_id))?;
    Ok(user)
}

/// GET /api/account
#[utoipa::path(
    get,
    path = "/api/account",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn get_account(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<AccountResponse>, AppError> {
    Ok(Json(load_user(&ctx, user_id)?.into()))
}

/// POST /api/account
#[utoipa::path(
    post,
    path = "/api/account",
    request_body(content = AccountUpdateForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Account updated", body = AccountUpdateResponse),
        (status = 400, description = "Invalid fields or picture extension", body = RejectedUploadResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Picture could not be decoded")
    )
)]
pub async fn update_account(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let parts = read_parts(multipart).await?;
    let form = AccountForm {
        name: parts.name.unwrap_or_default(),
        email: parts.email.unwrap_or_default(),
    };
    form.validate()?;

    {
        let conn = kh_db::pool::get_conn(&ctx.db)?;
        if kh_db::queries::users::email_exists(&conn, &form.email, Some(user_id))? {
            return Err(Error::Conflict("This email already exists".into()).into());
        }
    }

    if let Some(upload) = parts.picture {
        if let UploadOutcome::Rejected { allowed } = update_picture(&ctx, user_id, upload).await? {
            return Ok(RejectedUploadResponse::new(allowed).into_response());
        }
    }

    let conn = kh_db::pool::get_conn(&ctx.db)?;
    if !kh_db::queries::users::update_account(&conn, user_id, &form.name, &form.email)? {
        return Err(Error::not_found("user", user_id).into());
    }
    drop(conn);

    let account = load_user(&ctx, user_id)?.into();
    Ok(Json(AccountUpdateResponse {
        success: true,
        message: "Your information has been updated".into(),
        account,
    })
    .into_response())
}

/// POST /api/account/picture
#[utoipa::path(
    post,
    path = "/api/account/picture",
    request_body(content = PictureUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture stored", body = PictureResponse),
        (status = 400, description = "Missing picture or extension not allowed", body = RejectedUploadResponse),
        (status = 422, description = "Picture could not be decoded")
    )
)]
pub async fn upload_picture(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_parts(multipart)
        .await?
        .picture
        .ok_or_else(|| Error::Validation("profile_picture is required".into()))?;

    Ok(match update_picture(&ctx, user_id, upload).await? {
        UploadOutcome::Stored { filename } => Json(PictureResponse {
            url: profile_image_url(&filename),
            filename,
        })
        .into_response(),
        UploadOutcome::Rejected { allowed } => {
            RejectedUploadResponse::new(allowed).into_response()
        }
    })
}
