//! OpenAPI document.

use axum::Json;
use utoipa::OpenApi;

use crate::forms;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    info(title = "keyhold", description = "Accounts, sessions and profile pictures"),
    paths(
        routes::health::health_check,
        routes::auth::register,
        routes::auth::login,
        routes::auth::logout,
        routes::auth::auth_status,
        routes::auth::change_password,
        routes::welcome::welcome,
        routes::account::get_account,
        routes::account::update_account,
        routes::account::upload_picture,
    ),
    components(schemas(
        forms::RegisterForm,
        forms::LoginForm,
        forms::ChangePasswordForm,
        routes::health::HealthResponse,
        routes::auth::AuthResponse,
        routes::auth::RegisterResponse,
        routes::auth::AuthStatusResponse,
        routes::welcome::WelcomeResponse,
        routes::account::AccountResponse,
        routes::account::AccountUpdateResponse,
        routes::account::PictureResponse,
        routes::account::RejectedUploadResponse,
        routes::account::AccountUpdateForm,
        routes::account::PictureUploadForm,
    ))
)]
pub struct ApiDoc;

/// GET /api/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
