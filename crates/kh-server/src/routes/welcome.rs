//! Landing endpoint for signed-in users.

use axum::extract::{Extension, State};
use axum::Json;
use kh_core::{Error, UserId};
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}

/// GET /api/welcome
#[utoipa::path(
    get,
    path = "/api/welcome",
    responses(
        (status = 200, description = "Greeting for the current user", body = WelcomeResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn welcome(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<WelcomeResponse>, AppError> {
    let conn = kh_db::pool::get_conn(&ctx.db)?;
    let user = kh_db::queries::users::get_user_by_id(&conn, user_id)?
        .ok_or_else(|| Error::Unauthorized("User no longer exists".into()))?;

    Ok(Json(WelcomeResponse {
        message: format!("Welcome {}", user.name),
    }))
}
