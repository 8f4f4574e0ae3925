//! Axum router construction.

use axum::extract::DefaultBodyLimit;
use axum::http::Uri;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use kh_core::account::PROFILE_PICS_ROUTE;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public API routes.
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/status", get(routes::auth::auth_status))
        .route("/openapi.json", get(routes::docs::openapi_json));

    // Routes that need a signed-in user.
    let protected_routes = Router::new()
        .route("/welcome", get(routes::welcome::welcome))
        .route(
            "/account",
            get(routes::account::get_account).post(routes::account::update_account),
        )
        .route("/account/picture", post(routes::account::upload_picture))
        .route("/auth/password", put(routes::auth::change_password))
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    let api = public_routes.merge(protected_routes);

    let pictures = ServeDir::new(&ctx.config.uploads.storage_dir);
    let body_limit = ctx.config.uploads.max_upload_bytes;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .nest_service(PROFILE_PICS_ROUTE, pictures)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::new(kh_core::Error::not_found("route", uri.path()))
}
