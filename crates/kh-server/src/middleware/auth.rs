//! Session authentication.
//!
//! A session token is accepted from `Authorization: Bearer <token>` first and
//! then from the `keyhold_session` cookie. Valid tokens resolve to a
//! [`UserId`] that is inserted into request extensions for the handlers
//! behind [`auth_middleware`].

use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use kh_core::{Error, UserId};
use kh_db::pool::DbPool;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Cookie name for browser sessions.
pub const SESSION_COOKIE: &str = "keyhold_session";

/// Session token presented by the client, if any.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|part| part.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|value| !value.is_empty())
        .map(String::from)
}

/// Resolve a token to its user if it exists and has not expired.
pub fn resolve_token(db: &DbPool, token: &str) -> kh_core::Result<Option<UserId>> {
    let conn = kh_db::pool::get_conn(db)?;
    let now = Utc::now().to_rfc3339();
    Ok(kh_db::queries::auth::get_valid_token(&conn, token, &now)?.map(|t| t.user_id))
}

/// Authentication middleware. Applied to protected routes only.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone());
    let reject = |e: Error| {
        let err = AppError::new(e);
        match request_id.clone() {
            Some(id) => err.with_request_id(id).into_response(),
            None => err.into_response(),
        }
    };

    let Some(token) = extract_token(request.headers()) else {
        return Err(reject(Error::Unauthorized("Authentication required".into())));
    };

    match resolve_token(&ctx.db, &token) {
        Ok(Some(user_id)) => {
            request.extensions_mut().insert(user_id);
            Ok(next.run(request).await)
        }
        Ok(None) => Err(reject(Error::Unauthorized(
            "Session is invalid or has expired".into(),
        ))),
        Err(e) => Err(reject(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_token() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc")]);
        assert_eq!(extract_token(&h).as_deref(), Some("abc"));
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "keyhold_session=from-cookie"),
        ]);
        assert_eq!(extract_token(&h).as_deref(), Some("from-header"));
    }

    #[test]
    fn session_cookie_among_others() {
        let h = headers(&[(header::COOKIE, "theme=dark; keyhold_session=tok; lang=en")]);
        assert_eq!(extract_token(&h).as_deref(), Some("tok"));
    }

    #[test]
    fn similarly_named_cookie_ignored() {
        let h = headers(&[(header::COOKIE, "keyhold_session_old=nope")]);
        assert_eq!(extract_token(&h), None);
    }

    #[test]
    fn no_credentials() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_token(&h), None);
    }

    #[test]
    fn resolve_respects_expiry() {
        let db = kh_db::pool::init_memory_pool().unwrap();
        let conn = kh_db::pool::get_conn(&db).unwrap();
        let user = kh_db::queries::users::create_user(&conn, "alice", "a@example.com", "h").unwrap();
        kh_db::queries::auth::create_token(&conn, user.id, "live", "2999-01-01T00:00:00+00:00")
            .unwrap();
        kh_db::queries::auth::create_token(&conn, user.id, "dead", "2000-01-01T00:00:00+00:00")
            .unwrap();

        assert_eq!(resolve_token(&db, "live").unwrap(), Some(user.id));
        assert_eq!(resolve_token(&db, "dead").unwrap(), None);
        assert_eq!(resolve_token(&db, "missing").unwrap(), None);
    }
}
