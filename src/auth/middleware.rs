use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use crate::constants::SESSION_COOKIE;
use crate::db as queries;
use crate::db::User;

/// Value of the cookie called `name`, if the request carries one.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name && !value.is_empty()).then_some(value)
        })
}

/// Current authenticated user (if any).
/// Use this extractor when authentication is optional.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = SqlitePool::from_ref(state);

        let Some(token) = cookie_value(&parts.headers, SESSION_COOKIE) else {
            return Ok(MaybeUser(None));
        };

        let session = match queries::get_session_by_token(&pool, token).await {
            Ok(Some(s)) => s,
            Ok(None) => return Ok(MaybeUser(None)),
            Err(e) => {
                tracing::error!("Session lookup failed: {e:#}");
                return Ok(MaybeUser(None));
            }
        };

        // RFC 3339 timestamps in UTC compare correctly as strings.
        let now = chrono::Utc::now().to_rfc3339();
        if session.expires_at < now {
            let _ = queries::delete_session(&pool, token).await;
            return Ok(MaybeUser(None));
        }

        let user = match queries::get_user_by_id(&pool, session.user_id).await {
            Ok(Some(u)) => u,
            _ => return Ok(MaybeUser(None)),
        };

        let _ = queries::update_session_last_used(&pool, session.id).await;

        Ok(MaybeUser(Some(user)))
    }
}

/// Current authenticated user (required).
/// Returns 401 Unauthorized if not signed in.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;

        match user {
            Some(u) => Ok(RequireUser(u)),
            None => Err((StatusCode::UNAUTHORIZED, "You must be signed in to do that").into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; session=abc123; qb_view=xyz"),
        );
        assert_eq!(cookie_value(&headers, "session"), Some("abc123"));
        assert_eq!(cookie_value(&headers, "qb_view"), Some("xyz"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_value_requires_exact_name() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("xsession=abc; session="));
        assert_eq!(cookie_value(&headers, "session"), None);
    }
}
