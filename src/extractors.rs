use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::db::StoreError;
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Extractor that requires a valid, unexpired session cookie.
/// Returns 401 if no valid session found.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = get_cookie_value(parts, &state.config.auth.cookie_name)
            .ok_or_else(|| AppError::Unauthorized("Please log in first".into()))?;

        let user_id = state.sessions.validate(token).map_err(|e| {
            if !matches!(e, StoreError::SessionNotFound) {
                tracing::error!("Session lookup failed: {}", e);
            }
            AppError::from(e)
        })?;

        let user = state
            .users
            .find_by_id(user_id)?
            .ok_or_else(|| AppError::Unauthorized("Please log in first".into()))?;

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
        })
    }
}

/// Optional user extractor. Returns None instead of 401 when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthorized(_)) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// The raw session cookie, whether or not it still names a live session.
pub struct SessionCookie(pub String);

impl FromRequestParts<AppState> for SessionCookie {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        get_cookie_value(parts, &state.config.auth.cookie_name)
            .map(|token| SessionCookie(token.to_string()))
            .ok_or_else(|| AppError::Unauthorized("No active session".into()))
    }
}

/// JSON body extractor whose rejections are plain 400s.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                Err(AppError::BadRequest("Invalid request payload".into()))
            }
        }
    }
}

/// Parse a required positive integer id from a query parameter.
pub fn require_id(raw: Option<&str>, name: &str) -> Result<i64, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} parameter", name)))?;

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("Invalid {} value", name))),
    }
}

pub fn get_cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(cookie: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(header::COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn finds_named_cookie_among_others() {
        let parts = parts_with_cookie("theme=dark; session_token=abc123; lang=en");
        assert_eq!(get_cookie_value(&parts, "session_token"), Some("abc123"));
    }

    #[test]
    fn missing_cookie_is_none() {
        let parts = parts_with_cookie("theme=dark");
        assert_eq!(get_cookie_value(&parts, "session_token"), None);
    }

    #[test]
    fn require_id_accepts_positive_integers() {
        assert_eq!(require_id(Some("42"), "post_id").unwrap(), 42);
        assert_eq!(require_id(Some(" 7 "), "post_id").unwrap(), 7);
    }

    #[test]
    fn require_id_rejects_missing_and_malformed() {
        for raw in [None, Some(""), Some("abc"), Some("0"), Some("-3"), Some("1.5")] {
            assert!(matches!(
                require_id(raw, "post_id"),
                Err(AppError::BadRequest(_))
            ));
        }
    }

    #[test]
    fn empty_cookie_value_is_none() {
        let parts = parts_with_cookie("session_token=");
        assert_eq!(get_cookie_value(&parts, "session_token"), None);
    }
}
