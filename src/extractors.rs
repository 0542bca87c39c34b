use axum::extract::FromRequestParts;
use axum::http::{header, HeaderMap};
use axum::http::request::Parts;

use crate::db::models::{Session, User};
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated user together with the session that authenticated them.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

/// Extractor that requires authentication.
/// Returns 401 if the bearer token is missing, unknown or expired.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        resolve(state, token)?.ok_or(AppError::Unauthorized)
    }
}

/// Optional user extractor. No token means anonymous; a bad token is still a 401.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            None => Ok(MaybeUser(None)),
            Some(token) => match resolve(state, token)? {
                Some(user) => Ok(MaybeUser(Some(user))),
                None => Err(AppError::Unauthorized),
            },
        }
    }
}

/// The raw bearer token, without checking that it names a live session.
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .map(|t| BearerToken(t.to_string()))
            .ok_or_else(|| AppError::BadRequest("No session token provided".into()))
    }
}

fn resolve(state: &AppState, token: &str) -> Result<Option<CurrentUser>, AppError> {
    let Some(session) = state.sessions.get_session_by_token(token)? else {
        return Ok(None);
    };
    let Some(user) = state.users.get_user_by_id(session.user_id)? else {
        return Ok(None);
    };
    Ok(Some(CurrentUser { user, session }))
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Compare two secrets without bailing out at the first differing byte.
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let len_match = a.len() == b.len();

    let mut result = 0u8;
    for i in 0..a.len().max(b.len()) {
        let byte_a = a.get(i).copied().unwrap_or(0);
        let byte_b = b.get(i).copied().unwrap_or(0);
        result |= byte_a ^ byte_b;
    }

    len_match && result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn headers(authorization: Option<&str>) -> HeaderMap {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0.headers
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!(bearer_token(&headers(Some("Bearer abc123"))), Some("abc123"));
    }

    #[test]
    fn missing_or_foreign_schemes_yield_nothing() {
        assert_eq!(bearer_token(&headers(None)), None);
        assert_eq!(bearer_token(&headers(Some("Basic dXNlcjpwdw=="))), None);
        assert_eq!(bearer_token(&headers(Some("Bearer "))), None);
    }

    #[test]
    fn constant_time_eq_matches_only_identical_secrets() {
        assert!(constant_time_eq("s3cret", "s3cret"));
        assert!(!constant_time_eq("s3cret", "s3creT"));
        assert!(!constant_time_eq("s3cret", "s3cret-longer"));
        assert!(!constant_time_eq("s3cret", ""));
        assert!(!constant_time_eq("abc\0", "abc"));
        assert!(constant_time_eq("", ""));
    }
}
