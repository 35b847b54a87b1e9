/// Session extraction for Axum
///
/// Requests carry the session token either in the `standup_session` cookie
/// (browsers) or in an `Authorization: Bearer` header (scripts). This module
/// pulls the token out of the headers, validates it, and exposes the result
/// as an [`AuthContext`] that handlers can extract.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use standup_shared::auth::middleware::session_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; standup_session=abc.def.ghi"));
/// assert_eq!(session_token(&headers), Some("abc.def.ghi"));
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "standup_session";

/// Authentication context placed in request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Signed-in user
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No cookie and no bearer token
    #[error("Missing credentials")]
    MissingCredentials,

    /// A token was present but did not validate
    #[error("Invalid session: {0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Session expired".to_string()),
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}

/// Finds the raw session token, preferring the bearer header over the cookie
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| cookie_value(headers, SESSION_COOKIE))
}

/// Reads one cookie out of every `Cookie` header on the request
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Validates the session carried by `headers`
///
/// Returns `Ok(None)` when the request carries no credentials at all, which
/// lets public pages personalise themselves without requiring a session.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Option<AuthContext>, AuthError> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };

    let claims = validate_token(token, secret)?;
    Ok(Some(AuthContext::new(claims.sub)))
}

/// Like [`authenticate`], but a missing session is an error
pub fn require_session(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    authenticate(headers, secret)?.ok_or(AuthError::MissingCredentials)
}

/// Builds the `Set-Cookie` value that stores a session token
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Builds the `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Handlers behind the session layer take `AuthContext` directly
#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}
