/// Authentication endpoints
///
/// Accounts are email + password. A successful sign-up or sign-in sets the
/// HTTP-only session cookie and also returns the token for clients that
/// prefer an `Authorization: Bearer` header.
///
/// # Endpoints
///
/// - `GET /signin` - Where to send credentials
/// - `POST /v1/auth/signup` - Create an account and its profile
/// - `POST /v1/auth/signin` - Start a session
/// - `POST /v1/auth/signout` - End the session and go home

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::profile::validate_username,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use standup_shared::{
    auth::{jwt, middleware as session, password},
    models::{
        profile::Profile,
        user::{CreateUser, User},
    },
};
use uuid::Uuid;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Sign-up request
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked against the password policy as well
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: Option<String>,

    /// Optional routing username, same rules as the profile editor
    pub username: Option<String>,
}

/// Sign-in request
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Session response for sign-up and sign-in
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,

    /// Same token as the cookie, for bearer clients
    pub token: String,
    pub expires_in: i64,
}

/// Creates an account and its profile after checking every input
///
/// Shared by sign-up and the admin endpoint.
pub(crate) async fn create_account(
    state: &AppState,
    email: &str,
    plain_password: &str,
    display_name: Option<String>,
    username: Option<String>,
) -> ApiResult<(User, Profile)> {
    password::validate_password_strength(plain_password)
        .map_err(|message| ApiError::invalid("password", message))?;

    let username = username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(validate_username)
        .transpose()?;

    let display_name = display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let password_hash = password::hash_password(plain_password)?;

    let (user, profile) = User::register(
        &state.db,
        CreateUser {
            email: email.trim().to_string(),
            password_hash,
            display_name,
            username,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Account created");

    Ok((user, profile))
}

/// Issues a session token and wraps `user` in a response that sets the cookie
fn session_response(state: &AppState, user: &User, status: StatusCode) -> ApiResult<Response> {
    let ttl = chrono::Duration::hours(state.config.session.ttl_hours);
    let token = jwt::create_token(&jwt::Claims::new(user.id, ttl), state.session_secret())?;
    let cookie = session::session_cookie(
        &token,
        state.config.session_max_age_seconds(),
        state.secure_cookies(),
    );

    let body = SessionResponse {
        user_id: user.id,
        email: user.email.clone(),
        token,
        expires_in: state.config.session_max_age_seconds(),
    };

    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Tells clients where to send credentials
///
/// Unauthenticated requests to protected routes are redirected here.
pub async fn sign_in_page() -> Json<serde_json::Value> {
    Json(json!({
        "sign_in": "/v1/auth/signin",
        "sign_up": "/v1/auth/signup",
        "message": "Sign in to continue"
    }))
}

/// Create an account
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/signup
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "analytical1",
///   "display_name": "Ada Lovelace",
///   "username": "ada"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email or username already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let (user, _) = create_account(
        &state,
        &req.email,
        &req.password,
        req.display_name,
        req.username,
    )
    .await?;

    session_response(&state, &user, StatusCode::CREATED)
}

/// Start a session
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `422 Unprocessable Entity`: Validation failed
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let user = User::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Sign-in rejected");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    User::update_last_sign_in(&state.db, user.id).await?;

    session_response(&state, &user, StatusCode::OK)
}

/// End the session
///
/// Clears the cookie and redirects to `/` with `303 See Other`. Tokens are
/// stateless, so a bearer token stays valid until it expires.
pub async fn sign_out(State(state): State<AppState>) -> Response {
    let cookie = session::clear_session_cookie(state.secure_cookies());
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}
