/// Operator endpoints
///
/// Both endpoints require the `x-admin-token` header to match
/// `ADMIN_TOKEN`. With no token configured they always answer 401.
///
/// - `POST /v1/admin/users` - Create an account without signing in as it
/// - `POST /v1/admin/password` - Reset a password by user id or email

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::create_account,
};
use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use standup_shared::{
    auth::{admin_token, password},
    models::user::User,
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(max = 100, message = "Display name must be at most 100 characters"))]
    pub display_name: Option<String>,

    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub username: Option<String>,
}

/// Target is `user_id` if given, otherwise `email`
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SetPasswordResponse {
    pub ok: bool,
    pub user_id: Uuid,
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let presented = headers
        .get(admin_token::ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    if admin_token::verify_admin_token(presented, state.config.admin_token.as_deref()) {
        Ok(())
    } else {
        tracing::warn!("Rejected admin request");
        Err(ApiError::Unauthorized("Invalid admin token".to_string()))
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<CreateUserResponse>)> {
    require_admin(&state, &headers)?;
    req.validate()?;

    let (user, profile) = create_account(
        &state,
        &req.email,
        &req.password,
        req.display_name,
        req.username,
    )
    .await?;

    tracing::info!(user_id = %user.id, "Admin created account");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            user_id: user.id,
            email: user.email,
            username: profile.username,
        }),
    ))
}

pub async fn set_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SetPasswordRequest>,
) -> ApiResult<Json<SetPasswordResponse>> {
    require_admin(&state, &headers)?;

    password::validate_password_strength(&req.password)
        .map_err(|message| ApiError::invalid("password", message))?;

    let email = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let user = match (req.user_id, email) {
        (Some(id), _) => User::find_by_id(&state.db, id).await?,
        (None, Some(email)) => User::find_by_email(&state.db, email).await?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Provide user_id or email".to_string(),
            ))
        }
    }
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let hash = password::hash_password(&req.password)?;
    User::update_password(&state.db, user.id, &hash).await?;

    tracing::info!(user_id = %user.id, "Admin reset password");

    Ok(Json(SetPasswordResponse {
        ok: true,
        user_id: user.id,
    }))
}
