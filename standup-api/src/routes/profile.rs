/// Profile editor
///
/// # Endpoints
///
/// - `GET /v1/profile` - Caller's profile and sign-in email
/// - `PUT /v1/profile` - Save display name, email, team, role and
///   optionally a new username
///
/// The response to a save is the profile as re-read from the database, not
/// an echo of the request.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use standup_shared::{
    auth::middleware::AuthContext,
    models::{
        profile::{is_valid_username, Profile, UpdateProfile},
        user::User,
    },
};
use validator::ValidateEmail;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub role: String,

    /// New routing username; missing or blank keeps the current one
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub email: String,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub email: String,
    pub email_updated: bool,
    pub profile: Profile,
    pub message: &'static str,
}

/// Checks a routing username: 3-32 of `a-z 0-9 _ . -`, any case
pub(crate) fn validate_username(raw: &str) -> ApiResult<String> {
    let username = raw.trim();
    if is_valid_username(username) {
        Ok(username.to_string())
    } else {
        Err(ApiError::invalid(
            "username",
            "Username must be 3-32 characters of letters, digits, '_', '.' or '-'",
        ))
    }
}

/// Trims the four required fields, reporting every blank one at once
fn required_fields(req: &UpdateProfileRequest) -> ApiResult<(String, String, String, String)> {
    let fields = [
        ("display_name", req.display_name.trim()),
        ("email", req.email.trim()),
        ("team", req.team.trim()),
        ("role", req.role.trim()),
    ];

    let missing: Vec<ValidationErrorDetail> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| ValidationErrorDetail::new(field, "This field is required"))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::ValidationError(missing));
    }

    let [(_, display_name), (_, email), (_, team), (_, role)] = fields;
    if !email.validate_email() {
        return Err(ApiError::invalid("email", "Invalid email format"));
    }

    Ok((
        display_name.to_string(),
        email.to_string(),
        team.to_string(),
        role.to_string(),
    ))
}

async fn load(state: &AppState, ctx: &AuthContext) -> ApiResult<(User, Profile)> {
    let user = User::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or(ApiError::SignInRequired)?;
    let profile = Profile::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
    Ok((user, profile))
}

pub async fn get_profile(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> ApiResult<Json<ProfileResponse>> {
    let (user, profile) = load(&state, &ctx).await?;

    Ok(Json(ProfileResponse {
        email: user.email,
        profile,
    }))
}

/// Save the profile form
///
/// # Errors
///
/// - `409 Conflict`: Username or email belongs to someone else
/// - `422 Unprocessable Entity`: Required field blank or bad username/email
pub async fn update_profile(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let (display_name, email, team, role) = required_fields(&req)?;
    let (user, current) = load(&state, &ctx).await?;

    let requested = req.username.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let username = match requested {
        Some(wanted)
            if current
                .username
                .as_deref()
                .map_or(true, |have| have != wanted) =>
        {
            let wanted = validate_username(wanted)?;
            if Profile::username_taken(&state.db, &wanted, ctx.user_id).await? {
                return Err(ApiError::Conflict("Username is already taken".to_string()));
            }
            Some(wanted)
        }
        _ => None,
    };

    // CITEXT compares case-insensitively, so only real changes hit the table
    let email_updated = !user.email.eq_ignore_ascii_case(&email);

    // Both writes commit together; an email collision rolls back the profile
    let mut tx = state.db.begin().await?;

    Profile::update_details(
        &mut *tx,
        ctx.user_id,
        UpdateProfile {
            display_name,
            team,
            role,
            username,
        },
    )
    .await?;

    if email_updated {
        User::update_email(&mut *tx, ctx.user_id, &email).await?;
    }

    tx.commit().await?;

    let (user, profile) = load(&state, &ctx).await?;

    tracing::info!(user_id = %ctx.user_id, email_updated, "Profile saved");

    Ok(Json(UpdateProfileResponse {
        email: user.email,
        email_updated,
        profile,
        message: if email_updated {
            "Profile saved. Your sign-in email has changed."
        } else {
            "Profile saved."
        },
    }))
}
