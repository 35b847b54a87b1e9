/// GitHub pull request view
///
/// # Endpoints
///
/// - `GET /v1/github/prs` - Latest PRs in the caller's project that involve
///   their GitHub username, with merge status
/// - `PUT /v1/github/settings` - Save project and username
///
/// Without saved settings the PR view answers `configured: false` and makes
/// no GitHub call.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    github::{latest_pull_requests, normalize_username, PullRequestView, RepoRef},
};
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use standup_shared::{auth::middleware::AuthContext, models::profile::Profile};

/// PR results may be reused by the browser for this long
pub const PR_CACHE_CONTROL: &str = "private, max-age=300";

#[derive(Debug, Serialize)]
pub struct PullRequestsResponse {
    pub configured: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub see_all_url: Option<String>,

    pub pull_requests: Vec<PullRequestView>,
}

impl PullRequestsResponse {
    fn unconfigured() -> Self {
        Self {
            configured: false,
            repo: None,
            username: None,
            see_all_url: None,
            pull_requests: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GitHubSettingsRequest {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct GitHubSettingsResponse {
    pub project: String,
    pub username: String,
}

/// Normalizes both settings, reporting every bad field at once
pub fn normalize_settings(req: &GitHubSettingsRequest) -> ApiResult<(RepoRef, String)> {
    let repo = RepoRef::parse(&req.project);
    let username = normalize_username(&req.username);

    match (repo, username) {
        (Some(repo), Some(username)) => Ok((repo, username)),
        (repo, username) => {
            let mut details = Vec::new();
            if repo.is_none() {
                details.push(ValidationErrorDetail::new(
                    "project",
                    "Expected owner/repo or a github.com repository URL",
                ));
            }
            if username.is_none() {
                details.push(ValidationErrorDetail::new(
                    "username",
                    "Expected a GitHub username",
                ));
            }
            Err(ApiError::ValidationError(details))
        }
    }
}

/// Saved project and username, if both are present and still parse
fn stored_settings(profile: &Profile) -> Option<(RepoRef, String)> {
    let (project, username) = profile.github_settings()?;
    Some((RepoRef::parse(project)?, normalize_username(username)?))
}

pub async fn pull_requests(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> ApiResult<Response> {
    let profile = Profile::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let Some((repo, username)) = stored_settings(&profile) else {
        return Ok(Json(PullRequestsResponse::unconfigured()).into_response());
    };

    let config = &state.config.github;
    let pull_requests = latest_pull_requests(
        state.github.as_ref(),
        &repo,
        &username,
        config.pr_limit,
        config.merge_timeout,
    )
    .await?;

    tracing::debug!(repo = %repo, count = pull_requests.len(), "Loaded pull requests");

    let body = PullRequestsResponse {
        configured: true,
        see_all_url: Some(repo.see_all_url(&username)),
        repo: Some(repo.to_string()),
        username: Some(username),
        pull_requests,
    };

    let mut response = Json(body).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(PR_CACHE_CONTROL));
    Ok(response)
}

pub async fn save_settings(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<GitHubSettingsRequest>,
) -> ApiResult<Json<GitHubSettingsResponse>> {
    let (repo, username) = normalize_settings(&req)?;
    let project = repo.to_string();

    Profile::update_github_settings(&state.db, ctx.user_id, &project, &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    tracing::info!(user_id = %ctx.user_id, project = %project, "Saved GitHub settings");

    Ok(Json(GitHubSettingsResponse { project, username }))
}
