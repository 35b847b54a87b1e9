/// AI summary of one day
///
/// `POST /v1/ai/summary` with `{"date": "YYYY-MM-DD"}` summarizes that day's
/// notes from the caller's saved summary selection.
///
/// # Response
///
/// ```json
/// { "summary": "<h3>Highlights</h3>…" }
/// ```
///
/// or `{ "not_found": true }` when nobody is selected or nobody wrote a note
/// that day. The model is only called when there is something to summarize.

use crate::{
    ai::{summarize_day, SummaryOutcome, DEFAULT_REQUESTER},
    app::AppState,
    error::{ApiError, ApiResult},
    routes::standups::parse_day,
};
use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use standup_shared::{
    auth::middleware::AuthContext,
    models::{profile::Profile, user::User},
    summaries::{aggregate::fetch_notes_in_window, period::DateWindow},
};

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SummaryResponse {
    Summary { summary: String },
    NotFound { not_found: bool },
}

impl SummaryResponse {
    fn not_found() -> Self {
        SummaryResponse::NotFound { not_found: true }
    }
}

impl From<SummaryOutcome> for SummaryResponse {
    fn from(outcome: SummaryOutcome) -> Self {
        match outcome {
            SummaryOutcome::NotFound => SummaryResponse::not_found(),
            SummaryOutcome::Summary(summary) => SummaryResponse::Summary { summary },
        }
    }
}

/// The requested day; missing or malformed is a 400
pub fn requested_day(raw: Option<&str>) -> ApiResult<NaiveDate> {
    let raw = raw
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing date".to_string()))?;

    parse_day(raw).ok_or_else(|| ApiError::BadRequest("Expected a date as YYYY-MM-DD".to_string()))
}

/// Name the summary is addressed to
fn requester_name(profile: &Profile, user: Option<&User>) -> String {
    profile
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or(user.map(|u| u.email.as_str()))
        .unwrap_or(DEFAULT_REQUESTER)
        .to_string()
}

pub async fn generate(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<SummaryRequest>,
) -> ApiResult<Json<SummaryResponse>> {
    let day = requested_day(req.date.as_deref())?;

    let profile = Profile::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
    if profile.summary_selected_user_ids.is_empty() {
        return Ok(Json(SummaryResponse::not_found()));
    }

    let notes =
        fetch_notes_in_window(&state.db, &profile.summary_selected_user_ids, DateWindow::single(day))
            .await?;
    if notes.is_empty() {
        return Ok(Json(SummaryResponse::not_found()));
    }

    let user = User::find_by_id(&state.db, ctx.user_id).await?;
    let requester = requester_name(&profile, user.as_ref());

    let outcome = summarize_day(
        state.generator.as_ref(),
        day,
        &requester,
        &notes,
        state.config.openai.temperature,
    )
    .await?;

    Ok(Json(outcome.into()))
}
