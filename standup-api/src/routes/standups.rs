/// Stand-up note endpoints
///
/// # Endpoints
///
/// - `GET /v1/standups` - Caller's notes grouped by day
/// - `GET /v1/standups/date/:date` - Caller's note for one day, or `null`
/// - `PUT /v1/standups` - Create or overwrite the note for a day
/// - `DELETE /v1/standups/:id` - Delete one of the caller's notes
/// - `GET /v1/standups/u/:username` - Anyone's notes (session optional)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use standup_shared::{
    auth::middleware::AuthContext,
    models::{
        profile::Profile,
        standup::{group_by_day, DayNotes, NoteFields, StandupNote, UpsertOutcome},
    },
};
use uuid::Uuid;

/// Notes feed for one person
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub display_name: String,

    /// True when the viewer is the owner of the feed
    pub is_owner: bool,
    pub days: Vec<DayNotes>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertNoteRequest {
    /// `YYYY-MM-DD`; missing or empty means today (UTC)
    #[serde(default)]
    pub note_date: Option<String>,

    #[serde(flatten)]
    pub fields: NoteFields,
}

#[derive(Debug, Serialize)]
pub struct UpsertNoteResponse {
    pub mode: UpsertOutcome,
    pub note: StandupNote,
}

/// Parses `YYYY-MM-DD`
pub(crate) fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Note date from the editor: blank means today, anything else must parse
pub fn resolve_note_date(raw: Option<&str>, today: NaiveDate) -> ApiResult<NaiveDate> {
    match raw.map(str::trim).filter(|d| !d.is_empty()) {
        None => Ok(today),
        Some(d) => parse_day(d)
            .ok_or_else(|| ApiError::invalid("note_date", "Expected a date as YYYY-MM-DD")),
    }
}

async fn feed_for(state: &AppState, profile: Profile, viewer: Option<Uuid>) -> ApiResult<FeedResponse> {
    let notes = StandupNote::list_for_user(&state.db, profile.id).await?;

    Ok(FeedResponse {
        user_id: profile.id,
        display_name: profile.label(),
        username: profile.username,
        is_owner: viewer == Some(profile.id),
        days: group_by_day(notes),
    })
}

pub async fn list_own(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> ApiResult<Json<FeedResponse>> {
    let profile = Profile::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(feed_for(&state, profile, Some(ctx.user_id)).await?))
}

pub async fn for_date(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(date): Path<String>,
) -> ApiResult<Json<Option<StandupNote>>> {
    let day = parse_day(&date)
        .ok_or_else(|| ApiError::BadRequest("Expected a date as YYYY-MM-DD".to_string()))?;

    let note = StandupNote::find_for_date(&state.db, ctx.user_id, day).await?;
    Ok(Json(note))
}

/// Create or overwrite the caller's note for a day
///
/// Fields are trimmed and blanks stored as NULL; at least one must carry
/// text.
///
/// # Response
///
/// ```json
/// { "mode": "created", "note": { "id": "…", "note_date": "2025-03-10", … } }
/// ```
pub async fn upsert(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<UpsertNoteRequest>,
) -> ApiResult<Json<UpsertNoteResponse>> {
    let day = resolve_note_date(req.note_date.as_deref(), Utc::now().date_naive())?;

    let fields = req.fields.normalized();
    if fields.is_blank() {
        return Err(ApiError::invalid(
            "fields",
            "Fill in at least one of yesterday, today, blockers or learnings",
        ));
    }

    let (note, mode) = StandupNote::upsert(&state.db, ctx.user_id, day, fields).await?;

    tracing::info!(user_id = %ctx.user_id, note_date = %day, mode = ?mode, "Saved stand-up note");

    Ok(Json(UpsertNoteResponse { mode, note }))
}

pub async fn remove(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !StandupNote::delete_owned(&state.db, id, ctx.user_id).await? {
        return Err(ApiError::NotFound("Note not found".to_string()));
    }

    tracing::info!(user_id = %ctx.user_id, note_id = %id, "Deleted stand-up note");
    Ok(StatusCode::NO_CONTENT)
}

/// Public feed by routing username (case-insensitive)
pub async fn user_feed(
    State(state): State<AppState>,
    session: Option<AuthContext>,
    Path(username): Path<String>,
) -> ApiResult<Json<FeedResponse>> {
    let profile = Profile::find_by_username(&state.db, username.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let viewer = session.map(|ctx| ctx.user_id);
    Ok(Json(feed_for(&state, profile, viewer).await?))
}
