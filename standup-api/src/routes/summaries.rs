/// Aggregated notes across teammates
///
/// # Endpoints
///
/// - `GET /v1/summaries` - People to pick from, grouped by team, plus the
///   caller's saved selection
/// - `PUT /v1/summaries/selection` - Replace the saved selection
/// - `GET /v1/summaries/notes?period=week&user_ids=a,b` - Notes of the
///   chosen people within the period, flat and grouped
///
/// Clients debounce selection changes; the PUT is idempotent, so a burst of
/// identical writes leaves the same state.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::users::{build_directory, DirectoryTeam},
};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use standup_shared::{
    auth::middleware::AuthContext,
    models::profile::{dedupe_ids, Profile},
    summaries::{
        aggregate::{fetch_aggregated_notes, group_aggregated, AggregatedNote, DateGroup},
        period::{DateWindow, Period},
    },
};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub teams: Vec<DirectoryTeam>,
    pub selected_user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SaveSelectionRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SaveSelectionResponse {
    pub selected_user_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotesQuery {
    pub period: Option<String>,

    /// Comma-separated ids; missing means the saved selection
    pub user_ids: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub period: Period,
    pub window: DateWindow,
    pub user_ids: Vec<Uuid>,
    pub rows: Vec<AggregatedNote>,
    pub groups: Vec<DateGroup>,
}

/// Parses the `period` parameter; missing or blank means today
pub fn parse_period(raw: Option<&str>) -> ApiResult<Period> {
    match raw.map(str::trim).filter(|p| !p.is_empty()) {
        None => Ok(Period::default()),
        Some(p) => p.parse().map_err(|e: standup_shared::summaries::period::ParsePeriodError| {
            ApiError::BadRequest(e.to_string())
        }),
    }
}

/// Parses a comma-separated id list, skipping empty segments
pub fn parse_user_ids(raw: &str) -> ApiResult<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| ApiError::BadRequest(format!("Invalid user id '{}'", s)))
        })
        .collect()
}

async fn own_profile(state: &AppState, ctx: &AuthContext) -> ApiResult<Profile> {
    Profile::find_by_id(&state.db, ctx.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
}

pub async fn overview(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> ApiResult<Json<OverviewResponse>> {
    let me = own_profile(&state, &ctx).await?;
    let profiles = Profile::list_all(&state.db).await?;

    Ok(Json(OverviewResponse {
        teams: build_directory(profiles),
        selected_user_ids: me.summary_selected_user_ids,
    }))
}

pub async fn save_selection(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(req): Json<SaveSelectionRequest>,
) -> ApiResult<Json<SaveSelectionResponse>> {
    let ids = dedupe_ids(&req.user_ids);

    if !Profile::update_summary_selection(&state.db, ctx.user_id, &ids).await? {
        return Err(ApiError::NotFound("Profile not found".to_string()));
    }

    tracing::debug!(user_id = %ctx.user_id, selected = ids.len(), "Saved summary selection");

    Ok(Json(SaveSelectionResponse {
        selected_user_ids: ids,
    }))
}

pub async fn notes(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<NotesQuery>,
) -> ApiResult<Json<NotesResponse>> {
    let period = parse_period(query.period.as_deref())?;

    let user_ids = match query.user_ids.as_deref() {
        Some(raw) => dedupe_ids(&parse_user_ids(raw)?),
        None => own_profile(&state, &ctx).await?.summary_selected_user_ids,
    };

    let window = period.current_window();
    let rows = fetch_aggregated_notes(&state.db, period, &user_ids).await?;
    let groups = group_aggregated(rows.clone());

    Ok(Json(NotesResponse {
        period,
        window,
        user_ids,
        rows,
        groups,
    }))
}
