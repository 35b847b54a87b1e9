/// Home page data
///
/// `GET /v1/home` works with or without a session. Signed-in callers get a
/// personal greeting and a quick-start checklist built from their profile.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use standup_shared::{
    auth::middleware::AuthContext,
    models::{profile::Profile, user::User},
};

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub signed_in: bool,
    pub greeting: String,
    pub checklist: Vec<ChecklistItem>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub key: &'static str,
    pub label: &'static str,
    pub done: bool,
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Quick-start steps; everything but the first is open when signed out
pub fn checklist(signed_in: bool, profile: Option<&Profile>) -> Vec<ChecklistItem> {
    vec![
        ChecklistItem {
            key: "signed_in",
            label: "Sign in",
            done: signed_in,
        },
        ChecklistItem {
            key: "display_name",
            label: "Set your display name",
            done: non_empty(profile.and_then(|p| p.display_name.as_deref())),
        },
        ChecklistItem {
            key: "username",
            label: "Reserve a username",
            done: non_empty(profile.and_then(|p| p.username.as_deref())),
        },
        ChecklistItem {
            key: "github",
            label: "Connect a GitHub project",
            done: profile.and_then(Profile::github_settings).is_some(),
        },
    ]
}

pub async fn home(
    State(state): State<AppState>,
    session: Option<AuthContext>,
) -> ApiResult<Json<HomeResponse>> {
    let Some(ctx) = session else {
        return Ok(Json(HomeResponse {
            signed_in: false,
            greeting: "Welcome to Standup".to_string(),
            checklist: checklist(false, None),
        }));
    };

    let profile = Profile::find_by_id(&state.db, ctx.user_id).await?;
    let name = match profile.as_ref().and_then(|p| p.display_name.clone()) {
        Some(name) if !name.trim().is_empty() => name,
        _ => User::find_by_id(&state.db, ctx.user_id)
            .await?
            .map(|u| u.email)
            .unwrap_or_else(|| "there".to_string()),
    };

    Ok(Json(HomeResponse {
        signed_in: true,
        greeting: format!("Welcome back, {}", name),
        checklist: checklist(true, profile.as_ref()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_checklist_signed_out() {
        let items = checklist(false, None);
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| !i.done));
    }

    #[test]
    fn test_checklist_tracks_profile() {
        let profile = Profile {
            id: Uuid::new_v4(),
            username: Some("ada".to_string()),
            display_name: Some("  ".to_string()),
            team: None,
            role: None,
            github_project: Some("acme/widgets".to_string()),
            github_username: Some("ada".to_string()),
            summary_selected_user_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let done: Vec<_> = checklist(true, Some(&profile))
            .into_iter()
            .filter(|i| i.done)
            .map(|i| i.key)
            .collect();
        assert_eq!(done, vec!["signed_in", "username", "github"]);
    }
}
