/// Team directory
///
/// `GET /v1/users` lists every profile grouped by team, teams sorted
/// alphabetically with an `Unassigned` bucket for people without one.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use standup_shared::{
    auth::middleware::AuthContext,
    models::profile::{group_by_team, Profile},
};
use uuid::Uuid;

/// Role shown for profiles that never set one
pub const DEFAULT_ROLE: &str = "Member";

#[derive(Debug, Serialize)]
pub struct DirectoryResponse {
    pub teams: Vec<DirectoryTeam>,
}

#[derive(Debug, Serialize)]
pub struct DirectoryTeam {
    pub team: String,
    pub members: Vec<DirectoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct DirectoryEntry {
    pub id: Uuid,
    pub display_name: String,
    pub username: Option<String>,
    pub role: String,

    /// Public notes feed; absent until a username is set
    pub notes_path: Option<String>,
    pub avatar_url: Option<String>,
}

/// Generated avatar for a username
pub fn avatar_url(username: &str) -> String {
    format!(
        "https://api.dicebear.com/7.x/bottts/png?seed={}&size=96",
        username
    )
}

impl From<Profile> for DirectoryEntry {
    fn from(profile: Profile) -> Self {
        let username = profile.username.clone().filter(|u| !u.is_empty());
        let role = profile
            .role
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());

        Self {
            id: profile.id,
            display_name: profile.label(),
            notes_path: username.as_ref().map(|u| format!("/v1/standups/u/{}", u)),
            avatar_url: username.as_deref().map(avatar_url),
            username,
            role,
        }
    }
}

/// Groups profiles into directory teams
pub fn build_directory(profiles: Vec<Profile>) -> Vec<DirectoryTeam> {
    group_by_team(profiles)
        .into_iter()
        .map(|team| DirectoryTeam {
            team: team.team,
            members: team.members.into_iter().map(DirectoryEntry::from).collect(),
        })
        .collect()
}

pub async fn directory(
    State(state): State<AppState>,
    _ctx: AuthContext,
) -> ApiResult<Json<DirectoryResponse>> {
    let profiles = Profile::list_all(&state.db).await?;

    Ok(Json(DirectoryResponse {
        teams: build_directory(profiles),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use standup_shared::models::profile::{NO_NAME, UNASSIGNED_TEAM};

    fn profile(username: Option<&str>, team: Option<&str>, role: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            username: username.map(str::to_string),
            display_name: None,
            team: team.map(str::to_string),
            role: role.map(str::to_string),
            github_project: None,
            github_username: None,
            summary_selected_user_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entry_defaults() {
        let entry = DirectoryEntry::from(profile(None, None, None));
        assert_eq!(entry.display_name, NO_NAME);
        assert_eq!(entry.role, DEFAULT_ROLE);
        assert!(entry.notes_path.is_none());
        assert!(entry.avatar_url.is_none());
    }

    #[test]
    fn test_entry_links() {
        let entry = DirectoryEntry::from(profile(Some("ada"), Some("Core"), Some("Lead")));
        assert_eq!(entry.display_name, "ada");
        assert_eq!(entry.role, "Lead");
        assert_eq!(entry.notes_path.as_deref(), Some("/v1/standups/u/ada"));
        assert_eq!(
            entry.avatar_url.as_deref(),
            Some("https://api.dicebear.com/7.x/bottts/png?seed=ada&size=96")
        );
    }

    #[test]
    fn test_build_directory_groups_by_team() {
        let teams = build_directory(vec![
            profile(Some("zed"), Some("Core"), None),
            profile(Some("amy"), None, None),
            profile(Some("bo"), Some("Core"), None),
        ]);

        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].team, "Core");
        assert_eq!(teams[0].members[0].username.as_deref(), Some("bo"));
        assert_eq!(teams[1].team, UNASSIGNED_TEAM);
    }
}
