/// Profile model and database operations
///
/// One profile per account, sharing the account's id. The profile carries
/// everything teammates see plus two per-user settings: the GitHub
/// repository/handle for the PR view and the list of people included in the
/// caller's aggregated summary.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     username TEXT,
///     display_name TEXT,
///     team TEXT,
///     role TEXT,
///     github_project TEXT,
///     github_username TEXT,
///     summary_selected_user_ids UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX profiles_username_key ON profiles (LOWER(username));
/// ```

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Bucket for profiles without a team
pub const UNASSIGNED_TEAM: &str = "Unassigned";

/// Label for profiles with neither display name nor username
pub const NO_NAME: &str = "(no name)";

/// Shortest and longest accepted routing username
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;

pub(crate) const PROFILE_COLUMNS: &str = "id, username, display_name, team, role, github_project, \
     github_username, summary_selected_user_ids, created_at, updated_at";

/// A teammate's profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Same as the owning account id
    pub id: Uuid,

    /// Public routing username, unique regardless of case
    pub username: Option<String>,

    pub display_name: Option<String>,
    pub team: Option<String>,
    pub role: Option<String>,

    /// Repository in `owner/repo` form
    pub github_project: Option<String>,

    /// GitHub handle without the leading `@`
    pub github_username: Option<String>,

    /// Users included in this user's aggregated summary
    pub summary_selected_user_ids: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written by the profile form
#[derive(Debug, Clone)]
pub struct UpdateProfile {
    pub display_name: String,
    pub team: String,
    pub role: String,

    /// New routing username; `None` leaves it untouched
    pub username: Option<String>,
}

impl Profile {
    /// Name to show for this profile
    pub fn label(&self) -> String {
        display_label(self.display_name.as_deref(), self.username.as_deref())
    }

    /// Team bucket this profile is listed under
    pub fn team_bucket(&self) -> String {
        team_bucket(self.team.as_deref())
    }

    /// Both GitHub settings, if present
    pub fn github_settings(&self) -> Option<(&str, &str)> {
        let project = self.github_project.as_deref().filter(|p| !p.is_empty())?;
        let username = self.github_username.as_deref().filter(|u| !u.is_empty())?;
        Some((project, username))
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a profile by routing username, ignoring case
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE LOWER(username) = LOWER($1)",
            PROFILE_COLUMNS
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Fetches the profiles for a set of ids; unknown ids are skipped
    pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE id = ANY($1)",
            PROFILE_COLUMNS
        ))
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Lists every profile ordered by team then display name
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles ORDER BY team ASC NULLS FIRST, display_name ASC NULLS FIRST",
            PROFILE_COLUMNS
        ))
        .fetch_all(pool)
        .await
    }

    /// True if another profile already uses `username` (case-insensitive)
    pub async fn username_taken(pool: &PgPool, username: &str, except: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM profiles WHERE LOWER(username) = LOWER($1) AND id <> $2)",
        )
        .bind(username)
        .bind(except)
        .fetch_one(pool)
        .await
    }

    /// Writes the profile form fields
    ///
    /// The username column is only touched when `data.username` is set. A
    /// collision that slips past [`Profile::username_taken`] still fails on
    /// the unique index. Takes any executor so it can share a transaction
    /// with an email change.
    pub async fn update_details<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles
            SET display_name = $2,
                team = $3,
                role = $4,
                username = COALESCE($5, username),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(data.display_name)
        .bind(data.team)
        .bind(data.role)
        .bind(data.username)
        .fetch_optional(executor)
        .await
    }

    pub async fn update_github_settings(
        pool: &PgPool,
        id: Uuid,
        project: &str,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles
            SET github_project = $2, github_username = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(project)
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Replaces the caller's aggregator selection
    pub async fn update_summary_selection(
        pool: &PgPool,
        id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE profiles SET summary_selected_user_ids = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(user_ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Team bucket for an optional team name; blank names count as unassigned
pub fn team_bucket(team: Option<&str>) -> String {
    match team.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNASSIGNED_TEAM.to_string(),
    }
}

/// Display name, else username; blank values count as missing
pub fn preferred_name<'a>(display_name: Option<&'a str>, username: Option<&'a str>) -> Option<&'a str> {
    display_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or(username.map(str::trim).filter(|u| !u.is_empty()))
}

/// Display name, then username, then a generic label
pub fn display_label(display_name: Option<&str>, username: Option<&str>) -> String {
    preferred_name(display_name, username)
        .unwrap_or(NO_NAME)
        .to_string()
}

/// Alphabetical team order ignoring case; exact spelling breaks ties
pub fn team_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Routing usernames: 3-32 chars of ASCII letters, digits, `_`, `.`, `-`
pub fn is_valid_username(username: &str) -> bool {
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Profiles of one team, as listed in the directory and the summary picker
#[derive(Debug, Clone, Serialize)]
pub struct TeamProfiles {
    pub team: String,
    pub members: Vec<Profile>,
}

/// Groups profiles by team bucket
///
/// Teams come out alphabetically; members are sorted by their label,
/// ignoring case.
pub fn group_by_team(profiles: Vec<Profile>) -> Vec<TeamProfiles> {
    let mut teams: HashMap<String, Vec<Profile>> = HashMap::new();
    for profile in profiles {
        teams.entry(profile.team_bucket()).or_default().push(profile);
    }

    let mut teams: Vec<TeamProfiles> = teams
        .into_iter()
        .map(|(team, mut members)| {
            members.sort_by_cached_key(|p| p.label().to_lowercase());
            TeamProfiles { team, members }
        })
        .collect();
    teams.sort_by(|a, b| team_order(&a.team, &b.team));
    teams
}

/// Removes duplicate ids, keeping the first occurrence of each
pub fn dedupe_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_bucket() {
        assert_eq!(team_bucket(Some("Engineering")), "Engineering");
        assert_eq!(team_bucket(Some("  Design ")), "Design");
        assert_eq!(team_bucket(Some("   ")), UNASSIGNED_TEAM);
        assert_eq!(team_bucket(None), UNASSIGNED_TEAM);
    }

    #[test]
    fn test_display_label_fallbacks() {
        assert_eq!(display_label(Some("Ada"), Some("ada")), "Ada");
        assert_eq!(display_label(None, Some("ada")), "ada");
        assert_eq!(display_label(Some(""), Some("ada")), "ada");
        assert_eq!(display_label(None, None), NO_NAME);
        assert_eq!(display_label(Some("   "), None), NO_NAME);
        assert_eq!(display_label(Some(" Ada "), None), "Ada");
    }

    #[test]
    fn test_is_valid_username() {
        assert!(is_valid_username("ada"));
        assert!(is_valid_username("Ada.Lovelace-1815_x"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("slash/es"));
        assert!(!is_valid_username(&"a".repeat(33)));
    }

    #[test]
    fn test_dedupe_ids_keeps_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(dedupe_ids(&[a, b, a, b, a]), vec![a, b]);
        assert!(dedupe_ids(&[]).is_empty());
    }

    fn profile(display_name: Option<&str>, team: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            username: None,
            display_name: display_name.map(str::to_string),
            team: team.map(str::to_string),
            role: None,
            github_project: None,
            github_username: None,
            summary_selected_user_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_team() {
        let teams = group_by_team(vec![
            profile(Some("zed"), Some("Platform")),
            profile(Some("Bea"), None),
            profile(Some("amy"), Some("Platform")),
            profile(Some("Cy"), Some("Design")),
        ]);

        let names: Vec<_> = teams.iter().map(|t| t.team.as_str()).collect();
        assert_eq!(names, vec!["Design", "Platform", UNASSIGNED_TEAM]);

        let platform: Vec<_> = teams[1].members.iter().map(|p| p.label()).collect();
        assert_eq!(platform, vec!["amy", "zed"]);
    }

    #[test]
    fn test_group_by_team_ignores_case() {
        let teams = group_by_team(vec![
            profile(Some("zed"), Some("Zeta")),
            profile(Some("amy"), Some("alpha")),
            profile(Some("bo"), Some("Beta")),
        ]);

        let names: Vec<_> = teams.iter().map(|t| t.team.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn test_team_order_tiebreak() {
        assert_eq!(team_order("core", "Core"), Ordering::Greater);
        assert_eq!(team_order("Core", "Core"), Ordering::Equal);
    }

    #[test]
    fn test_github_settings_requires_both() {
        let mut profile = profile(None, None);
        profile.github_project = Some("rust-lang/rust".to_string());
        assert!(profile.github_settings().is_none());

        profile.github_username = Some("octocat".to_string());
        assert_eq!(profile.github_settings(), Some(("rust-lang/rust", "octocat")));
    }
}
