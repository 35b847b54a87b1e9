/// Note aggregation across users
///
/// Notes and profiles are fetched separately and joined in memory, then
/// grouped date → team → user for display.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::period::{DateWindow, Period};
use crate::models::profile::{display_label, team_bucket, team_order, Profile};
use crate::models::standup::StandupNote;

/// A note joined with its owner's profile fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedNote {
    pub note_id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub team: Option<String>,
    pub note_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
    pub yesterday: Option<String>,
    pub today: Option<String>,
    pub blockers: Option<String>,
    pub learnings: Option<String>,
}

impl AggregatedNote {
    /// Display name, then username, then `(no name)`
    pub fn author(&self) -> String {
        display_label(self.display_name.as_deref(), self.username.as_deref())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub teams: Vec<TeamGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamGroup {
    pub team: String,
    pub users: Vec<UserGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserGroup {
    pub user_id: Uuid,
    pub name: String,
    pub username: Option<String>,
    pub notes: Vec<AggregatedNote>,
}

/// Notes of `user_ids` within the current window of `period`
pub async fn fetch_aggregated_notes(
    pool: &PgPool,
    period: Period,
    user_ids: &[Uuid],
) -> Result<Vec<AggregatedNote>, sqlx::Error> {
    fetch_notes_in_window(pool, user_ids, period.current_window()).await
}

/// Notes of `user_ids` within `window`, joined with their profiles
///
/// An empty id set returns immediately without touching the database.
pub async fn fetch_notes_in_window(
    pool: &PgPool,
    user_ids: &[Uuid],
    window: DateWindow,
) -> Result<Vec<AggregatedNote>, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let notes = StandupNote::list_for_users_between(pool, user_ids, window.from, window.to).await?;
    if notes.is_empty() {
        return Ok(Vec::new());
    }

    let profiles = Profile::find_many(pool, user_ids).await?;

    tracing::debug!(
        users = user_ids.len(),
        notes = notes.len(),
        from = %window.from,
        to = %window.to,
        days = window.days(),
        "Fetched notes for aggregation"
    );

    Ok(join_notes(notes, &profiles))
}

/// Joins notes with their owners' profiles, keeping note order
///
/// A note whose profile is missing keeps empty profile fields.
pub fn join_notes(notes: Vec<StandupNote>, profiles: &[Profile]) -> Vec<AggregatedNote> {
    let by_id: HashMap<Uuid, &Profile> = profiles.iter().map(|p| (p.id, p)).collect();

    notes
        .into_iter()
        .map(|note| {
            let profile = by_id.get(&note.user_id);
            AggregatedNote {
                note_id: note.id,
                user_id: note.user_id,
                username: profile.and_then(|p| p.username.clone()),
                display_name: profile.and_then(|p| p.display_name.clone()),
                team: profile.and_then(|p| p.team.clone()),
                note_date: note.note_date,
                updated_at: note.updated_at,
                yesterday: note.yesterday,
                today: note.today,
                blockers: note.blockers,
                learnings: note.learnings,
            }
        })
        .collect()
}

/// Groups rows by date (newest first), team (alphabetical) and user
/// (alphabetical by label, ignoring case)
pub fn group_aggregated(rows: Vec<AggregatedNote>) -> Vec<DateGroup> {
    let mut dates: BTreeMap<Reverse<NaiveDate>, HashMap<String, HashMap<Uuid, UserGroup>>> =
        BTreeMap::new();

    for row in rows {
        let user = dates
            .entry(Reverse(row.note_date))
            .or_default()
            .entry(team_bucket(row.team.as_deref()))
            .or_default()
            .entry(row.user_id)
            .or_insert_with(|| UserGroup {
                user_id: row.user_id,
                name: row.author(),
                username: row.username.clone(),
                notes: Vec::new(),
            });
        user.notes.push(row);
    }

    dates
        .into_iter()
        .map(|(Reverse(date), teams)| {
            let mut teams: Vec<TeamGroup> = teams
                .into_iter()
                .map(|(team, users)| {
                    let mut users: Vec<UserGroup> = users.into_values().collect();
                    users.sort_by(|a, b| {
                        a.name
                            .to_lowercase()
                            .cmp(&b.name.to_lowercase())
                            .then(a.user_id.cmp(&b.user_id))
                    });
                    TeamGroup { team, users }
                })
                .collect();
            teams.sort_by(|a, b| team_order(&a.team, &b.team));
            DateGroup { date, teams }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{NO_NAME, UNASSIGNED_TEAM};
    use sqlx::postgres::PgPoolOptions;

    fn note(user_id: Uuid, date: &str, today: &str) -> StandupNote {
        StandupNote {
            id: Uuid::new_v4(),
            user_id,
            note_date: date.parse().unwrap(),
            yesterday: None,
            today: Some(today.to_string()),
            blockers: None,
            learnings: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profile(id: Uuid, name: &str, team: Option<&str>) -> Profile {
        Profile {
            id,
            username: Some(name.to_lowercase()),
            display_name: Some(name.to_string()),
            team: team.map(str::to_string),
            role: None,
            github_project: None,
            github_username: None,
            summary_selected_user_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_empty_user_set_skips_database() {
        // Lazy pool pointing nowhere: any query would fail
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();

        let rows = fetch_aggregated_notes(&pool, Period::Week, &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_join_notes_missing_profile() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let rows = join_notes(
            vec![note(known, "2025-03-03", "a"), note(unknown, "2025-03-03", "b")],
            &[profile(known, "Ada", Some("Core"))],
        );

        assert_eq!(rows[0].author(), "Ada");
        assert_eq!(rows[0].team.as_deref(), Some("Core"));
        assert_eq!(rows[1].author(), NO_NAME);
        assert_eq!(rows[1].team, None);
    }

    #[test]
    fn test_group_aggregated_ordering() {
        let ada = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let cy = Uuid::new_v4();
        let profiles = vec![
            profile(ada, "Ada", Some("Core")),
            profile(bob, "bob", Some("Core")),
            profile(cy, "Cy", None),
        ];

        let rows = join_notes(
            vec![
                note(bob, "2025-03-04", "b1"),
                note(cy, "2025-03-04", "c1"),
                note(ada, "2025-03-04", "a1"),
                note(ada, "2025-03-03", "a0"),
            ],
            &profiles,
        );
        let groups = group_aggregated(rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date.to_string(), "2025-03-04");
        assert_eq!(groups[1].date.to_string(), "2025-03-03");

        let teams: Vec<_> = groups[0].teams.iter().map(|t| t.team.as_str()).collect();
        assert_eq!(teams, vec!["Core", UNASSIGNED_TEAM]);

        let core: Vec<_> = groups[0].teams[0].users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(core, vec!["Ada", "bob"]);

        assert_eq!(groups[1].teams[0].users[0].notes[0].today.as_deref(), Some("a0"));
    }

    #[test]
    fn test_group_aggregated_teams_ignore_case() {
        let zoe = Uuid::new_v4();
        let al = Uuid::new_v4();
        let rows = join_notes(
            vec![note(zoe, "2025-03-04", "z"), note(al, "2025-03-04", "a")],
            &[profile(zoe, "Zoe", Some("Zeta")), profile(al, "Al", Some("alpha"))],
        );

        let groups = group_aggregated(rows);
        let teams: Vec<_> = groups[0].teams.iter().map(|t| t.team.as_str()).collect();
        assert_eq!(teams, vec!["alpha", "Zeta"]);
    }

    #[test]
    fn test_group_aggregated_keeps_every_note() {
        let ada = Uuid::new_v4();
        let rows = join_notes(
            vec![note(ada, "2025-03-04", "late"), note(ada, "2025-03-04", "early")],
            &[profile(ada, "Ada", None)],
        );

        let groups = group_aggregated(rows);
        let notes = &groups[0].teams[0].users[0].notes;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].today.as_deref(), Some("late"));
    }
}
