/// Stand-up note model
///
/// One note per user per calendar day. Every write is an upsert keyed on
/// `(user_id, note_date)`, so saving the editor twice for the same day
/// updates the existing row instead of creating a second one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE standups (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     note_date DATE NOT NULL,
///     yesterday TEXT,
///     today TEXT,
///     blockers TEXT,
///     learnings TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT standups_user_id_note_date_key UNIQUE (user_id, note_date)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const STANDUP_COLUMNS: &str =
    "id, user_id, note_date, yesterday, today, blockers, learnings, created_at, updated_at";

/// A stored stand-up note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StandupNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub note_date: NaiveDate,
    pub yesterday: Option<String>,
    pub today: Option<String>,
    pub blockers: Option<String>,
    pub learnings: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The four free-text fields of a note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFields {
    pub yesterday: Option<String>,
    pub today: Option<String>,
    pub blockers: Option<String>,
    pub learnings: Option<String>,
}

impl NoteFields {
    /// Trims every field and turns blank ones into `None`
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            yesterday: clean(self.yesterday),
            today: clean(self.today),
            blockers: clean(self.blockers),
            learnings: clean(self.learnings),
        }
    }

    /// True when no field carries text
    pub fn is_blank(&self) -> bool {
        [&self.yesterday, &self.today, &self.blockers, &self.learnings]
            .iter()
            .all(|f| f.as_deref().map_or(true, |v| v.trim().is_empty()))
    }
}

/// Whether an upsert inserted a new row or overwrote an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    note: StandupNote,
    inserted: bool,
}

/// Notes of one day, as shown in the per-user feed
#[derive(Debug, Clone, Serialize)]
pub struct DayNotes {
    pub date: NaiveDate,
    pub notes: Vec<StandupNote>,
}

impl StandupNote {
    /// Inserts or overwrites the note for `(user_id, note_date)`
    ///
    /// `fields` should already be normalized; blank values are stored as
    /// NULL. `xmax = 0` holds only for a freshly inserted tuple, which is how
    /// the outcome is told apart without a second query.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        note_date: NaiveDate,
        fields: NoteFields,
    ) -> Result<(Self, UpsertOutcome), sqlx::Error> {
        let row = sqlx::query_as::<_, UpsertRow>(&format!(
            r#"
            INSERT INTO standups (user_id, note_date, yesterday, today, blockers, learnings)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, note_date) DO UPDATE
            SET yesterday = EXCLUDED.yesterday,
                today = EXCLUDED.today,
                blockers = EXCLUDED.blockers,
                learnings = EXCLUDED.learnings,
                updated_at = NOW()
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            STANDUP_COLUMNS
        ))
        .bind(user_id)
        .bind(note_date)
        .bind(fields.yesterday)
        .bind(fields.today)
        .bind(fields.blockers)
        .bind(fields.learnings)
        .fetch_one(pool)
        .await?;

        let outcome = if row.inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        };

        Ok((row.note, outcome))
    }

    /// The caller's note for one day, if any
    pub async fn find_for_date(
        pool: &PgPool,
        user_id: Uuid,
        note_date: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, StandupNote>(&format!(
            "SELECT {} FROM standups WHERE user_id = $1 AND note_date = $2",
            STANDUP_COLUMNS
        ))
        .bind(user_id)
        .bind(note_date)
        .fetch_optional(pool)
        .await
    }

    /// All notes of one user, newest day first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, StandupNote>(&format!(
            "SELECT {} FROM standups WHERE user_id = $1 ORDER BY note_date DESC, updated_at DESC",
            STANDUP_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Notes of several users within an inclusive date range
    pub async fn list_for_users_between(
        pool: &PgPool,
        user_ids: &[Uuid],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, StandupNote>(&format!(
            r#"
            SELECT {} FROM standups
            WHERE user_id = ANY($1) AND note_date BETWEEN $2 AND $3
            ORDER BY note_date DESC, updated_at DESC
            "#,
            STANDUP_COLUMNS
        ))
        .bind(user_ids)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Deletes a note owned by `user_id`
    ///
    /// Returns false if the note does not exist or belongs to someone else.
    pub async fn delete_owned(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM standups WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Groups notes by day, newest day first
///
/// Input order within a day is kept.
pub fn group_by_day(notes: Vec<StandupNote>) -> Vec<DayNotes> {
    let mut days: Vec<DayNotes> = Vec::new();

    for note in notes {
        match days.iter_mut().find(|d| d.date == note.note_date) {
            Some(day) => day.notes.push(note),
            None => days.push(DayNotes {
                date: note.note_date,
                notes: vec![note],
            }),
        }
    }

    days.sort_by(|a, b| b.date.cmp(&a.date));
    days
}
