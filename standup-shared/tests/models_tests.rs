/// Integration tests for the user, profile and note models
///
/// These tests require a running PostgreSQL database and are skipped when
/// DATABASE_URL is not set. Every test registers fresh accounts so they can
/// run against a shared database.

use chrono::NaiveDate;
use sqlx::PgPool;
use standup_shared::db::migrations::run_migrations;
use standup_shared::db::pool::{create_pool, DatabaseConfig};
use standup_shared::models::profile::{Profile, UpdateProfile};
use standup_shared::models::standup::{NoteFields, StandupNote, UpsertOutcome};
use standup_shared::models::user::{CreateUser, User};
use standup_shared::summaries::aggregate::{fetch_notes_in_window, group_aggregated};
use standup_shared::summaries::period::DateWindow;
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())?;
    let pool = create_pool(DatabaseConfig {
        url,
        ..Default::default()
    })
    .await
    .expect("Failed to create pool");
    run_migrations(&pool).await.expect("Migrations failed");
    Some(pool)
}

async fn register(pool: &PgPool, name: &str) -> User {
    let suffix = Uuid::new_v4().simple().to_string();
    let (user, _) = User::register(
        pool,
        CreateUser {
            email: format!("{}-{}@example.com", name, suffix),
            password_hash: "$argon2id$placeholder".to_string(),
            display_name: Some(name.to_string()),
            username: Some(format!("{}-{}", name, &suffix[..12])),
        },
    )
    .await
    .expect("Failed to register");
    user
}

fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_upsert_same_day_twice() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = register(&pool, "upsert").await;

    let (first, outcome) = StandupNote::upsert(
        &pool,
        user.id,
        day("2025-03-10"),
        NoteFields {
            today: Some("write the parser".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);

    let (second, outcome) = StandupNote::upsert(
        &pool,
        user.id,
        day("2025-03-10"),
        NoteFields {
            today: Some("test the parser".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(first.id, second.id);

    let notes = StandupNote::list_for_user(&pool, user.id).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].today.as_deref(), Some("test the parser"));
}

#[tokio::test]
async fn test_delete_is_owner_scoped() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let owner = register(&pool, "owner").await;
    let other = register(&pool, "other").await;

    let (note, _) = StandupNote::upsert(
        &pool,
        owner.id,
        day("2025-03-11"),
        NoteFields {
            blockers: Some("none".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(!StandupNote::delete_owned(&pool, note.id, other.id).await.unwrap());
    assert!(StandupNote::delete_owned(&pool, note.id, owner.id).await.unwrap());
    assert!(StandupNote::find_for_date(&pool, owner.id, day("2025-03-11"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_username_collision_is_rejected() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let first = register(&pool, "first").await;
    let second = register(&pool, "second").await;

    let taken = Profile::find_by_id(&pool, first.id)
        .await
        .unwrap()
        .and_then(|p| p.username)
        .expect("registered with a username");

    assert!(Profile::username_taken(&pool, &taken.to_uppercase(), second.id)
        .await
        .unwrap());
    assert!(!Profile::username_taken(&pool, &taken, first.id).await.unwrap());

    let result = Profile::update_details(
        &pool,
        second.id,
        UpdateProfile {
            display_name: "Second".to_string(),
            team: "Core".to_string(),
            role: "Engineer".to_string(),
            username: Some(taken.to_uppercase()),
        },
    )
    .await;

    let err = result.expect_err("unique index should reject the username");
    let db_err = err.as_database_error().expect("database error");
    assert!(db_err.is_unique_violation());
}

#[tokio::test]
async fn test_aggregation_joins_profiles() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let ada = register(&pool, "ada").await;
    let bob = register(&pool, "bob").await;

    for (user, date) in [(&ada, "2025-03-12"), (&bob, "2025-03-12"), (&ada, "2025-03-01")] {
        StandupNote::upsert(
            &pool,
            user.id,
            day(date),
            NoteFields {
                today: Some(format!("{} work", date)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let window = DateWindow {
        from: day("2025-03-10"),
        to: day("2025-03-16"),
    };
    let rows = fetch_notes_in_window(&pool, &[ada.id, bob.id], window).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.display_name.is_some()));

    let groups = group_aggregated(rows);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].teams[0].users.len(), 2);
}

#[tokio::test]
async fn test_summary_selection_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let user = register(&pool, "selector").await;
    let picked = vec![Uuid::new_v4(), user.id];

    assert!(Profile::update_summary_selection(&pool, user.id, &picked).await.unwrap());

    let profile = Profile::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(profile.summary_selected_user_ids, picked);
}
