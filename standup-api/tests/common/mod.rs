/// Common test utilities for integration tests
///
/// Integration tests run the real router against PostgreSQL. They need
/// `DATABASE_URL`; without it [`TestContext::new`] returns `None` and the
/// test returns early. Every context registers a fresh account so tests can
/// share one database.
///
/// The GitHub token and OpenAI key are never passed through, so no test
/// reaches a third-party API.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use standup_api::app::{build_router, AppState};
use standup_api::config::Config;
use standup_shared::auth::jwt::{create_token, Claims};
use standup_shared::db::migrations::run_migrations;
use standup_shared::models::user::{CreateUser, User};
use tower::ServiceExt;
use uuid::Uuid;

const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Environment keys that would let a test call a real upstream
const UPSTREAM_KEYS: [&str; 2] = ["GITHUB_TOKEN", "OPENAI_API_KEY"];

/// Response status, headers and JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub username: String,
    pub token: String,
}

pub fn test_config() -> Option<Config> {
    std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty())?;

    let config = Config::from_lookup(|key| {
        if UPSTREAM_KEYS.contains(&key) {
            return None;
        }
        match key {
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            _ => std::env::var(key).ok(),
        }
    })
    .expect("Invalid test configuration");

    Some(config)
}

/// Unique suffix for emails and usernames
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

impl TestContext {
    /// Connects, migrates and signs in a fresh user
    pub async fn new() -> Option<Self> {
        let config = test_config()?;

        let db = PgPool::connect(&config.database.url)
            .await
            .expect("Failed to connect to test database");
        run_migrations(&db).await.expect("Migrations failed");

        let username = unique("tester");
        let user = Self::register(&db, &username).await;

        let token = create_token(
            &Claims::new(user.id, chrono::Duration::hours(1)),
            &config.session.secret,
        )
        .expect("Failed to sign token");

        let state = AppState::new(db.clone(), config.clone()).expect("Failed to build state");
        let app = build_router(state);

        Some(Self {
            db,
            app,
            config,
            user,
            username,
            token,
        })
    }

    /// Registers another account directly in the database
    pub async fn register(db: &PgPool, username: &str) -> User {
        let (user, _) = User::register(
            db,
            CreateUser {
                email: format!("{}@example.com", username),
                password_hash: "$argon2id$unused".to_string(),
                display_name: Some(username.to_string()),
                username: Some(username.to_string()),
            },
        )
        .await
        .expect("Failed to register user");
        user
    }

    /// Bearer token for another user id
    pub fn token_for(&self, user_id: Uuid) -> String {
        create_token(
            &Claims::new(user_id, chrono::Duration::hours(1)),
            &self.config.session.secret,
        )
        .expect("Failed to sign token")
    }

    /// Sends a request as this context's user
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        send(&self.app, method, uri, body, Some(&self.token)).await
    }
}

/// Sends a request, optionally with a bearer token, and decodes the body
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}
