/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use standup_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config)?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    ai::{OpenAiGenerator, TextGenerator},
    config::Config,
    github::{GitHubClient, PullRequestSource},
    middleware::{
        security::SecurityHeadersLayer,
        session::{optional_session, require_session},
    },
    routes,
};
use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request via Axum's `State` extractor; everything inside
/// is reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Pull request search and merge checks
    pub github: Arc<dyn PullRequestSource>,

    /// Chat-completion model for AI summaries
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    /// Creates the state with the real GitHub and model clients
    pub fn new(db: PgPool, config: Config) -> anyhow::Result<Self> {
        let github = GitHubClient::new(&config.github)?;
        let generator = OpenAiGenerator::new(&config.openai)?;

        Ok(Self::with_clients(db, config, Arc::new(github), Arc::new(generator)))
    }

    /// Creates the state with caller-supplied clients
    pub fn with_clients(
        db: PgPool,
        config: Config,
        github: Arc<dyn PullRequestSource>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            github,
            generator,
        }
    }

    /// Secret used to sign and check session tokens
    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }

    /// Whether cookies should carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.config.api.production
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                      # Health check (public)
/// ├── GET  /signin                      # Where to sign in (public)
/// └── /v1/
///     ├── /auth/                        # public
///     │   ├── POST /signup
///     │   ├── POST /signin
///     │   └── POST /signout
///     ├── /admin/                       # x-admin-token
///     │   ├── POST /users
///     │   └── POST /password
///     ├── GET  /home                    # session optional
///     ├── GET  /standups/u/:username    # session optional
///     └── (session required)
///         ├── GET|PUT /standups, GET /standups/date/:date, DELETE /standups/:id
///         ├── GET /users
///         ├── GET|PUT /profile
///         ├── GET /summaries, PUT /summaries/selection, GET /summaries/notes
///         ├── POST /ai/summary
///         └── GET /github/prs, PUT /github/settings
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security and cache headers
/// 2. CORS
/// 3. Request tracing
/// 4. Session resolution (per route group)
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/signin", get(routes::auth::sign_in_page));

    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::sign_up))
        .route("/signin", post(routes::auth::sign_in))
        .route("/signout", post(routes::auth::sign_out));

    let admin_routes = Router::new()
        .route("/users", post(routes::admin::create_user))
        .route("/password", post(routes::admin::set_password));

    let personalised_routes = Router::new()
        .route("/home", get(routes::home::home))
        .route("/standups/u/:username", get(routes::standups::user_feed))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            optional_session,
        ));

    let signed_in_routes = Router::new()
        .route(
            "/standups",
            get(routes::standups::list_own).put(routes::standups::upsert),
        )
        .route("/standups/date/:date", get(routes::standups::for_date))
        .route("/standups/:id", delete(routes::standups::remove))
        .route("/users", get(routes::users::directory))
        .route(
            "/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route("/summaries", get(routes::summaries::overview))
        .route("/summaries/selection", put(routes::summaries::save_selection))
        .route("/summaries/notes", get(routes::summaries::notes))
        .route("/ai/summary", post(routes::ai_summary::generate))
        .route("/github/prs", get(routes::github::pull_requests))
        .route("/github/settings", put(routes::github::save_settings))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .merge(personalised_routes)
        .merge(signed_in_routes);

    Router::new()
        .merge(public_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS for browser clients on other origins
///
/// `*` allows any origin without credentials; explicit origins may send the
/// session cookie.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(standup_shared::auth::admin_token::ADMIN_TOKEN_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
