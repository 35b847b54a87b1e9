/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST` / `API_PORT`: Bind address (default: 0.0.0.0:8080)
/// - `API_PRODUCTION`: Enables HSTS and `Secure` cookies (default: false)
/// - `CORS_ORIGINS`: Comma-separated origins, `*` for any (default: `*`)
/// - `JWT_SECRET`: Session signing key, at least 32 characters (required)
/// - `SESSION_TTL_HOURS`: Session lifetime (default: 168)
/// - `GITHUB_TOKEN`: Token for the GitHub REST API (optional)
/// - `GITHUB_API_URL`: API base (default: https://api.github.com)
/// - `GITHUB_PR_LIMIT`: Pull requests per page (default: 5)
/// - `GITHUB_MERGE_TIMEOUT_MS`: Budget for merge-status checks (default: 3000)
/// - `OPENAI_API_KEY`: Key for the summary model (optional)
/// - `OPENAI_BASE_URL`: Chat-completions base (default: https://api.openai.com/v1)
/// - `OPENAI_MODEL`: Model name (default: gpt-4o)
/// - `OPENAI_TEMPERATURE`: Sampling temperature (default: 0.6)
/// - `ADMIN_TOKEN`: Shared secret for operator endpoints (optional)
/// - `LOG_FORMAT`: `json` for structured logs, anything else for text
///
/// # Example
///
/// ```no_run
/// use standup_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use standup_shared::{auth::jwt::DEFAULT_SESSION_TTL_HOURS, db::pool::DatabaseConfig};

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub github: GitHubConfig,
    pub openai: OpenAiConfig,

    /// Shared secret for `/v1/admin/*`; admin endpoints refuse everything
    /// when unset
    pub admin_token: Option<String>,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Production mode: HSTS header and `Secure` session cookies
    pub production: bool,

    /// Allowed CORS origins (`*` = any)
    pub cors_origins: Vec<String>,
}

/// Session token configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret key for session signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub pr_limit: u32,
    pub merge_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let session_ttl_hours: i64 = parse_or(&var, "SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        if session_ttl_hours <= 0 {
            anyhow::bail!("SESSION_TTL_HOURS must be positive");
        }

        let pr_limit: u32 = parse_or(&var, "GITHUB_PR_LIMIT", 5)?;
        if !(1..=100).contains(&pr_limit) {
            anyhow::bail!("GITHUB_PR_LIMIT must be between 1 and 100");
        }

        let temperature: f32 = parse_or(&var, "OPENAI_TEMPERATURE", 0.6)?;
        if !(0.0..=2.0).contains(&temperature) {
            anyhow::bail!("OPENAI_TEMPERATURE must be between 0 and 2");
        }

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&var, "API_PORT", 8080)?,
                production: parse_or(&var, "API_PRODUCTION", false)?,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10)?,
                ..Default::default()
            },
            session: SessionConfig {
                secret: jwt_secret,
                ttl_hours: session_ttl_hours,
            },
            github: GitHubConfig {
                token: var("GITHUB_TOKEN"),
                api_url: var("GITHUB_API_URL")
                    .unwrap_or_else(|| "https://api.github.com".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                pr_limit,
                merge_timeout: Duration::from_millis(parse_or(&var, "GITHUB_MERGE_TIMEOUT_MS", 3000)?),
            },
            openai: OpenAiConfig {
                api_key: var("OPENAI_API_KEY"),
                base_url: var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
                temperature,
            },
            admin_token: var("ADMIN_TOKEN"),
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Session lifetime in seconds, for the cookie `Max-Age`
    pub fn session_max_age_seconds(&self) -> i64 {
        self.session.ttl_hours * 3600
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}
