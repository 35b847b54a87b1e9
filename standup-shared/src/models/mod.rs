/// Database models for Standup
///
/// # Models
///
/// - `user`: Accounts and sign-in credentials
/// - `profile`: What teammates see, plus per-user settings
/// - `standup`: Daily notes, one per user per day
///
/// # Example
///
/// ```no_run
/// use standup_shared::models::user::{User, CreateUser};
/// use standup_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     display_name: Some("Ada Lovelace".to_string()),
///     username: Some("ada".to_string()),
/// };
///
/// let (user, profile) = User::register(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod profile;
pub mod standup;
pub mod user;
