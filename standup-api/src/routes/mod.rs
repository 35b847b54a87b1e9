/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Sign-up, sign-in and sign-out
/// - `admin`: Operator endpoints behind the admin token
/// - `home`: Greeting and quick-start checklist
/// - `standups`: The caller's notes and public per-user feeds
/// - `users`: Team directory
/// - `profile`: Profile editor
/// - `summaries`: Aggregated notes across selected teammates
/// - `ai_summary`: AI-written summary of one day
/// - `github`: Pull request view and its settings

pub mod admin;
pub mod ai_summary;
pub mod auth;
pub mod github;
pub mod health;
pub mod home;
pub mod profile;
pub mod standups;
pub mod summaries;
pub mod users;
