/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the account password policy
/// - [`jwt`]: Session token generation and validation
/// - [`middleware`]: Session extraction from cookies and bearer headers
/// - [`admin_token`]: Shared-secret checks for operator endpoints

pub mod admin_token;
pub mod jwt;
pub mod middleware;
pub mod password;
