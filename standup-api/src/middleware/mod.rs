/// Middleware modules for the API server
///
/// - `security`: Security and cache headers on every response
/// - `session`: Session resolution for protected and public routes

pub mod security;
pub mod session;
