/// Admin token checks
///
/// Operator endpoints (creating accounts, resetting passwords) are guarded by
/// a single shared token sent in the `x-admin-token` header. Both sides are
/// hashed with SHA-256 before a constant-time comparison so neither the
/// length nor a matching prefix of the configured token leaks through timing.

use sha2::{Digest, Sha256};

/// Header carrying the admin token
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Hex-encoded SHA-256 of a token
///
/// ```
/// use standup_shared::auth::admin_token::hash_token;
///
/// assert_eq!(hash_token("abc").len(), 64);
/// assert_eq!(hash_token("abc"), hash_token("abc"));
/// ```
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares two strings without short-circuiting on the first difference
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Checks a presented token against the configured one
///
/// When no token is configured (or it is blank) every request is refused.
pub fn verify_admin_token(presented: Option<&str>, configured: Option<&str>) -> bool {
    let Some(configured) = configured.filter(|t| !t.is_empty()) else {
        return false;
    };
    let Some(presented) = presented else {
        return false;
    };

    constant_time_compare(&hash_token(presented), &hash_token(configured))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hello2"));
        assert!(!constant_time_compare("short", "longer string"));
    }

    #[test]
    fn test_verify_admin_token() {
        assert!(verify_admin_token(Some("s3cret"), Some("s3cret")));
        assert!(!verify_admin_token(Some("guess"), Some("s3cret")));
        assert!(!verify_admin_token(None, Some("s3cret")));
    }

    #[test]
    fn test_unconfigured_token_refuses_everything() {
        assert!(!verify_admin_token(Some(""), Some("")));
        assert!(!verify_admin_token(Some("anything"), None));
    }
}
