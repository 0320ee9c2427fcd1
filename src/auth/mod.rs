//! Admin password verification.
//!
//! Implements constant-time comparison to mitigate timing attacks. This is the
//! whole extent of server-side authentication: the admin/guest gate itself
//! lives in the client, and no route is gated on the outcome.

use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Check a password attempt against the configured admin password.
///
/// An unconfigured password always fails verification.
pub fn verify_admin_password(
    configured: Option<&str>,
    provided: &str,
) -> Result<(), AppError> {
    let Some(expected) = configured else {
        tracing::error!("Admin password not configured. Set BLOG_ADMIN_PASSWORD to enable authoring.");
        return Err(AppError::Unauthorized(
            "Admin password is not configured".to_string(),
        ));
    };

    if constant_time_compare(provided, expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid admin password".to_string()))
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // Constant-time comparison
    a_bytes.ct_eq(b_bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_verify_rejects_when_unconfigured() {
        let err = verify_admin_password(None, "anything").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_verify_accepts_configured_password() {
        assert!(verify_admin_password(Some("hunter2"), "hunter2").is_ok());
        assert!(verify_admin_password(Some("hunter2"), "hunter3").is_err());
    }
}
