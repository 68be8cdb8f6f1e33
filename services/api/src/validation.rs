//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ApiError;

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required".to_string()));
    }

    if name.len() > 128 {
        return Err(ApiError::Validation(
            "Name must be at most 128 characters long".to_string(),
        ));
    }

    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::Validation("Email is required".to_string()));
    }

    if email.len() > 254 {
        return Err(ApiError::Validation(
            "Email must be at most 254 characters long".to_string(),
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    Ok(())
}

/// Reject an invitation addressed to the owner's own email
pub fn validate_not_self_invitation(owner_email: &str, invitee_email: &str) -> Result<(), ApiError> {
    if owner_email.eq_ignore_ascii_case(invitee_email.trim()) {
        return Err(ApiError::Validation(
            "You cannot invite yourself".to_string(),
        ));
    }

    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(ApiError::Validation(
            "Password must be at most 128 characters long".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Ada Lovelace").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("nominee@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn test_self_invitation_rejected() {
        let err = validate_not_self_invitation("owner@example.com", "Owner@Example.com")
            .expect_err("self-invitation must be rejected");
        assert!(matches!(err, ApiError::Validation(_)));

        assert!(validate_not_self_invitation("owner@example.com", "nominee@example.com").is_ok());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("long-enough-secret").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("").is_err());
    }
}
