//! Field validation for signup and login input
//!
//! Each validator returns the first rule the value breaks; the message is
//! what clients see.

use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Lazy-loaded email validation regex
///
/// A practical subset of RFC 5322, compiled once and reused.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

static FULL_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z\s'-]+$").expect("Invalid full name regex pattern")
});

const MAX_EMAIL_LENGTH: usize = 255;
const MIN_FULL_NAME_LENGTH: usize = 2;
const MAX_FULL_NAME_LENGTH: usize = 255;
const MIN_PASSWORD_LENGTH: usize = 8;

/// Validates an email address
///
/// # Examples
///
/// ```rust
/// use franchise_core::validation::validate_email;
///
/// assert!(validate_email("owner@example.com").is_ok());
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address".to_string(),
        ));
    }

    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    Ok(())
}

/// Validates a new password against the signup strength rules
///
/// # Password Requirements
///
/// - Minimum 8 characters
/// - At least one lowercase letter, one uppercase letter and one digit
/// - At least one character that is not an ASCII letter or digit
///
/// ```rust
/// use franchise_core::validation::validate_password;
///
/// assert!(validate_password("Abc12345!").is_ok());
/// assert!(validate_password("abc12345").is_err());
/// ```
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one number".to_string(),
        ));
    }

    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one special character".to_string(),
        ));
    }

    Ok(())
}

/// Validates the confirmation field against the chosen password
pub fn validate_password_confirmation(
    password: &str,
    confirmation: &str,
) -> Result<(), ValidationError> {
    if confirmation.is_empty() {
        return Err(ValidationError::MissingField(
            "Please confirm your password".to_string(),
        ));
    }

    if password != confirmation {
        return Err(ValidationError::InvalidPassword(
            "Passwords do not match".to_string(),
        ));
    }

    Ok(())
}

/// Validates a person's full name
///
/// # Name Requirements
///
/// - Between 2 and 255 characters
/// - Letters, whitespace, hyphens and apostrophes only
pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.trim().is_empty() {
        return Err(ValidationError::MissingField(
            "Full name is required".to_string(),
        ));
    }

    let length = full_name.chars().count();
    if length < MIN_FULL_NAME_LENGTH {
        return Err(ValidationError::InvalidName(
            "Full name must be at least 2 characters".to_string(),
        ));
    }

    if length > MAX_FULL_NAME_LENGTH {
        return Err(ValidationError::InvalidName(
            "Full name is too long".to_string(),
        ));
    }

    if !FULL_NAME_REGEX.is_match(full_name) {
        return Err(ValidationError::InvalidName(
            "Full name can only contain letters, spaces, hyphens, and apostrophes".to_string(),
        ));
    }

    Ok(())
}

/// Validates that an invitation code was supplied
pub fn validate_invitation_code_input(code: &str) -> Result<(), ValidationError> {
    if code.trim().is_empty() {
        return Err(ValidationError::MissingField(
            "Invitation code is required".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<(), ValidationError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("owner@example.com").is_ok());
        assert!(validate_email("test.email+tag@domain.co.uk").is_ok());
        assert!(validate_email("Owner@Example.COM").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert_eq!(message(validate_email("")), "Email is required");
        assert_eq!(message(validate_email("invalid-email")), "Invalid email address");
        assert!(validate_email("@domain.com").is_err());
        assert!(validate_email("user@domain").is_err());

        let long_email = format!("{}@example.com", "a".repeat(250));
        assert_eq!(message(validate_email(&long_email)), "Email is too long");
    }

    #[test]
    fn test_validate_password_valid() {
        assert!(validate_password("Abc12345!").is_ok());
        assert!(validate_password("Correct-Horse-9").is_ok());
    }

    #[test]
    fn test_validate_password_rules_in_order() {
        assert_eq!(message(validate_password("")), "Password is required");
        assert_eq!(
            message(validate_password("Ab1!")),
            "Password must be at least 8 characters"
        );
        assert_eq!(
            message(validate_password("ABC12345!")),
            "Password must contain at least one lowercase letter"
        );
        assert_eq!(
            message(validate_password("abc12345!")),
            "Password must contain at least one uppercase letter"
        );
        assert_eq!(
            message(validate_password("Abcdefgh!")),
            "Password must contain at least one number"
        );
        assert_eq!(
            message(validate_password("Abc123456")),
            "Password must contain at least one special character"
        );
    }

    #[test]
    fn test_validate_password_confirmation() {
        assert!(validate_password_confirmation("Abc12345!", "Abc12345!").is_ok());
        assert_eq!(
            message(validate_password_confirmation("Abc12345!", "")),
            "Please confirm your password"
        );
        assert_eq!(
            message(validate_password_confirmation("Abc12345!", "Abc12345?")),
            "Passwords do not match"
        );
    }

    #[test]
    fn test_validate_full_name() {
        assert!(validate_full_name("Maria Santos").is_ok());
        assert!(validate_full_name("Anne-Marie O'Neil").is_ok());

        assert_eq!(message(validate_full_name("  ")), "Full name is required");
        assert_eq!(
            message(validate_full_name("M")),
            "Full name must be at least 2 characters"
        );
        assert_eq!(
            message(validate_full_name(&"a".repeat(256))),
            "Full name is too long"
        );
        assert_eq!(
            message(validate_full_name("R2-D2")),
            "Full name can only contain letters, spaces, hyphens, and apostrophes"
        );
    }

    #[test]
    fn test_validate_invitation_code_input() {
        assert!(validate_invitation_code_input("WELCOME-2024").is_ok());
        assert_eq!(
            message(validate_invitation_code_input("")),
            "Invitation code is required"
        );
    }
}
