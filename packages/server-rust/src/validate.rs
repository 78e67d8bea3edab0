//! Request-body validation producing field-to-reason detail maps.
//!
//! The map is a `BTreeMap` so the serialized detail order is stable
//! across runs.

use std::collections::BTreeMap;

use crate::error::ApiError;

/// Validates the shared credential body shape (`{email, password}`).
///
/// # Errors
///
/// Returns a validation error carrying one reason per failing field.
pub fn credentials(email: &str, password: &str) -> Result<(), ApiError> {
    let mut details = BTreeMap::new();
    if email.trim().is_empty() {
        details.insert("email".to_string(), "must not be empty".to_string());
    } else if !is_email(email.trim()) {
        details.insert(
            "email".to_string(),
            "must be a valid email address".to_string(),
        );
    }
    if password.is_empty() {
        details.insert("password".to_string(), "must not be empty".to_string());
    }
    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::invalid_request_with_details(details))
    }
}

/// Minimal structural email check: one `@`, non-empty local part, and a
/// dot-bearing domain that neither starts nor ends with a dot.
fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
        && !domain.contains(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_credentials_pass() {
        assert!(credentials("a@b.com", "Password123!").is_ok());
        assert!(credentials("first.last@sub.example.org", "x").is_ok());
    }

    #[test]
    fn empty_fields_are_reported_per_field() {
        let err = credentials("", "").unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details.get("email").unwrap(), "must not be empty");
        assert_eq!(details.get("password").unwrap(), "must not be empty");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["plain", "@b.com", "a@b", "a@.com", "a@b.com.", "a@b@c.com", "a@b .com"] {
            let err = credentials(email, "x").unwrap_err();
            let details = err.details.unwrap();
            assert_eq!(
                details.get("email").unwrap(),
                "must be a valid email address",
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn only_failing_fields_appear_in_details() {
        let err = credentials("not-an-email", "x").unwrap_err();
        let details = err.details.unwrap();
        assert!(details.contains_key("email"));
        assert!(!details.contains_key("password"));
    }
}
