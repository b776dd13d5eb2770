//! Common validation utilities.
//!
//! Functions here plug into `#[validate(custom(function = ...))]`.

use validator::ValidationError;

/// Largest capacity accepted for a single event.
pub const MAX_EVENT_CAPACITY: i32 = 100_000;

/// Rejects strings that are empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that an event capacity is a positive, sane number.
pub fn validate_capacity(capacity: i32) -> Result<(), ValidationError> {
    if (1..=MAX_EVENT_CAPACITY).contains(&capacity) {
        Ok(())
    } else {
        let mut err = ValidationError::new("capacity_range");
        err.message = Some(format!("Capacity must be between 1 and {}", MAX_EVENT_CAPACITY).into());
        Err(err)
    }
}

/// Returns true when `email` belongs to `domain` (case-insensitive).
///
/// Subdomains do not match: `a@cs.umib.net` is not in `umib.net`.
pub fn email_has_domain(email: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('@');
    match email.rsplit_once('@') {
        Some((local, host)) => !local.is_empty() && host.eq_ignore_ascii_case(domain),
        None => false,
    }
}

/// Lower-cases and trims an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("Hackathon").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \t").is_err());
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(validate_capacity(1).is_ok());
        assert!(validate_capacity(MAX_EVENT_CAPACITY).is_ok());
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(-3).is_err());
        assert!(validate_capacity(MAX_EVENT_CAPACITY + 1).is_err());
    }

    #[test]
    fn test_capacity_error_message() {
        let err = validate_capacity(0).unwrap_err();
        assert_eq!(err.code, "capacity_range");
        assert!(err.message.unwrap().contains("between 1"));
    }

    #[test]
    fn test_email_has_domain() {
        assert!(email_has_domain("filan.fisteku@umib.net", "umib.net"));
        assert!(email_has_domain("Filan@UMIB.NET", "umib.net"));
        assert!(email_has_domain("filan@umib.net", "@umib.net"));
        assert!(!email_has_domain("filan@gmail.com", "umib.net"));
        assert!(!email_has_domain("filan@cs.umib.net", "umib.net"));
        assert!(!email_has_domain("umib.net", "umib.net"));
        assert!(!email_has_domain("@umib.net", "umib.net"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Student@UMIB.net "), "student@umib.net");
    }
}
