use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, AppResult};

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed and lowercased; the form stored and looked up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns the trimmed value, or a validation error naming `field`.
pub fn required<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// `None` for absent or blank values.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let t = v.trim();
        (!t.is_empty()).then(|| t.to_string())
    })
}

pub fn percent(field: &str, value: f64) -> AppResult<f64> {
    if !(0.0..=100.0).contains(&value) {
        return Err(AppError::validation(format!("{field} must be between 0 and 100")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization_trims_and_lowercases() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("a@b"));
    }

    #[test]
    fn blank_inputs_are_treated_as_absent() {
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" x ".into())), Some("x".into()));
        assert_eq!(non_blank(None), None);
        assert!(required("full_name", " ").is_err());
        assert_eq!(required("full_name", " Ann ").unwrap(), "Ann");
    }

    #[test]
    fn percent_bounds_are_inclusive() {
        assert!(percent("progress", 0.0).is_ok());
        assert!(percent("progress", 100.0).is_ok());
        assert!(percent("progress", 100.5).is_err());
        assert!(percent("progress", -1.0).is_err());
    }
}
