// ============================================================================
// FORM VALIDATION - runs before any request is built
// ============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::error::{ApiError, Result};
use crate::utils::constants::{BASIC_MIN_PASSWORD_LENGTH, MFA_CODE_LENGTH, MIN_PASSWORD_LENGTH};

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
            .expect("email pattern compiles");
}

pub fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<()> {
    required("Email", value)?;
    if !EMAIL_RE.is_match(value.trim()) {
        return Err(ApiError::Validation("Enter a valid email address".to_string()));
    }
    Ok(())
}

/// Password rules differ per form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub letter_and_digit: bool,
}

impl PasswordPolicy {
    /// Registration and PSP password changes
    pub const STRONG: PasswordPolicy = PasswordPolicy {
        min_length: MIN_PASSWORD_LENGTH,
        letter_and_digit: true,
    };

    /// Web-shop password change
    pub const BASIC: PasswordPolicy = PasswordPolicy {
        min_length: BASIC_MIN_PASSWORD_LENGTH,
        letter_and_digit: false,
    };

    pub fn check(&self, value: &str) -> Result<()> {
        required("Password", value)?;
        if value.chars().count() < self.min_length {
            return Err(ApiError::Validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }
        if self.letter_and_digit {
            let has_letter = value.chars().any(|c| c.is_alphabetic());
            let has_digit = value.chars().any(|c| c.is_ascii_digit());
            if !has_letter || !has_digit {
                return Err(ApiError::Validation(
                    "Password must contain at least one letter and one digit".to_string(),
                ));
            }
        }
        Ok(())
    }
}

pub fn passwords_match(password: &str, confirmation: &str) -> Result<()> {
    if password != confirmation {
        return Err(ApiError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}

pub fn mfa_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() != MFA_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::Validation(
            "Enter the 6-digit code you received by email".to_string(),
        ));
    }
    Ok(code.to_string())
}

/// Parses a date input value. A bare `YYYY-MM-DD` is pinned to 10:00 UTC.
pub fn parse_rental_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let at_ten = date
            .and_hms_opt(10, 0, 0)
            .ok_or_else(|| ApiError::Validation("Invalid date".to_string()))?;
        return Ok(Utc.from_utc_datetime(&at_ten));
    }
    if let Ok(moment) = DateTime::parse_from_rfc3339(value) {
        return Ok(moment.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| ApiError::Validation(format!("Invalid date: {}", value)))
}

/// End must be strictly after start
pub fn date_range(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if start.trim().is_empty() || end.trim().is_empty() {
        return Err(ApiError::Validation(
            "Please select start and end dates".to_string(),
        ));
    }
    let start = parse_rental_date(start)?;
    let end = parse_rental_date(end)?;
    if end <= start {
        return Err(ApiError::Validation(
            "End date must be after the start date".to_string(),
        ));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_syntax() {
        assert!(email("ana.petrovic@example.rs").is_ok());
        assert!(email("  ").is_err());
        assert!(email("not-an-email").is_err());
        assert!(email("a@b@c").is_err());
    }

    #[test]
    fn strong_policy_requires_length_letter_and_digit() {
        let strong = PasswordPolicy::STRONG;
        assert!(strong.check("short1").is_err());
        assert!(strong.check("onlyletterslong").is_err());
        assert!(strong.check("123456789012").is_err());
        assert!(strong.check("correcthorse42").is_ok());
    }

    #[test]
    fn basic_policy_only_checks_length() {
        let basic = PasswordPolicy::BASIC;
        assert!(basic.check("seven77").is_err());
        assert!(basic.check("eightchr").is_ok());
        assert!(basic.check("").is_err());
    }

    #[test]
    fn mfa_code_is_six_digits() {
        assert_eq!(mfa_code(" 123456 ").unwrap(), "123456");
        assert!(mfa_code("12345").is_err());
        assert!(mfa_code("12345a").is_err());
    }

    #[test]
    fn bare_dates_are_pinned_to_ten_utc() {
        let parsed = parse_rental_date("2026-07-01").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-07-01T10:00:00+00:00");
    }

    #[test]
    fn date_range_rejects_non_increasing_ranges() {
        assert!(date_range("2026-07-01", "2026-07-01").is_err());
        assert!(date_range("2026-07-02", "2026-07-01").is_err());
        assert!(date_range("", "2026-07-01").is_err());
        let (start, end) = date_range("2026-07-01", "2026-07-04").unwrap();
        assert!(end > start);
    }
}
