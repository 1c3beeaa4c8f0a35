//! Input validation for API requests.
//!
//! Field validators return `Result<_, String>` with a human-readable message;
//! handlers collect them with `ValidationErrorBuilder` from the `error` module.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Pragmatic email check: something@something.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^\s@]+@[^\s@]+\.[^\s@]+$"
    ).unwrap();
}

/// Minimum password length for new accounts
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Trimmed value of an optional text field, or None when absent or blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

/// Validate a new account password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    if password.len() > 1024 {
        return Err("Password is too long".to_string());
    }
    Ok(())
}

/// Parse a booking date. Accepts a plain `YYYY-MM-DD` date or a combined date-time
/// (RFC 3339 or naive ISO 8601); only the date portion, as written, is kept.
pub fn parse_booking_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local().date());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date());
        }
    }

    Err("Invalid date. Use YYYY-MM-DD".to_string())
}

/// Parse a booking time in 24-hour (`14:30`, `14:30:00`) or 12-hour (`2:30 PM`) form.
pub fn parse_booking_time(value: &str) -> Result<NaiveTime, String> {
    let value = value.trim();

    for format in ["%H:%M", "%H:%M:%S"] {
        if let Ok(time) = NaiveTime::parse_from_str(value, format) {
            return Ok(time);
        }
    }

    let upper = value.to_uppercase();
    for format in ["%I:%M %p", "%I:%M%p"] {
        if let Ok(time) = NaiveTime::parse_from_str(&upper, format) {
            return Ok(time);
        }
    }

    Err("Invalid time. Use HH:MM".to_string())
}

/// Validate a payment amount in major currency units
pub fn validate_amount(amount: f64) -> Result<(), String> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err("Amount must be greater than zero".to_string());
    }
    if amount > 1_000_000.0 {
        return Err("Amount is too large".to_string());
    }
    Ok(())
}

/// Validate a profile age
pub fn validate_age(age: Option<i64>) -> Result<(), String> {
    match age {
        Some(age) if !(0..=150).contains(&age) => Err("Age must be between 0 and 150".to_string()),
        _ => Ok(()),
    }
}
