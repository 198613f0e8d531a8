//! Parsing helpers for multipart form fields.
//!
//! Multipart values arrive as text; these map them onto the typed columns
//! with per-field error messages.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::error::ApiError;

pub fn parse_decimal(field: &str, value: &str) -> Result<Decimal, ApiError> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| ApiError::InvalidRequest(format!("{field} must be a decimal number.")))
}

pub fn parse_i32(field: &str, value: &str) -> Result<i32, ApiError> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| ApiError::InvalidRequest(format!("{field} must be an integer.")))
}

pub fn parse_bool(field: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(ApiError::InvalidRequest(format!("{field} must be a boolean."))),
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_datetime(field: &str, value: &str) -> Result<DateTime<Utc>, ApiError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }
    Err(ApiError::InvalidRequest(format!(
        "{field} must be an RFC 3339 timestamp or a YYYY-MM-DD date."
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("price", " 19.99 ").unwrap(), Decimal::new(1999, 2));
        assert!(parse_decimal("price", "abc").is_err());
    }

    #[test]
    fn test_parse_bool_variants() {
        assert!(parse_bool("onSale", "true").unwrap());
        assert!(parse_bool("onSale", "1").unwrap());
        assert!(!parse_bool("onSale", "FALSE").unwrap());
        assert!(!parse_bool("onSale", "0").unwrap());
        assert!(parse_bool("onSale", "maybe").is_err());
    }

    #[test]
    fn test_parse_datetime_rfc3339_and_date() {
        let ts = parse_datetime("startsAt", "2025-06-01T10:30:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-06-01T10:30:00+00:00");

        let midnight = parse_datetime("startsAt", "2025-06-01").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2025-06-01T00:00:00+00:00");

        assert!(parse_datetime("startsAt", "June 1st").is_err());
    }

    #[test]
    fn test_parse_i32() {
        assert_eq!(parse_i32("stockQuantity", "42").unwrap(), 42);
        assert!(parse_i32("stockQuantity", "4.2").is_err());
    }
}
