use crate::utils::error::{ReminderError, Result};
use std::time::Duration;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ReminderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ReminderError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ReminderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(ReminderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| ReminderError::MissingConfigError {
            field: field_name.to_string(),
        })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReminderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ReminderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Rejects a missing or empty phone number before anything is sent. The
/// number itself is passed through untouched; the SMS provider judges it.
pub fn validate_phone_number(value: Option<&str>) -> Result<&str> {
    match value {
        Some(phone) if !phone.is_empty() => Ok(phone),
        _ => Err(ReminderError::invalid_input(
            "phone_number",
            "A phone number input is required.",
        )),
    }
}

/// Parses a string-encoded reminder interval in whole seconds.
pub fn parse_interval_seconds(field_name: &str, raw: &str) -> Result<Duration> {
    let seconds: u64 = raw.trim().parse().map_err(|_| {
        ReminderError::invalid_input(
            field_name,
            format!("'{}' is not a whole number of seconds", raw),
        )
    })?;

    if seconds == 0 {
        return Err(ReminderError::invalid_input(
            field_name,
            "Interval must be a positive number of seconds",
        ));
    }

    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("payment_link_base", "https://pay.example.com").is_ok());
        assert!(validate_url("payment_link_base", "http://localhost:8080").is_ok());
        assert!(validate_url("payment_link_base", "").is_err());
        assert!(validate_url("payment_link_base", "invalid-url").is_err());
        assert!(validate_url("payment_link_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("interval_seconds", 5, 1).is_ok());
        assert!(validate_positive_number("interval_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert_eq!(validate_phone_number(Some("+15551234567")).unwrap(), "+15551234567");
        assert!(matches!(
            validate_phone_number(Some("")),
            Err(ReminderError::InvalidInput { .. })
        ));
        // Only emptiness is checked here.
        assert_eq!(validate_phone_number(Some("   ")).unwrap(), "   ");
        assert!(matches!(
            validate_phone_number(None),
            Err(ReminderError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_parse_interval_seconds() {
        assert_eq!(
            parse_interval_seconds("notification_interval", "30").unwrap(),
            Duration::from_secs(30)
        );
        assert_eq!(
            parse_interval_seconds("notification_interval", " 45 ").unwrap(),
            Duration::from_secs(45)
        );
        assert!(parse_interval_seconds("notification_interval", "0").is_err());
        assert!(parse_interval_seconds("notification_interval", "-5").is_err());
        assert!(parse_interval_seconds("notification_interval", "soon").is_err());
        assert!(parse_interval_seconds("notification_interval", "1.5").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("AC123".to_string());
        let missing: Option<String> = None;
        assert_eq!(validate_required_field("account_sid", &present).unwrap(), "AC123");
        assert!(matches!(
            validate_required_field("account_sid", &missing),
            Err(ReminderError::MissingConfigError { .. })
        ));
    }
}
