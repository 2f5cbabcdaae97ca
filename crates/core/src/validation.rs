//! Input validation utilities.
//!
//! This module contains the checks applied to user-supplied strings: the configuration
//! namespace, and the per-type format rules for non-empty form values.

use crate::schema::FieldKind;
use crate::{ClinicError, ClinicResult};
use chrono::{NaiveDate, NaiveTime};

/// Validates that a configuration namespace is safe to embed in a file name.
///
/// The namespace prefixes every persisted configuration key (`{namespace}.{kind}`), and the file
/// store uses that key as a file name. This function:
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Restricts characters to a conservative ASCII set
/// - Rejects leading dots so the key cannot name a hidden or parent directory
///
/// # Errors
///
/// Returns a `ClinicError::InvalidInput` if the namespace is invalid.
pub fn validate_config_namespace(namespace: &str) -> ClinicResult<()> {
    const MAX_NAMESPACE_LEN: usize = 128;

    if namespace.trim().is_empty() {
        return Err(ClinicError::InvalidInput(
            "namespace cannot be empty".into(),
        ));
    }

    if namespace.len() > MAX_NAMESPACE_LEN {
        return Err(ClinicError::InvalidInput(format!(
            "namespace exceeds maximum length of {} characters",
            MAX_NAMESPACE_LEN
        )));
    }

    if !namespace.is_ascii() {
        return Err(ClinicError::InvalidInput(
            "namespace must contain only ASCII characters".into(),
        ));
    }

    if namespace.starts_with('.') {
        return Err(ClinicError::InvalidInput(
            "namespace must not start with '.'".into(),
        ));
    }

    let ok = namespace
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));

    if !ok {
        return Err(ClinicError::InvalidInput(
            "namespace contains invalid characters (only alphanumeric, '.', '-', '_' allowed)"
                .into(),
        ));
    }

    Ok(())
}

/// Parses a time of day in `HH:MM` or `HH:MM:SS` form.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Checks a non-empty value against the format its field kind requires.
///
/// Returns the human-readable reason on failure. Presence is not checked here; blank values are
/// the mandatory-field rule's concern.
pub fn check_field_value(kind: &FieldKind, value: &str) -> Result<(), &'static str> {
    let value = value.trim();
    match kind {
        FieldKind::Text | FieldKind::Textarea => Ok(()),
        FieldKind::Number => match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(()),
            _ => Err("must be a number"),
        },
        FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| "must be a date in YYYY-MM-DD format"),
        FieldKind::Time => parse_time_of_day(value)
            .map(|_| ())
            .ok_or("must be a time in HH:MM format"),
        FieldKind::Select { options } => {
            if options.iter().any(|option| *option == value) {
                Ok(())
            } else {
                Err("must be one of the listed options")
            }
        }
        FieldKind::Email => {
            if looks_like_email(value) {
                Ok(())
            } else {
                Err("must be a valid email address")
            }
        }
        FieldKind::Tel => {
            if looks_like_phone_number(value) {
                Ok(())
            } else {
                Err("must be a valid phone number")
            }
        }
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn looks_like_phone_number(value: &str) -> bool {
    const MIN_DIGITS: usize = 7;

    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    allowed && value.chars().filter(char::is_ascii_digit).count() >= MIN_DIGITS
}
