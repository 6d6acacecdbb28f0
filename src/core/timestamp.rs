//! Timestamp rendering for the `%d` pattern directive
//!
//! Event timestamps are UTC. Named formats follow the log4j names; any other
//! option is a chrono strftime string, validated when the pattern compiles.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// How `%d` renders an event timestamp
///
/// # Examples
///
/// ```
/// use hierarchical_logger::core::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::from_option("ABSOLUTE").unwrap().format(&at), "10:30:45,000");
/// assert_eq!(TimestampFormat::from_option("%Y/%m").unwrap().format(&at), "2025/01");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`, used by a bare `%d`
    #[default]
    Iso8601,
    /// `10:30:45,123`
    Absolute,
    /// `08 Jan 2025 10:30:45,123`
    Date,
    /// `2025-01-08T10:30:45.123+00:00`
    Rfc3339,
    /// Seconds since the epoch
    Unix,
    /// Milliseconds since the epoch
    UnixMillis,
    /// A validated strftime string
    Strftime(String),
}

impl TimestampFormat {
    /// Parse the option of a `%d{...}` directive
    ///
    /// Named formats match case-insensitively. Anything else must be a valid
    /// strftime string so that rendering never fails.
    pub fn from_option(option: &str) -> Result<Self> {
        let format = match option.trim().to_ascii_uppercase().as_str() {
            "" | "ISO8601" => TimestampFormat::Iso8601,
            "ABSOLUTE" => TimestampFormat::Absolute,
            "DATE" => TimestampFormat::Date,
            "RFC3339" => TimestampFormat::Rfc3339,
            "UNIX" => TimestampFormat::Unix,
            "UNIX_MILLIS" => TimestampFormat::UnixMillis,
            _ => {
                if StrftimeItems::new(option).any(|item| matches!(item, Item::Error)) {
                    return Err(LoggerError::pattern(
                        option,
                        "invalid strftime specifier in date format",
                    ));
                }
                TimestampFormat::Strftime(option.to_string())
            }
        };
        Ok(format)
    }

    /// Render `at` in this format
    #[must_use]
    pub fn format(&self, at: &DateTime<Utc>) -> String {
        let strftime = match self {
            TimestampFormat::Iso8601 => "%Y-%m-%dT%H:%M:%S%.3fZ",
            TimestampFormat::Absolute => "%H:%M:%S,%3f",
            TimestampFormat::Date => "%d %b %Y %H:%M:%S,%3f",
            TimestampFormat::Rfc3339 => {
                return at.to_rfc3339_opts(chrono::SecondsFormat::Millis, false)
            }
            TimestampFormat::Unix => return at.timestamp().to_string(),
            TimestampFormat::UnixMillis => return at.timestamp_millis().to_string(),
            TimestampFormat::Strftime(custom) => custom,
        };

        let mut out = String::with_capacity(32);
        match write!(out, "{}", at.format(strftime)) {
            Ok(()) => out,
            Err(_) => strftime.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123)
    }

    fn render(option: &str) -> String {
        TimestampFormat::from_option(option)
            .expect("valid format")
            .format(&fixed())
    }

    #[test]
    fn test_named_formats() {
        assert_eq!(render(""), "2025-01-08T10:30:45.123Z");
        assert_eq!(render("iso8601"), "2025-01-08T10:30:45.123Z");
        assert_eq!(render("ABSOLUTE"), "10:30:45,123");
        assert_eq!(render("DATE"), "08 Jan 2025 10:30:45,123");
        assert_eq!(render("RFC3339"), "2025-01-08T10:30:45.123+00:00");
        assert_eq!(render("UNIX"), "1736332245");
        assert_eq!(render("UNIX_MILLIS"), "1736332245123");
    }

    #[test]
    fn test_strftime_format() {
        assert_eq!(render("%d/%m/%Y %H:%M"), "08/01/2025 10:30");
        assert_eq!(render("literal"), "literal");
    }

    #[test]
    fn test_invalid_strftime_is_rejected() {
        let err = TimestampFormat::from_option("%Q").unwrap_err();
        assert!(err.to_string().contains("%Q"));
    }

    #[test]
    fn test_default_is_iso8601() {
        assert_eq!(TimestampFormat::default(), TimestampFormat::Iso8601);
    }
}
