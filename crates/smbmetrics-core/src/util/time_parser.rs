//! Timestamp parser for `smbstatus` output.
//!
//! Samba prints times differently depending on release and output mode:
//! - JSON: `2023-06-14T10:01:01.567711+00:00`, header `2023-06-14T10:01:05.138433+0000`
//! - ANSI C (lock table): `Wed Jun 14 10:01:02 2023`
//! - Unix date: `Wed Jun 14 10:01:02 UTC 2023`
//! - Share table: `Wed Jun 14 10:01:02 AM 2023 UTC`
//!
//! Zone names other than `UTC`/`GMT` cannot be resolved to an offset and are
//! rejected.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Error type for time parsing failures.
#[derive(Debug, Clone)]
pub struct TimeParseError {
    pub input: String,
}

impl std::fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown time format '{}'", self.input)
    }
}

impl std::error::Error for TimeParseError {}

const OFFSET_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_LAYOUTS: &[&str] = &[
    // ANSI C
    "%a %b %e %H:%M:%S %Y",
    // 12-hour clock, as in `smbstatus -S`
    "%a %b %e %I:%M:%S %p %Y",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a timestamp printed by `smbstatus` into UTC.
///
/// # Examples
///
/// ```
/// use smbmetrics_core::util::parse_time;
///
/// let t = parse_time("Wed Jun 14 10:01:02 2023").unwrap();
/// assert_eq!(t.timestamp(), 1686736862);
/// ```
pub fn parse_time(input: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(input, layout) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    let naive = strip_utc_zone(input);
    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&naive, layout) {
            return Ok(dt.and_utc());
        }
    }

    Err(TimeParseError {
        input: input.to_string(),
    })
}

/// Drops a `UTC`/`GMT` zone word wherever it appears.
fn strip_utc_zone(input: &str) -> String {
    input
        .split_whitespace()
        .filter(|w| *w != "UTC" && *w != "GMT")
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED: i64 = 1686736862; // 2023-06-14 10:01:02 UTC

    #[test]
    fn test_rfc3339() {
        let t = parse_time("2023-06-14T10:01:02.567711+00:00").unwrap();
        assert_eq!(t.timestamp(), EXPECTED);
        let t = parse_time("2023-06-14T12:01:02+02:00").unwrap();
        assert_eq!(t.timestamp(), EXPECTED);
    }

    #[test]
    fn test_compact_offset() {
        let t = parse_time("2023-06-14T10:01:02.138433+0000").unwrap();
        assert_eq!(t.timestamp(), EXPECTED);
    }

    #[test]
    fn test_ansi_c() {
        assert_eq!(parse_time("Wed Jun 14 10:01:02 2023").unwrap().timestamp(), EXPECTED);
        let t = parse_time("Sat Jul  1 09:00:00 2023").unwrap();
        assert_eq!(t.timestamp(), 1688202000);
    }

    #[test]
    fn test_unix_date() {
        let t = parse_time("Wed Jun 14 10:01:02 UTC 2023").unwrap();
        assert_eq!(t.timestamp(), EXPECTED);
    }

    #[test]
    fn test_share_table_layout() {
        let t = parse_time("Wed Jun 14 10:01:02 AM 2023 UTC").unwrap();
        assert_eq!(t.timestamp(), EXPECTED);
        let t = parse_time("Wed Jun 14 10:01:02 PM 2023 UTC").unwrap();
        assert_eq!(t.timestamp(), EXPECTED + 12 * 3600);
    }

    #[test]
    fn test_unknown() {
        assert!(parse_time("").is_err());
        assert!(parse_time("yesterday").is_err());
        let err = parse_time("Wed Jun 14 10:01:02 CEST 2023").unwrap_err();
        assert!(err.to_string().contains("CEST"));
    }
}
