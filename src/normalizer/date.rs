use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::ambiguous;

const ZONED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%b. %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
];

/// Normalize a posting date to RFC 3339 in UTC with second precision
///
/// Accepts ISO-8601 (with or without offset or time) and common US/English
/// human-readable forms. Date-only inputs resolve to midnight UTC. Applying the
/// function to its own output returns the output unchanged.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = parse_utc(trimmed);
    if parsed.is_none() {
        ambiguous("posted_date", trimmed);
    }
    parsed.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn parse_utc(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_inputs() {
        assert_eq!(
            normalize_date("2025-10-06").as_deref(),
            Some("2025-10-06T00:00:00Z")
        );
        assert_eq!(
            normalize_date("2025-10-06T14:30:00-04:00").as_deref(),
            Some("2025-10-06T18:30:00Z")
        );
        assert_eq!(
            normalize_date("2025-10-06T14:30:00.250Z").as_deref(),
            Some("2025-10-06T14:30:00Z")
        );
        assert_eq!(
            normalize_date("2025-10-06T14:30:00").as_deref(),
            Some("2025-10-06T14:30:00Z")
        );
    }

    #[test]
    fn human_readable_inputs() {
        for raw in ["10/06/2025", "October 6, 2025", "Oct 6, 2025", "6 October 2025", " 2025/10/06 "] {
            assert_eq!(
                normalize_date(raw).as_deref(),
                Some("2025-10-06T00:00:00Z"),
                "input {raw:?}"
            );
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["2025-10-06", "Oct 6, 2025", "2025-10-06T14:30:00+05:30"] {
            let once = normalize_date(raw).unwrap();
            assert_eq!(normalize_date(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn unrecognized_is_not_found() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("   "), None);
        assert_eq!(normalize_date("last Tuesday"), None);
        assert_eq!(normalize_date("2025-13-45"), None);
    }
}
