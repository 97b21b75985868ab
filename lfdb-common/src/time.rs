//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Timestamp `days` days before now
pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

/// Parse an RFC 3339 timestamp as returned by Google APIs
///
/// Returns `None` for empty or malformed input.
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // After 2000-01-01, before 2100-01-01
        assert!(timestamp.timestamp() > 946_684_800);
        assert!(timestamp.timestamp() < 4_102_444_800);
    }

    #[test]
    fn test_days_ago_is_in_the_past() {
        let year_ago = days_ago(365);
        let diff = now() - year_ago;
        assert!(diff.num_days() >= 364 && diff.num_days() <= 365);
    }

    #[test]
    fn test_parse_rfc3339_zulu() {
        let parsed = parse_rfc3339("2024-03-05T10:15:30Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T10:15:30+00:00");
    }

    #[test]
    fn test_parse_rfc3339_offset_is_normalized() {
        let parsed = parse_rfc3339("2024-03-05T12:15:30+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T10:15:30+00:00");
    }

    #[test]
    fn test_parse_rfc3339_rejects_garbage() {
        assert!(parse_rfc3339("").is_none());
        assert!(parse_rfc3339("yesterday").is_none());
    }
}
