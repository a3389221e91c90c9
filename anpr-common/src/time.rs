//! Facility-local timestamp utilities
//!
//! All entry/exit events are recorded in Indian Standard Time regardless of
//! the server's locale. IST is a fixed +05:30 offset with no daylight
//! saving, so a `FixedOffset` represents it exactly.

use chrono::{DateTime, FixedOffset, Utc};

/// Seconds east of UTC for Indian Standard Time (+05:30)
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The facility time zone (IST, +05:30)
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is in range")
}

/// Get the current timestamp in facility-local time (IST)
pub fn now_ist() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&ist())
}

/// Format a facility-local timestamp as ISO-8601 / RFC 3339 with offset
///
/// This is the canonical form used both in storage and in operator-facing
/// messages (e.g. `2025-07-01T12:34:56.123456+05:30`).
pub fn format_ist(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_ist_offset_is_five_thirty() {
        assert_eq!(ist().local_minus_utc(), 19800);
    }

    #[test]
    fn test_now_ist_returns_valid_timestamp() {
        let timestamp = now_ist();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }

    #[test]
    fn test_now_ist_carries_facility_offset() {
        let timestamp = now_ist();
        assert_eq!(timestamp.offset().local_minus_utc(), 19800);
    }

    #[test]
    fn test_format_includes_offset() {
        let formatted = format_ist(&now_ist());
        assert!(formatted.ends_with("+05:30"), "got: {}", formatted);
    }

    #[test]
    fn test_format_round_trips() {
        let timestamp = now_ist();
        let parsed = DateTime::parse_from_rfc3339(&format_ist(&timestamp))
            .expect("canonical form must parse");
        assert_eq!(parsed, timestamp);
        assert_eq!(parsed.offset().local_minus_utc(), 19800);
    }

    #[test]
    fn test_ist_wall_clock_leads_utc() {
        let utc = Utc::now();
        let local = utc.with_timezone(&ist());
        // Same instant, wall clock shifted by 5h30m
        assert_eq!(local.timestamp(), utc.timestamp());
        let utc_minutes = utc.hour() * 60 + utc.minute();
        let ist_minutes = local.hour() * 60 + local.minute();
        assert_eq!((ist_minutes + 24 * 60 - utc_minutes) % (24 * 60), 330);
    }
}
