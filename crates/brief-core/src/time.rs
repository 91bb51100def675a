//! Timestamp encoding.
//!
//! Every persisted timestamp is UTC RFC 3339 with exactly six fractional
//! digits and a `Z` suffix (`2024-01-15T12:00:00.000000Z`). The fixed width
//! makes lexical comparison in SQL equal to chronological comparison, which
//! the event log relies on for `(created_at, id)` ordering.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC time truncated to microsecond precision.
///
/// Truncation keeps in-memory values identical to what a store round-trip
/// returns.
pub fn now() -> DateTime<Utc> {
    truncate_micros(Utc::now())
}

/// `ts` with sub-microsecond digits dropped, as stored.
pub fn truncate_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    parse_ts(&format_ts(&ts)).unwrap_or(ts)
}

/// Encode a timestamp in the canonical fixed-width form.
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse any RFC 3339 timestamp into UTC.
pub fn parse_ts(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    #[test]
    fn format_is_fixed_width() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(format_ts(&ts), "2024-01-15T12:00:00.000000Z");
    }

    #[test]
    fn parse_accepts_offsets() {
        let parsed = parse_ts("2024-01-15T14:00:00+02:00").unwrap();
        assert_eq!(format_ts(&parsed), "2024-01-15T12:00:00.000000Z");
    }

    #[test]
    fn now_round_trips() {
        let n = now();
        assert_eq!(parse_ts(&format_ts(&n)).unwrap(), n);
    }

    #[test]
    fn truncation_drops_nanoseconds() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::nanoseconds(1_234_567);
        let truncated = truncate_micros(ts);
        assert_eq!(format_ts(&truncated), "2024-03-01T09:00:00.001234Z");
        assert_eq!(truncate_micros(truncated), truncated);
    }

    proptest! {
        #[test]
        fn lexical_order_matches_chronological(a in 0i64..4_000_000_000_000, b in 0i64..4_000_000_000_000) {
            let base = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
            let ta = base + Duration::microseconds(a);
            let tb = base + Duration::microseconds(b);
            prop_assert_eq!(format_ts(&ta).cmp(&format_ts(&tb)), ta.cmp(&tb));
        }
    }
}
