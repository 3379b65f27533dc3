//! Object key scheme for stored photos.
//!
//! Keys look like `"{user_id}/{YYYY-MM-DD}/{HHMMSSffffff}.jpg"`: one folder
//! per user, one per local calendar day, files named by zero-padded
//! time-of-day with microseconds. Lexicographic order inside a day equals
//! chronological order, and two keys can only collide if the same user
//! checks in twice within one microsecond.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike};

/// Build the object key for a check-in. The timestamp must already be in
/// the display timezone; the key records wall-clock time, not UTC.
pub fn object_key<Tz: TimeZone>(user_id: i64, ts: &DateTime<Tz>) -> String {
    format!(
        "{}/{:04}-{:02}-{:02}/{:02}{:02}{:02}{:06}.jpg",
        user_id,
        ts.year(),
        ts.month(),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second(),
        ts.timestamp_subsec_micros(),
    )
}

/// The components a conforming object key encodes. Enough to reconstruct
/// ownership and day without a database join, which is what the admin view
/// falls back to when the user lookup comes back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts {
    pub user_id: i64,
    pub day: NaiveDate,
    pub time: NaiveTime,
}

/// Parse an object key back into its parts. Returns `None` for keys that
/// do not follow the current scheme (legacy keys, foreign files).
pub fn parse_object_key(key: &str) -> Option<KeyParts> {
    let mut segments = key.split('/');
    let user_id: i64 = segments.next()?.parse().ok()?;
    let day = NaiveDate::parse_from_str(segments.next()?, "%Y-%m-%d").ok()?;
    let file = segments.next()?;
    if segments.next().is_some() {
        return None;
    }

    let stem = file.strip_suffix(".jpg")?;
    if stem.len() != 12 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = stem[0..2].parse().ok()?;
    let minute: u32 = stem[2..4].parse().ok()?;
    let second: u32 = stem[4..6].parse().ok()?;
    let micros: u32 = stem[6..12].parse().ok()?;
    let time = NaiveTime::from_hms_micro_opt(hour, minute, second, micros)?;

    Some(KeyParts { user_id, day, time })
}

/// Whether a key already follows the current scheme.
pub fn is_current_scheme(key: &str) -> bool {
    parse_object_key(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ts(h: u32, m: u32, s: u32, micro: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, h, m, s)
            .unwrap()
            .with_nanosecond(micro * 1_000)
            .unwrap()
    }

    #[test]
    fn test_key_format() {
        let key = object_key(42, &ts(9, 5, 3, 7));
        assert_eq!(key, "42/2026-08-07/090503000007.jpg");
    }

    #[test]
    fn test_keys_injective_per_microsecond() {
        let a = object_key(1, &ts(10, 0, 0, 1));
        let b = object_key(1, &ts(10, 0, 0, 2));
        assert_ne!(a, b);

        // Same instant, different user also differs.
        let c = object_key(2, &ts(10, 0, 0, 1));
        assert_ne!(a, c);
    }

    #[test]
    fn test_lexicographic_order_is_chronological_within_day() {
        let earlier = object_key(1, &ts(9, 59, 59, 999_999));
        let later = object_key(1, &ts(10, 0, 0, 0));
        assert!(earlier < later);
    }

    #[test]
    fn test_parse_roundtrip() {
        let instant = ts(23, 59, 59, 123_456);
        let key = object_key(7, &instant);
        let parts = parse_object_key(&key).unwrap();
        assert_eq!(parts.user_id, 7);
        assert_eq!(parts.day, NaiveDate::from_ymd_opt(2026, 8, 7).unwrap());
        assert_eq!(parts.time, NaiveTime::from_hms_micro_opt(23, 59, 59, 123_456).unwrap());
    }

    #[test]
    fn test_parse_rejects_legacy_keys() {
        assert!(parse_object_key("7/20260807-101500.jpg").is_none());
        assert!(parse_object_key("not-a-user/2026-08-07/101500000000.jpg").is_none());
        assert!(parse_object_key("7/2026-08-07/101500.jpg").is_none());
        assert!(parse_object_key("7/2026-08-07/101500000000.png").is_none());
        assert!(parse_object_key("7/2026-08-07/extra/101500000000.jpg").is_none());
    }
}
