//! Publication date parsing.
//!
//! Feeds and rendered blog pages disagree on date formats. RSS uses RFC 2822,
//! Atom and `<time datetime>` attributes use RFC 3339, and page text renders
//! things like `January 15, 2024`. Everything lands in UTC; values without an
//! offset are taken as UTC already.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Naive date-time layouts tried after the offset-aware parsers.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only layouts; the result is midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%m/%d/%Y",
];

/// Parse a publication date string into UTC.
///
/// Absent, blank or unrecognized input yields `None`. Never panics.
pub fn parse_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // ISO 8601 with a compact offset, e.g. 2024-01-15T10:00:00+0000
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    // "Jan. 15, 2024" shows up in rendered listings.
    let cleaned = raw.replace('.', "");
    for fmt in DATE_FORMATS {
        let parsed = NaiveDate::parse_from_str(raw, fmt)
            .or_else(|_| NaiveDate::parse_from_str(&cleaned, fmt));
        if let Ok(date) = parsed {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }

    None
}

/// Canonical textual form: RFC 3339, whole seconds, `Z` suffix.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_rfc2822_from_rss() {
        assert_eq!(
            parse_date(Some("Mon, 15 Jan 2024 10:30:00 +0000")),
            Some(utc(2024, 1, 15, 10, 30, 0))
        );
        assert_eq!(
            parse_date(Some("Mon, 15 Jan 2024 10:30:00 -0500")),
            Some(utc(2024, 1, 15, 15, 30, 0))
        );
    }

    #[test]
    fn test_iso_variants() {
        let expected = utc(2024, 1, 15, 10, 30, 0);
        assert_eq!(parse_date(Some("2024-01-15T10:30:00Z")), Some(expected));
        assert_eq!(parse_date(Some("2024-01-15T10:30:00+00:00")), Some(expected));
        assert_eq!(parse_date(Some("2024-01-15T12:30:00+02:00")), Some(expected));
        assert_eq!(parse_date(Some("2024-01-15T10:30:00.250Z")).map(|d| d.timestamp()), Some(expected.timestamp()));
        assert_eq!(parse_date(Some("2024-01-15T10:30:00")), Some(expected));
        assert_eq!(parse_date(Some("2024-01-15 10:30:00")), Some(expected));
    }

    #[test]
    fn test_rendered_dates() {
        let midnight = utc(2024, 1, 15, 0, 0, 0);
        assert_eq!(parse_date(Some("2024-01-15")), Some(midnight));
        assert_eq!(parse_date(Some("January 15, 2024")), Some(midnight));
        assert_eq!(parse_date(Some("Jan 15, 2024")), Some(midnight));
        assert_eq!(parse_date(Some("Jan. 15, 2024")), Some(midnight));
        assert_eq!(parse_date(Some("15 January 2024")), Some(midnight));
        assert_eq!(parse_date(Some("01/15/2024")), Some(midnight));
        assert_eq!(parse_date(Some("  2024-01-15  ")), Some(midnight));
    }

    #[test]
    fn test_absent_blank_and_garbage() {
        assert_eq!(parse_date(None), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("   ")), None);
        assert_eq!(parse_date(Some("not a date")), None);
        assert_eq!(parse_date(Some("2024-13-45")), None);
    }

    #[test]
    fn test_format_date_canonical() {
        assert_eq!(format_date(&utc(2024, 1, 15, 10, 30, 0)), "2024-01-15T10:30:00Z");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_format_parse_round_trip(secs in 0i64..4_102_444_800i64) {
            let ts = Utc.timestamp_opt(secs, 0).unwrap();
            prop_assert_eq!(parse_date(Some(&format_date(&ts))), Some(ts));
        }

        #[test]
        fn prop_parse_never_panics(s in "\\PC{0,40}") {
            let _ = parse_date(Some(&s));
        }
    }
}
