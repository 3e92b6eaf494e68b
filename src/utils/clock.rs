//! Business-local time. Attendance dates and stored check-in/out times are
//! naive values in the configured business timezone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

pub fn now_local(offset: FixedOffset) -> NaiveDateTime {
    Utc::now().with_timezone(&offset).naive_local()
}

pub fn today(offset: FixedOffset) -> NaiveDate {
    now_local(offset).date()
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a client timestamp. Values carrying a UTC offset are converted to
/// business-local time; naive values are taken as already local.
pub fn parse_datetime(raw: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&offset).naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dhaka() -> FixedOffset {
        FixedOffset::east_opt(6 * 3600).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn offsets_are_converted_to_local() {
        assert_eq!(parse_datetime("2026-03-02T03:15:00Z", dhaka()), Some(at(9, 15)));
        assert_eq!(
            parse_datetime("2026-03-02T09:15:00+06:00", dhaka()),
            Some(at(9, 15))
        );
    }

    #[test]
    fn naive_values_are_kept() {
        assert_eq!(parse_datetime("2026-03-02 18:00:00", dhaka()), Some(at(18, 0)));
        assert_eq!(parse_datetime("2026-03-02T18:00", dhaka()), Some(at(18, 0)));
        assert_eq!(
            parse_datetime("2026-03-02 18:00:00.250", dhaka()).map(|t| t.date()),
            Some(at(18, 0).date())
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_datetime("yesterday", dhaka()), None);
        assert_eq!(parse_datetime("2026-13-01 10:00", dhaka()), None);
    }
}
