use chrono::{DateTime, NaiveDateTime};

const FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// True iff `end` is strictly later than `start`.
pub fn is_duration_valid<T: PartialOrd>(start: T, end: T) -> bool {
    end > start
}

/// Parse a form-style datetime. RFC 3339 input keeps its wall-clock time;
/// the offset is dropped rather than converted.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn later_end_is_valid() {
        assert!(is_duration_valid(at(9, 0), at(9, 1)));
    }

    #[test]
    fn equal_or_earlier_end_is_invalid() {
        assert!(!is_duration_valid(at(9, 0), at(9, 0)));
        assert!(!is_duration_valid(at(9, 0), at(8, 59)));
    }

    #[test]
    fn parses_form_inputs() {
        assert_eq!(parse_datetime("2026-03-10T09:00:00"), Some(at(9, 0)));
        assert_eq!(parse_datetime("2026-03-10 09:00"), Some(at(9, 0)));
        assert_eq!(parse_datetime("2026-03-10T09:00:00+01:00"), Some(at(9, 0)));
        assert_eq!(parse_datetime("10/03/2026"), None);
    }

    proptest! {
        #[test]
        fn valid_iff_end_after_start(offset in -100_000i64..100_000) {
            let start = at(12, 0);
            let end = start + Duration::seconds(offset);
            prop_assert_eq!(is_duration_valid(start, end), offset > 0);
        }
    }
}
