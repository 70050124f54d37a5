//! Lenient date parsing for hand-entered and exported date cells.

use crate::config::DateOrder;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date-time layouts that read the same regardless of day/month order.
const UNAMBIGUOUS_DATETIME: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%Y/%m/%d %I:%M %p",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%d %B %Y %H:%M",
    "%d %b %Y %I:%M %p",
];

const UNAMBIGUOUS_DATE: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%d %B %Y"];

const DAY_FIRST_DATETIME: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M",
    "%d/%m/%Y %I:%M:%S %p",
    "%d/%m/%Y %I:%M %p",
    "%d-%m-%Y %I:%M:%S %p",
    "%d-%m-%Y %I:%M %p",
];

const DAY_FIRST_DATE: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const MONTH_FIRST_DATETIME: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
    "%m.%d.%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m-%d-%Y %I:%M:%S %p",
    "%m-%d-%Y %I:%M %p",
];

const MONTH_FIRST_DATE: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%m.%d.%Y"];

/// Parse a timestamp, returning `None` for anything unrecognised.
///
/// Dates without a time part are midnight. Offsets in RFC 3339 values are
/// dropped and the wall-clock time is kept.
pub fn parse_datetime_lenient(raw: &str, order: DateOrder) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    let (numeric_datetime, numeric_date) = match order {
        DateOrder::DayFirst => (DAY_FIRST_DATETIME, DAY_FIRST_DATE),
        DateOrder::MonthFirst => (MONTH_FIRST_DATETIME, MONTH_FIRST_DATE),
    };

    UNAMBIGUOUS_DATETIME
        .iter()
        .chain(numeric_datetime)
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            UNAMBIGUOUS_DATE
                .iter()
                .chain(numeric_date)
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a calendar date; any time part is discarded.
pub fn parse_date_lenient(raw: &str, order: DateOrder) -> Option<NaiveDate> {
    parse_datetime_lenient(raw, order).map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_forms() {
        let order = DateOrder::DayFirst;
        assert_eq!(parse_date_lenient("2024-03-12", order), Some(ymd(2024, 3, 12)));
        assert_eq!(
            parse_datetime_lenient("2024-03-12 14:05:00", order),
            ymd(2024, 3, 12).and_hms_opt(14, 5, 0)
        );
        assert_eq!(
            parse_datetime_lenient("2024-03-12T14:05", order),
            ymd(2024, 3, 12).and_hms_opt(14, 5, 0)
        );
        assert_eq!(
            parse_datetime_lenient("2024-03-12T14:05:00+01:00", order),
            ymd(2024, 3, 12).and_hms_opt(14, 5, 0)
        );
    }

    #[test]
    fn numeric_dates_follow_configured_order() {
        assert_eq!(
            parse_date_lenient("03/04/2024", DateOrder::DayFirst),
            Some(ymd(2024, 4, 3))
        );
        assert_eq!(
            parse_date_lenient("03/04/2024", DateOrder::MonthFirst),
            Some(ymd(2024, 3, 4))
        );
        assert_eq!(
            parse_datetime_lenient("25/12/2023 09:30", DateOrder::DayFirst),
            ymd(2023, 12, 25).and_hms_opt(9, 30, 0)
        );
    }

    #[test]
    fn parses_twelve_hour_times() {
        assert_eq!(
            parse_datetime_lenient("12/03/2024 2:00 PM", DateOrder::DayFirst),
            ymd(2024, 3, 12).and_hms_opt(14, 0, 0)
        );
        assert_eq!(
            parse_datetime_lenient("12/03/2024 2:00 PM", DateOrder::MonthFirst),
            ymd(2024, 12, 3).and_hms_opt(14, 0, 0)
        );
        assert_eq!(
            parse_datetime_lenient("2024-03-12 09:05:30 am", DateOrder::MonthFirst),
            ymd(2024, 3, 12).and_hms_opt(9, 5, 30)
        );
        assert_eq!(
            parse_datetime_lenient("12/03/2024 12:15 AM", DateOrder::DayFirst),
            ymd(2024, 3, 12).and_hms_opt(0, 15, 0)
        );
        assert_eq!(
            parse_date_lenient("03/12/2024 11:45:00 PM", DateOrder::MonthFirst),
            Some(ymd(2024, 3, 12))
        );
    }

    #[test]
    fn parses_month_names() {
        assert_eq!(
            parse_date_lenient("12 Mar 2024", DateOrder::MonthFirst),
            Some(ymd(2024, 3, 12))
        );
        assert_eq!(
            parse_date_lenient("12 March 2024", DateOrder::DayFirst),
            Some(ymd(2024, 3, 12))
        );
    }

    #[test]
    fn garbage_is_none() {
        for raw in ["", "   ", "not a date", "2024-13-01", "31/02/2024", "TBC"] {
            assert_eq!(parse_date_lenient(raw, DateOrder::DayFirst), None, "{raw}");
        }
    }
}
