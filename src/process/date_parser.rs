use chrono::{NaiveDate, NaiveDateTime};

use crate::config::TimeFormat;

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a TIME_PERIOD cell. Accepts `YYYY-MM` (first of the month),
/// `YYYY-MM-DD`, and `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS`.
pub fn parse_time_period(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }

    // YYYY-MM
    let (year, month) = s.split_once('-')?;
    if year.len() != 4
        || month.len() != 2
        || !year.chars().all(|c| c.is_ascii_digit())
        || !month.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)?.and_hms_opt(0, 0, 0)
}

/// Render a time period at the configured granularity.
pub fn format_time_period(dt: &NaiveDateTime, format: TimeFormat) -> String {
    match format {
        TimeFormat::Month => dt.format("%Y-%m").to_string(),
        TimeFormat::Day => dt.format("%Y-%m-%d").to_string(),
        TimeFormat::Timestamp => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn month_periods_land_on_the_first() {
        assert_eq!(parse_time_period("2021-02"), Some(ymd(2021, 2, 1)));
        assert_eq!(parse_time_period("\"2021-02\""), Some(ymd(2021, 2, 1)));
    }

    #[test]
    fn day_and_datetime_periods() {
        assert_eq!(parse_time_period("2019-12-31"), Some(ymd(2019, 12, 31)));
        let dt = parse_time_period("2019-12-31T06:30:00").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "06:30");
        assert!(parse_time_period("2019-12-31 06:30:00").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_time_period(""), None);
        assert_eq!(parse_time_period("2021-13"), None);
        assert_eq!(parse_time_period("21-01"), None);
        assert_eq!(parse_time_period("2021/01"), None);
        assert_eq!(parse_time_period("2021-1"), None);
    }

    #[test]
    fn granularities() {
        let dt = ymd(2021, 1, 1);
        assert_eq!(format_time_period(&dt, TimeFormat::Month), "2021-01");
        assert_eq!(format_time_period(&dt, TimeFormat::Day), "2021-01-01");
        assert_eq!(
            format_time_period(&dt, TimeFormat::Timestamp),
            "2021-01-01T00:00:00"
        );
    }
}
