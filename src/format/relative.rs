//! Relative and absolute timestamp labels.
//!
//! `last_created` and job timestamps arrive as Unix seconds. The tables view
//! shows them relative to now ("3 hours ago"), the jobs view as local clock
//! times.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use super::FormatError;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
/// Average Gregorian month: 400 years hold 146097 days and 4800 months.
const DAYS_PER_MONTH: f64 = 146_097.0 / 4_800.0;

/// Convert Unix seconds into a UTC datetime.
pub fn from_unix(timestamp: i64) -> Result<DateTime<Utc>, FormatError> {
    DateTime::from_timestamp(timestamp, 0).ok_or(FormatError::TimestampOutOfRange(timestamp))
}

/// Describe `timestamp` relative to the current time.
pub fn format_relative(timestamp: i64) -> Result<String, FormatError> {
    format_relative_to(timestamp, Utc::now())
}

/// Describe `timestamp` relative to `now`: `"3 hours ago"`, `"in a minute"`.
pub fn format_relative_to(timestamp: i64, now: DateTime<Utc>) -> Result<String, FormatError> {
    let then = from_unix(timestamp)?;
    let elapsed = now.signed_duration_since(then);
    let seconds = elapsed.num_seconds();
    let phrase = humanize(seconds.unsigned_abs() as f64);

    if seconds >= 0 {
        Ok(format!("{phrase} ago"))
    } else {
        Ok(format!("in {phrase}"))
    }
}

/// Pick a coarse phrase for an absolute number of seconds.
///
/// Each unit is rounded first and the rounded count is compared against
/// its threshold, so 44.8 minutes reads "an hour" rather than "45 minutes".
fn humanize(secs: f64) -> String {
    let seconds = secs.round();
    let minutes = (secs / MINUTE).round();
    let hours = (secs / HOUR).round();
    let days = (secs / DAY).round();
    let exact_months = secs / DAY / DAYS_PER_MONTH;
    let months = exact_months.round();
    let years = (exact_months / 12.0).round();

    if seconds < 45.0 {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        plural(minutes, "minute")
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        plural(hours, "hour")
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < 26.0 {
        plural(days, "day")
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < 11.0 {
        plural(months, "month")
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        plural(years, "year")
    }
}

fn plural(count: f64, unit: &str) -> String {
    format!("{count:.0} {unit}s")
}

/// Long local timestamp: `Monday, March 04, 14:05:09`.
pub fn format_timestamp(timestamp: i64) -> Result<String, FormatError> {
    let local = Local.from_utc_datetime(&from_unix(timestamp)?.naive_utc());
    Ok(local.format("%A, %B %d, %H:%M:%S").to_string())
}

/// Short local clock time: `14:05:09`.
pub fn format_short_timestamp(timestamp: i64) -> Result<String, FormatError> {
    let local = Local.from_utc_datetime(&from_unix(timestamp)?.naive_utc());
    Ok(local.format("%H:%M:%S").to_string())
}

/// Parse a point in time given as Unix seconds, RFC 3339, `YYYY-MM-DD HH:MM[:SS]`
/// (UTC), or `YYYY-MM-DD` (UTC midnight).
pub fn parse_time(text: &str) -> Result<DateTime<Utc>, FormatError> {
    let text = text.trim();
    if let Ok(ts) = text.parse::<i64>() {
        return from_unix(ts);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(naive.and_utc());
    }
    Err(FormatError::NotATime(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn ago(secs: i64) -> String {
        format_relative_to(now().timestamp() - secs, now()).unwrap()
    }

    #[test]
    fn seconds_and_minutes() {
        assert_eq!(ago(0), "a few seconds ago");
        assert_eq!(ago(44), "a few seconds ago");
        assert_eq!(ago(60), "a minute ago");
        assert_eq!(ago(5 * 60), "5 minutes ago");
        assert_eq!(ago(44 * 60), "44 minutes ago");
    }

    #[test]
    fn hours_and_days() {
        assert_eq!(ago(60 * 60), "an hour ago");
        assert_eq!(ago(3 * 3600), "3 hours ago");
        assert_eq!(ago(21 * 3600), "21 hours ago");
        assert_eq!(ago(30 * 3600), "a day ago");
        assert_eq!(ago(5 * 86400), "5 days ago");
    }

    #[test]
    fn months_and_years() {
        assert_eq!(ago(30 * 86400), "a month ago");
        assert_eq!(ago(90 * 86400), "3 months ago");
        assert_eq!(ago(400 * 86400), "a year ago");
        assert_eq!(ago(3 * 365 * 86400), "3 years ago");
    }

    #[test]
    fn rounding_happens_before_thresholds() {
        assert_eq!(ago(89), "a minute ago");
        assert_eq!(ago(90), "2 minutes ago");
        assert_eq!(ago(2690), "an hour ago");
        assert_eq!(ago(77_500), "a day ago");
        assert_eq!(ago(2_210_000), "a month ago");
        assert_eq!(ago(320 * 86400), "a year ago");
    }

    #[test]
    fn future_timestamps() {
        assert_eq!(ago(-3 * 3600), "in 3 hours");
        assert_eq!(ago(-10), "in a few seconds");
    }

    #[test]
    fn out_of_range_timestamp_is_an_error() {
        assert_eq!(
            format_relative_to(i64::MAX, now()),
            Err(FormatError::TimestampOutOfRange(i64::MAX))
        );
    }

    #[test]
    fn parse_time_formats() {
        let expected = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(parse_time("1700000000").unwrap(), expected);
        assert_eq!(parse_time("2023-11-14T22:13:20Z").unwrap(), expected);
        assert_eq!(parse_time("2023-11-14T23:13:20+01:00").unwrap(), expected);
        assert_eq!(parse_time("2023-11-14 22:13:20").unwrap(), expected);
        assert_eq!(
            parse_time("2023-11-14 22:13").unwrap(),
            expected - chrono::Duration::seconds(20)
        );
        assert_eq!(
            parse_time("2023-11-14").unwrap().format("%H:%M").to_string(),
            "00:00"
        );
        assert!(matches!(
            parse_time("yesterday"),
            Err(FormatError::NotATime(_))
        ));
    }

    #[test]
    fn absolute_labels_have_expected_shape() {
        let short = format_short_timestamp(1_700_000_000).unwrap();
        assert_eq!(short.len(), 8);
        assert_eq!(short.matches(':').count(), 2);

        let long = format_timestamp(1_700_000_000).unwrap();
        assert!(long.contains(", "));
    }
}
