//! Human-readable duration labels for the dashboard columns.
//!
//! Every duration shown by duro-dash goes through [`DurationFormatter`]:
//!
//! - `0` → `""`
//! - `45` → `"45s"`
//! - `90` → `"1m 30s"`
//! - `3661` → `"1h 1m 1s"`
//! - `90000` → `"1d 1h "`
//!
//! The minutes segment keeps its trailing space when the seconds part is
//! zero (`120` → `"2m "`).

pub mod relative;

use thiserror::Error;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Errors raised when a value cannot be turned into a duration label.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// The text is not an integer.
    #[error("not a number: {0:?}")]
    NotANumber(String),

    /// Durations cannot be negative.
    #[error("negative duration: {0}")]
    Negative(i64),

    /// Mean durations must be finite and non-negative.
    #[error("invalid average duration: {0}")]
    InvalidAverage(f64),

    /// The value does not fit in a `u64` number of seconds.
    #[error("duration overflows: {0}")]
    Overflow(String),

    /// The text is not a recognizable point in time.
    #[error("not a time: {0:?}")]
    NotATime(String),

    /// The timestamp is outside the range chrono can represent.
    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(i64),
}

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

/// Formats second counts as compact labels such as `"2d 3h 5m "`.
///
/// The default formatter interpolates the hour count in the days branch.
/// [`DurationFormatter::legacy`] reproduces the deployed pages instead, which
/// leave a literal `{hours}` token after the hour count (`"1d 1{hours}h "`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationFormatter {
    hour_placeholder: bool,
}

impl DurationFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formatter matching the deployed pages byte for byte.
    pub fn legacy() -> Self {
        Self {
            hour_placeholder: true,
        }
    }

    /// Build a formatter from the `display.legacy_hour_placeholder` switch.
    pub fn with_hour_placeholder(hour_placeholder: bool) -> Self {
        Self { hour_placeholder }
    }

    pub fn is_legacy(&self) -> bool {
        self.hour_placeholder
    }

    /// Format a number of seconds.
    pub fn format(&self, seconds: u64) -> String {
        if seconds == 0 {
            return String::new();
        }
        if seconds < MINUTE {
            return format!("{seconds}s");
        }
        if seconds < HOUR {
            return minutes_segment(seconds);
        }
        if seconds <= DAY {
            let hours = seconds / HOUR;
            return format!("{hours}h {}", minutes_segment(seconds % HOUR));
        }

        let days = seconds / DAY;
        let remainder = seconds % DAY;
        let hours = remainder / HOUR;
        let remainder = remainder % HOUR;

        let mut out = format!("{days}d ");
        if hours != 0 {
            if self.hour_placeholder {
                out.push_str(&format!("{hours}{{hours}}h "));
            } else {
                out.push_str(&format!("{hours}h "));
            }
        }
        out.push_str(&minutes_segment(remainder));
        out
    }

    /// Format a number of minutes (table refresh intervals are stored in minutes).
    pub fn format_minutes(&self, minutes: u64) -> Result<String, FormatError> {
        let seconds = minutes
            .checked_mul(MINUTE)
            .ok_or_else(|| FormatError::Overflow(format!("{minutes} minutes")))?;
        Ok(self.format(seconds))
    }

    /// Parse and format a text cell holding seconds.
    pub fn format_text(&self, text: &str) -> Result<String, FormatError> {
        parse_seconds(text).map(|s| self.format(s))
    }

    /// Parse and format a text cell holding minutes.
    pub fn format_minutes_text(&self, text: &str) -> Result<String, FormatError> {
        parse_seconds(text).and_then(|m| self.format_minutes(m))
    }

    /// Format a mean duration, rounded to whole seconds.
    pub fn format_average(&self, mean: f64) -> Result<String, FormatError> {
        if !mean.is_finite() || mean < 0.0 {
            return Err(FormatError::InvalidAverage(mean));
        }
        let rounded = mean.round();
        if rounded > u64::MAX as f64 {
            return Err(FormatError::Overflow(mean.to_string()));
        }
        Ok(self.format(rounded as u64))
    }

    /// Format the time elapsed between two Unix timestamps.
    pub fn format_delta(&self, prev: i64, next: i64) -> Result<String, FormatError> {
        let delta = next
            .checked_sub(prev)
            .ok_or_else(|| FormatError::Overflow(format!("{next} - {prev}")))?;
        let seconds = u64::try_from(delta).map_err(|_| FormatError::Negative(delta))?;
        Ok(self.format(seconds))
    }
}

/// `"{m}m "` followed by `"{s}s"` when the seconds part is non-zero.
fn minutes_segment(remainder: u64) -> String {
    if remainder == 0 {
        return String::new();
    }
    let minutes = remainder / MINUTE;
    let seconds = remainder % MINUTE;
    if seconds != 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{minutes}m ")
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a text cell into a non-negative second count.
///
/// Surrounding whitespace is ignored. Anything that is not an integer is
/// rejected rather than truncated.
pub fn parse_seconds(text: &str) -> Result<u64, FormatError> {
    let trimmed = text.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| FormatError::NotANumber(trimmed.to_string()))?;
    u64::try_from(value).map_err(|_| FormatError::Negative(value))
}

// ---------------------------------------------------------------------------
// Convenience wrappers
// ---------------------------------------------------------------------------

/// Format seconds with the default formatter.
pub fn format_seconds(seconds: u64) -> String {
    DurationFormatter::default().format(seconds)
}

/// Format minutes with the default formatter.
pub fn format_minutes(minutes: u64) -> Result<String, FormatError> {
    DurationFormatter::default().format_minutes(minutes)
}

/// Format an optional value, mapping `None` to an empty label.
pub fn format_optional<T, F>(value: Option<T>, f: F) -> Result<String, FormatError>
where
    F: FnOnce(T) -> Result<String, FormatError>,
{
    match value {
        Some(v) => f(v),
        None => Ok(String::new()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
