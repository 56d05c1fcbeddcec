use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minutes since midnight, in `[0, 1439]`.
pub type Minutes = u16;

/// Last representable minute of a day.
pub const LAST_MINUTE_OF_DAY: Minutes = 24 * 60 - 1;

/// A `{start, end}` pair of minute-of-day values.
///
/// On the wire a window is the text `"HH:MM-HH:MM"`. Parsing enforces
/// `start < end`; values built through [`TimeWindow::new`] are taken as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindow {
    pub start: Minutes,
    pub end: Minutes,
}

impl TimeWindow {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    /// Build a window from `(hour, minute)` pairs.
    pub fn from_hm(start: (u16, u16), end: (u16, u16)) -> Self {
        Self::new(start.0 * 60 + start.1, end.0 * 60 + end.1)
    }

    /// Length of the window in minutes (zero for inverted windows).
    pub fn duration(&self) -> Minutes {
        self.end.saturating_sub(self.start)
    }
}

/// Error returned when a `"HH:MM-HH:MM"` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeWindowParseError {
    #[error("expected HH:MM-HH:MM, got {0:?}")]
    Format(String),

    #[error("time of day out of range in {0:?}")]
    OutOfRange(String),

    #[error("window {0:?} does not end after it starts")]
    Empty(String),
}

fn parse_minute_of_day(text: &str, whole: &str) -> Result<Minutes, TimeWindowParseError> {
    let (hours, minutes) = text
        .split_once(':')
        .ok_or_else(|| TimeWindowParseError::Format(whole.to_string()))?;
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return Err(TimeWindowParseError::Format(whole.to_string()));
    }
    let hours: u16 = hours
        .parse()
        .map_err(|_| TimeWindowParseError::Format(whole.to_string()))?;
    let minutes: u16 = minutes
        .parse()
        .map_err(|_| TimeWindowParseError::Format(whole.to_string()))?;
    if hours > 23 || minutes > 59 {
        return Err(TimeWindowParseError::OutOfRange(whole.to_string()));
    }
    Ok(hours * 60 + minutes)
}

impl FromStr for TimeWindow {
    type Err = TimeWindowParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (start, end) = trimmed
            .split_once('-')
            .ok_or_else(|| TimeWindowParseError::Format(s.to_string()))?;
        let start = parse_minute_of_day(start, s)?;
        let end = parse_minute_of_day(end, s)?;
        if start >= end {
            return Err(TimeWindowParseError::Empty(s.to_string()));
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 60,
            self.start % 60,
            self.end / 60,
            self.end % 60
        )
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = TimeWindowParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeWindow> for String {
    fn from(window: TimeWindow) -> Self {
        window.to_string()
    }
}
