//! Session anchor convention: the recurring weekly timestamp that starts a
//! new evaluation period.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

/// A recurring weekly anchor (weekday + hour + minute, UTC).
///
/// Anchors partition the timeline into consecutive sessions
/// `[anchor_i, anchor_{i+1})`; one level pair applies per session.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorRule {
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
}

impl AnchorRule {
    pub fn new(weekday: Weekday, hour: u32, minute: u32) -> Self {
        Self {
            weekday,
            hour,
            minute,
        }
    }

    /// Saturday 22:00 UTC — session open for continuously-traded crypto markets.
    pub fn crypto() -> Self {
        Self::new(Weekday::Sat, 22, 0)
    }

    /// Monday 00:00 UTC — forex week open.
    pub fn forex() -> Self {
        Self::new(Weekday::Mon, 0, 0)
    }

    /// Whether `ts` is an anchor occurrence.
    pub fn matches(&self, ts: DateTime<Utc>) -> bool {
        ts.weekday() == self.weekday && ts.hour() == self.hour && ts.minute() == self.minute
    }
}

impl Default for AnchorRule {
    fn default() -> Self {
        Self::crypto()
    }
}

/// Parse a weekday name ("monday", "mon", ...) case-insensitively.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}
