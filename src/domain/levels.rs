//! Weekly psy level calculation.
//!
//! For every anchor occurrence in the hourly-aggregated series, take the hour
//! before the anchor plus the six hours after it, and record the highest high
//! and lowest low across those up-to-seven hourly candles. The resulting pair
//! holds for every bar of the session (step function, right-continuous from
//! the anchor) until the next anchor.

use chrono::{DateTime, Duration, Utc};

use crate::domain::ohlcv::{aggregate_hourly, Bar};
use crate::domain::session::AnchorRule;

/// One hour of lookback before the anchor.
const LOOKBACK_HOURS: i64 = 1;
/// Six hours of lookahead after the anchor.
const LOOKAHEAD_HOURS: i64 = 6;

/// A session's high/low level pair. Invariant: `hi >= lo`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsyLevels {
    pub hi: f64,
    pub lo: f64,
}

/// Levels for one session `[anchor, end)`. `levels` is `None` when the
/// defining window held no data at all.
#[derive(Debug, Clone)]
pub struct SessionLevels {
    pub anchor: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub levels: Option<PsyLevels>,
}

/// The level pair in effect at one base-timeframe bar. `None` before the
/// first anchor or within a session whose defining window was empty.
#[derive(Debug, Clone)]
pub struct LevelPoint {
    pub timestamp: DateTime<Utc>,
    pub levels: Option<PsyLevels>,
}

/// Output of [`calc_psy_levels`]: the per-session mapping plus the per-bar
/// projection, aligned 1:1 with the input bars.
#[derive(Debug, Clone)]
pub struct LevelSeries {
    pub sessions: Vec<SessionLevels>,
    pub points: Vec<LevelPoint>,
}

impl LevelSeries {
    /// Levels in effect at `points[index]`.
    pub fn at(&self, index: usize) -> Option<&PsyLevels> {
        self.points.get(index).and_then(|p| p.levels.as_ref())
    }
}

/// Compute psy levels for an ordered base-timeframe series.
///
/// Pure function of the input: aggregates to hourly candles, finds every
/// anchor occurrence, derives each session's level pair from the 7-hour
/// defining window `[anchor - 1h, anchor + 6h)`, and projects it across the
/// session's bars. The last session extends through the final bar.
pub fn calc_psy_levels(bars: &[Bar], rule: &AnchorRule) -> LevelSeries {
    let hourly = aggregate_hourly(bars);

    let anchors: Vec<DateTime<Utc>> = hourly
        .iter()
        .map(|h| h.timestamp)
        .filter(|ts| rule.matches(*ts))
        .collect();

    let mut sessions = Vec::with_capacity(anchors.len());
    for (i, &anchor) in anchors.iter().enumerate() {
        let end = match anchors.get(i + 1) {
            Some(&next) => next,
            // Last session runs through the final bar; one second past it
            // keeps the projection window half-open.
            None => match bars.last() {
                Some(last) => last.timestamp + Duration::seconds(1),
                None => anchor,
            },
        };
        sessions.push(SessionLevels {
            anchor,
            end,
            levels: window_levels(&hourly, anchor),
        });
    }

    let mut points = Vec::with_capacity(bars.len());
    let mut si = 0;
    for bar in bars {
        while si + 1 < sessions.len() && bar.timestamp >= sessions[si + 1].anchor {
            si += 1;
        }
        let levels = sessions
            .get(si)
            .filter(|s| bar.timestamp >= s.anchor && bar.timestamp < s.end)
            .and_then(|s| s.levels);
        points.push(LevelPoint {
            timestamp: bar.timestamp,
            levels,
        });
    }

    LevelSeries { sessions, points }
}

/// Max high / min low over the hourly candles inside the defining window.
/// Missing hours are simply absent from `hourly`; an entirely empty window
/// yields `None`.
fn window_levels(hourly: &[Bar], anchor: DateTime<Utc>) -> Option<PsyLevels> {
    let start = anchor - Duration::hours(LOOKBACK_HOURS);
    let end = anchor + Duration::hours(LOOKAHEAD_HOURS);

    let mut hi = f64::NEG_INFINITY;
    let mut lo = f64::INFINITY;
    let mut seen = false;

    for bar in hourly {
        if bar.timestamp >= end {
            break;
        }
        if bar.timestamp >= start {
            hi = hi.max(bar.high);
            lo = lo.min(bar.low);
            seen = true;
        }
    }

    seen.then_some(PsyLevels { hi, lo })
}
