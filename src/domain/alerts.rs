//! Level-cross alert scan.
//!
//! Flags every bar where the close crosses one of the active levels relative
//! to the previous bar. Crossings are only evaluated where both bars carry
//! defined levels.

use chrono::{DateTime, Utc};

use crate::domain::levels::LevelSeries;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    CrossOverHi,
    CrossUnderHi,
    CrossOverLo,
    CrossUnderLo,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            AlertKind::CrossOverHi => "price crossed over psy hi",
            AlertKind::CrossUnderHi => "price crossed under psy hi",
            AlertKind::CrossOverLo => "price crossed over psy lo",
            AlertKind::CrossUnderLo => "price crossed under psy lo",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub kind: AlertKind,
    /// The level that was crossed.
    pub level: f64,
}

/// Scan close prices against the per-bar level series. `series.points` must
/// be aligned 1:1 with `bars`.
pub fn scan_alerts(bars: &[Bar], series: &LevelSeries) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for i in 1..bars.len() {
        let (Some(prev), Some(curr)) = (series.at(i - 1), series.at(i)) else {
            continue;
        };
        let prev_close = bars[i - 1].close;
        let close = bars[i].close;
        let ts = bars[i].timestamp;

        if prev_close <= prev.hi && close > curr.hi {
            alerts.push(Alert {
                timestamp: ts,
                kind: AlertKind::CrossOverHi,
                level: curr.hi,
            });
        } else if prev_close > prev.hi && close <= curr.hi {
            alerts.push(Alert {
                timestamp: ts,
                kind: AlertKind::CrossUnderHi,
                level: curr.hi,
            });
        }

        if prev_close <= prev.lo && close > curr.lo {
            alerts.push(Alert {
                timestamp: ts,
                kind: AlertKind::CrossOverLo,
                level: curr.lo,
            });
        } else if prev_close > prev.lo && close <= curr.lo {
            alerts.push(Alert {
                timestamp: ts,
                kind: AlertKind::CrossUnderLo,
                level: curr.lo,
            });
        }
    }

    alerts
}
