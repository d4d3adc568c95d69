//! OHLCV bar representation and hourly aggregation.

use chrono::{DateTime, Timelike, Utc};

/// A single OHLCV bar at the base trading timeframe (UTC timestamps).
///
/// Volume is f64 because crypto instruments trade fractional quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Truncate a timestamp to the start of its hour.
pub fn hour_floor(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Merge base-timeframe bars into hourly bars: open=first, high=max, low=min,
/// close=last, volume=sum, bucketed by the hour-floored timestamp.
///
/// Input must be sorted by timestamp; only non-empty hour buckets are produced.
pub fn aggregate_hourly(bars: &[Bar]) -> Vec<Bar> {
    let mut hourly: Vec<Bar> = Vec::new();

    for bar in bars {
        let bucket = hour_floor(bar.timestamp);
        match hourly.last_mut() {
            Some(current) if current.timestamp == bucket => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
            }
            _ => hourly.push(Bar {
                timestamp: bucket,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            }),
        }
    }

    hourly
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(min: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 6, 22, min, 0).unwrap(),
            open,
            high,
            low,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn hour_floor_truncates_minutes_and_seconds() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 6, 22, 35, 17).unwrap();
        assert_eq!(
            hour_floor(ts),
            Utc.with_ymd_and_hms(2024, 1, 6, 22, 0, 0).unwrap()
        );
    }

    #[test]
    fn aggregate_single_hour() {
        let bars = vec![
            bar(0, 100.0, 110.0, 95.0, 105.0),
            bar(5, 105.0, 120.0, 100.0, 115.0),
            bar(10, 115.0, 118.0, 90.0, 92.0),
        ];
        let hourly = aggregate_hourly(&bars);

        assert_eq!(hourly.len(), 1);
        let h = &hourly[0];
        assert_eq!(h.timestamp, Utc.with_ymd_and_hms(2024, 1, 6, 22, 0, 0).unwrap());
        assert!((h.open - 100.0).abs() < f64::EPSILON);
        assert!((h.high - 120.0).abs() < f64::EPSILON);
        assert!((h.low - 90.0).abs() < f64::EPSILON);
        assert!((h.close - 92.0).abs() < f64::EPSILON);
        assert!((h.volume - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregate_splits_hours() {
        let mut bars = vec![bar(55, 100.0, 101.0, 99.0, 100.5)];
        bars.push(Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 6, 23, 0, 0).unwrap(),
            open: 100.5,
            high: 102.0,
            low: 100.0,
            close: 101.0,
            volume: 5.0,
        });
        let hourly = aggregate_hourly(&bars);

        assert_eq!(hourly.len(), 2);
        assert_eq!(
            hourly[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 6, 22, 0, 0).unwrap()
        );
        assert_eq!(
            hourly[1].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 6, 23, 0, 0).unwrap()
        );
    }

    #[test]
    fn aggregate_skips_empty_hours() {
        // Bars at 22:00 and 02:00 next day; 23:00-01:00 have no data.
        let late = Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 7, 2, 30, 0).unwrap(),
            open: 200.0,
            high: 210.0,
            low: 190.0,
            close: 205.0,
            volume: 1.0,
        };
        let bars = vec![bar(0, 100.0, 110.0, 95.0, 105.0), late];
        let hourly = aggregate_hourly(&bars);

        assert_eq!(hourly.len(), 2);
        assert_eq!(
            hourly[1].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 7, 2, 0, 0).unwrap()
        );
    }

    #[test]
    fn aggregate_empty_input() {
        assert!(aggregate_hourly(&[]).is_empty());
    }
}
