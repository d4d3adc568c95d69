//! CSV file data adapter.
//!
//! One file per symbol under a base directory, columns
//! `timestamp,open,high,low,close,volume`. Timestamps are RFC 3339 or
//! `YYYY-MM-DD HH:MM:SS` (UTC assumed). Rows are sorted and duplicate
//! timestamps dropped keep-first, so the core always sees an ordered,
//! duplicate-free series.

use crate::domain::config_validation::parse_datetime;
use crate::domain::error::PsytraderError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        // "BTC/USDT" maps onto "BTC_USDT.csv".
        self.base_path
            .join(format!("{}.csv", symbol.replace('/', "_")))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<Bar>, PsytraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| PsytraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| PsytraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = record.get(0).ok_or_else(|| PsytraderError::Data {
                reason: "missing timestamp column".into(),
            })?;
            let timestamp = parse_datetime(ts_str).ok_or_else(|| PsytraderError::Data {
                reason: format!("invalid timestamp: {}", ts_str),
            })?;

            bars.push(Bar {
                timestamp,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn parse_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<f64, PsytraderError> {
    record
        .get(index)
        .ok_or_else(|| PsytraderError::Data {
            reason: format!("missing {} column", name),
        })?
        .parse()
        .map_err(|e| PsytraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, PsytraderError> {
        let bars = self.read_all(symbol)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .collect())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, PsytraderError> {
        let bars = self.read_all(symbol)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-06 22:00:00,50000,50100,49900,50050,12.5\n\
            2024-01-06 22:05:00,50050,50200,50000,50150,8.0\n\
            2024-01-06 22:05:00,99999,99999,99999,99999,1.0\n\
            2024-01-06 21:55:00,49950,50000,49900,50000,3.25\n";

        fs::write(path.join("BTC_USDT.csv"), csv_content).unwrap();
        (dir, path)
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 6, h, m, 0).unwrap()
    }

    #[test]
    fn fetch_bars_sorts_and_dedups() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_bars("BTC/USDT", ts(0, 0), ts(23, 59))
            .unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].timestamp, ts(21, 55));
        assert_eq!(bars[1].timestamp, ts(22, 0));
        assert_eq!(bars[2].timestamp, ts(22, 5));
        // Duplicate 22:05 row dropped keep-first.
        assert_eq!(bars[2].close, 50150.0);
        assert_eq!(bars[0].volume, 3.25);
    }

    #[test]
    fn fetch_bars_filters_by_range() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("BTC/USDT", ts(22, 0), ts(22, 0)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timestamp, ts(22, 0));
    }

    #[test]
    fn missing_file_is_an_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_bars("ETH/USDT", ts(0, 0), ts(23, 59));
        assert!(matches!(result, Err(PsytraderError::Data { .. })));
    }

    #[test]
    fn invalid_timestamp_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "timestamp,open,high,low,close,volume\nnot-a-time,1,2,0,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert!(adapter.fetch_bars("BAD", ts(0, 0), ts(23, 59)).is_err());
    }

    #[test]
    fn rfc3339_timestamps_accepted() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-06T22:00:00Z,1,2,0.5,1.5,10\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_bars("X", ts(0, 0), ts(23, 59)).unwrap();
        assert_eq!(bars[0].timestamp, ts(22, 0));
    }

    #[test]
    fn data_range_reports_span_and_count() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let range = adapter.get_data_range("BTC/USDT").unwrap().unwrap();
        assert_eq!(range.0, ts(21, 55));
        assert_eq!(range.1, ts(22, 5));
        assert_eq!(range.2, 3);
    }

    #[test]
    fn data_range_empty_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("EMPTY.csv"),
            "timestamp,open,high,low,close,volume\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.get_data_range("EMPTY").unwrap(), None);
    }
}
