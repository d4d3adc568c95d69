//! Data access port trait.

use crate::domain::error::PsytraderError;
use crate::domain::ohlcv::Bar;
use chrono::{DateTime, Utc};

pub trait DataPort {
    /// Fetch an ordered, duplicate-free, UTC-indexed OHLCV series for
    /// `symbol` within `[start, end]`.
    fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, PsytraderError>;

    /// (first timestamp, last timestamp, bar count), or `None` if no data.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, PsytraderError>;
}
