//! Bar source port trait.

use crate::domain::error::TradelabError;
use crate::domain::ohlcv::Bar;
use chrono::{NaiveDate, NaiveDateTime};

pub trait DataPort {
    /// Bars for `symbol` sorted ascending, restricted to calendar dates in
    /// `[start, end]` when bounds are given.
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TradelabError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradelabError>;

    /// First timestamp, last timestamp and bar count; `None` when the symbol
    /// has no bars.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradelabError>;
}

/// Inclusive calendar-date filter shared by the adapters.
pub fn within_dates(timestamp: NaiveDateTime, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    let date = timestamp.date();
    start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
}
