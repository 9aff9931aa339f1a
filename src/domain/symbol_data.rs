//! Per-symbol bar index and the unified simulation clock.

use crate::domain::error::TradelabError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

/// A symbol's bars with O(1) lookup by timestamp.
#[derive(Debug, Clone)]
pub struct SymbolData<'a> {
    pub symbol: &'a str,
    pub bars: &'a [Bar],
    pub timestamp_index: HashMap<NaiveDateTime, usize>,
}

impl<'a> SymbolData<'a> {
    /// Index `bars`, rejecting series that are not strictly ascending.
    pub fn new(symbol: &'a str, bars: &'a [Bar]) -> Result<Self, TradelabError> {
        if let Some(i) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(TradelabError::UnsortedBars {
                symbol: symbol.to_string(),
                index: i + 1,
                timestamp: bars[i + 1].timestamp,
            });
        }

        let timestamp_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.timestamp, i))
            .collect();

        Ok(Self {
            symbol,
            bars,
            timestamp_index,
        })
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn get_bar_index(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.timestamp_index.get(&timestamp).copied()
    }

    pub fn get_bar(&self, timestamp: NaiveDateTime) -> Option<&'a Bar> {
        self.get_bar_index(timestamp).map(|i| &self.bars[i])
    }

    /// Bars up to and including `idx`, oldest first.
    pub fn history(&self, idx: usize) -> &'a [Bar] {
        &self.bars[..=idx]
    }

    pub fn last_bar(&self) -> Option<&'a Bar> {
        self.bars.last()
    }
}

/// Sorted distinct timestamps across every bar series given.
pub fn build_unified_timeline<'b, I>(series: I) -> Vec<NaiveDateTime>
where
    I: IntoIterator<Item = &'b [Bar]>,
{
    let unique: BTreeSet<NaiveDateTime> = series
        .into_iter()
        .flat_map(|bars| bars.iter().map(|bar| bar.timestamp))
        .collect();
    unique.into_iter().collect()
}
