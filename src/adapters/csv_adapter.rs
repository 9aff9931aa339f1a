//! CSV file data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with the header
//! `timestamp,open,high,low,close,volume`.

use crate::domain::error::TradelabError;
use crate::domain::ohlcv::{parse_timestamp, Bar};
use crate::ports::data_port::{within_dates, DataPort};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<Bar>, TradelabError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TradelabError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TradelabError::Data {
                reason: format!("{symbol}: CSV parse error: {e}"),
            })?;
            let row = line + 2;

            let raw_ts = column(&record, 0, "timestamp", symbol, row)?;
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| TradelabError::Data {
                reason: format!("{symbol} row {row}: invalid timestamp '{raw_ts}'"),
            })?;

            bars.push(Bar::new(
                timestamp,
                parse_column(&record, 1, "open", symbol, row)?,
                parse_column(&record, 2, "high", symbol, row)?,
                parse_column(&record, 3, "low", symbol, row)?,
                parse_column(&record, 4, "close", symbol, row)?,
                parse_column(&record, 5, "volume", symbol, row)?,
            ));
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn column<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
    symbol: &str,
    row: usize,
) -> Result<&'r str, TradelabError> {
    record.get(idx).ok_or_else(|| TradelabError::Data {
        reason: format!("{symbol} row {row}: missing {name} column"),
    })
}

fn parse_column<T>(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    symbol: &str,
    row: usize,
) -> Result<T, TradelabError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    column(record, idx, name, symbol, row)?
        .trim()
        .parse()
        .map_err(|e| TradelabError::Data {
            reason: format!("{symbol} row {row}: invalid {name} value: {e}"),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TradelabError> {
        let mut bars = self.read_all(symbol)?;
        bars.retain(|b| within_dates(b.timestamp, start, end));
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradelabError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TradelabError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TradelabError::Data {
                reason: format!("directory entry error: {e}"),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradelabError> {
        if !self.csv_path(symbol).exists() {
            return Ok(None);
        }
        let bars = self.read_all(symbol)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, bars.len())),
            _ => None,
        })
    }
}
