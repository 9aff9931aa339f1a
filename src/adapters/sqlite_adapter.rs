//! SQLite bar store.
//!
//! Bars live in one table keyed by (symbol, timeframe, timestamp); an adapter
//! instance reads and writes a single timeframe.

use crate::domain::error::TradelabError;
use crate::domain::ohlcv::{parse_timestamp, Bar, TIMESTAMP_FORMAT};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub const DEFAULT_TIMEFRAME: &str = "5min";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
    timeframe: String,
}

fn pool_error(e: r2d2::Error) -> TradelabError {
    TradelabError::Data {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> TradelabError {
    TradelabError::DataQuery {
        reason: e.to_string(),
    }
}

fn text_timestamp(raw: String) -> Result<NaiveDateTime, TradelabError> {
    parse_timestamp(&raw).ok_or_else(|| TradelabError::Data {
        reason: format!("invalid stored timestamp '{raw}'"),
    })
}

impl SqliteAdapter {
    /// Reads `path`, `timeframe` and `pool_size` from `[data]`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradelabError> {
        let db_path =
            config
                .get_string("data", "path")
                .ok_or_else(|| TradelabError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                })?;
        let timeframe = config
            .get_string("data", "timeframe")
            .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string());
        let pool_size = config.get_int("data", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool, timeframe })
    }

    /// Single-connection in-memory store, so every checkout sees the same
    /// database.
    pub fn in_memory(timeframe: &str) -> Result<Self, TradelabError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self {
            pool,
            timeframe: timeframe.to_string(),
        })
    }

    pub fn timeframe(&self) -> &str {
        &self.timeframe
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, TradelabError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), TradelabError> {
        self.connection()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS bars (
                    symbol TEXT NOT NULL,
                    timeframe TEXT NOT NULL,
                    timestamp TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    PRIMARY KEY (symbol, timeframe, timestamp)
                );
                CREATE INDEX IF NOT EXISTS idx_bars_symbol_timeframe ON bars(symbol, timeframe);",
            )
            .map_err(query_error)
    }

    /// Upsert `bars` for `symbol` in one transaction.
    pub fn insert_bars(&self, symbol: &str, bars: &[Bar]) -> Result<(), TradelabError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO bars
                    (symbol, timeframe, timestamp, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    symbol,
                    self.timeframe,
                    bar.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>, TradelabError> {
        let conn = self.connection()?;

        // timestamps are stored in a lexically ordered text form
        let lower = start
            .map(|d| d.format("%Y-%m-%d 00:00:00").to_string())
            .unwrap_or_default();
        let upper = end
            .map(|d| d.format("%Y-%m-%d 23:59:59").to_string())
            .unwrap_or_else(|| "9999-12-31 23:59:59".to_string());

        let mut stmt = conn
            .prepare(
                "SELECT timestamp, open, high, low, close, volume
                 FROM bars
                 WHERE symbol = ?1 AND timeframe = ?2 AND timestamp >= ?3 AND timestamp <= ?4
                 ORDER BY timestamp ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![symbol, self.timeframe, lower, upper], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })
            .map_err(query_error)?;

        let mut bars = Vec::new();
        for row in rows {
            let (ts, open, high, low, close, volume) = row.map_err(query_error)?;
            bars.push(Bar::new(text_timestamp(ts)?, open, high, low, close, volume));
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradelabError> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM bars WHERE timeframe = ?1 ORDER BY symbol")
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![self.timeframe], |row| row.get(0))
            .map_err(query_error)?;

        rows.collect::<Result<Vec<String>, _>>().map_err(query_error)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradelabError> {
        let conn = self.connection()?;
        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(timestamp), MAX(timestamp), COUNT(*)
                 FROM bars WHERE symbol = ?1 AND timeframe = ?2",
                params![symbol, self.timeframe],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(first), Some(last), count) if count > 0 => Ok(Some((
                text_timestamp(first)?,
                text_timestamp(last)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}
