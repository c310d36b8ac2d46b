//! SQLite storage for stock metadata and daily prices.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::models::{CompanyMetadata, PriceRow, StockMeta};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SCHEMA_VERSION: i32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

/// Summary row for `stockingest tickers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRow {
    pub ticker: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<i64>,
    pub last_metadata_refresh: Option<String>,
    pub price_count: i64,
    pub last_price_date: Option<String>,
}

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn init(&self) -> Result<(), DbError> {
        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        }
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        self.conn
            .query_row(
                "SELECT value FROM ingest_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO ingest_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Create an empty row for `ticker` if none exists. Existing rows are untouched.
    pub fn ensure_stock_row(&self, ticker: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO stocks (ticker) VALUES (?1) ON CONFLICT(ticker) DO NOTHING",
            params![ticker],
        )?;
        Ok(())
    }

    /// Overwrite the stored metadata and stamp both refresh timestamps.
    pub fn upsert_stock(
        &self,
        ticker: &str,
        meta: &CompanyMetadata,
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let stamp = format_timestamp(refreshed_at);
        self.conn.execute(
            "INSERT INTO stocks (
               ticker, company_name, sector, industry, market_cap,
               market_cap_updated_at, last_metadata_refresh
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(ticker) DO UPDATE SET
               company_name = excluded.company_name,
               sector = excluded.sector,
               industry = excluded.industry,
               market_cap = excluded.market_cap,
               market_cap_updated_at = excluded.market_cap_updated_at,
               last_metadata_refresh = excluded.last_metadata_refresh",
            params![
                ticker,
                meta.company_name,
                meta.sector,
                meta.industry,
                meta.market_cap,
                stamp,
            ],
        )?;
        Ok(())
    }

    pub fn get_stock_meta(&self, ticker: &str) -> Result<Option<StockMeta>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT company_name, sector, industry, market_cap, last_metadata_refresh
                 FROM stocks WHERE ticker = ?1",
                params![ticker],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((company_name, sector, industry, market_cap, refreshed)) = row else {
            return Ok(None);
        };
        let last_metadata_refresh = refreshed.as_deref().map(parse_timestamp).transpose()?;
        Ok(Some(StockMeta {
            company_name,
            sector,
            industry,
            market_cap,
            last_metadata_refresh,
        }))
    }

    /// Insert price rows, skipping any `(ticker, price_date)` already stored.
    /// The whole batch is one transaction. Returns the number of rows actually written.
    pub fn insert_prices_ignore(&mut self, rows: &[PriceRow]) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO prices (
                   ticker, price_date, open_price, high_price, low_price, close_price, volume
                 )
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(ticker, price_date) DO NOTHING",
            )?;
            for row in rows {
                inserted += stmt.execute(params![
                    row.ticker.as_str(),
                    row.trade_date.format("%Y-%m-%d").to_string(),
                    row.open,
                    row.high,
                    row.low,
                    row.close,
                    row.volume,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn list_tickers(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT ticker FROM stocks ORDER BY ticker")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut tickers = Vec::new();
        for row in rows {
            tickers.push(row?);
        }
        Ok(tickers)
    }

    pub fn price_count(&self, ticker: &str) -> Result<i64, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM prices WHERE ticker = ?1",
            params![ticker],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn latest_price_date(&self, ticker: &str) -> Result<Option<NaiveDate>, DbError> {
        let value: Option<String> = self.conn.query_row(
            "SELECT MAX(price_date) FROM prices WHERE ticker = ?1",
            params![ticker],
            |row| row.get(0),
        )?;
        let Some(value) = value else {
            return Ok(None);
        };
        Ok(Some(NaiveDate::parse_from_str(&value, "%Y-%m-%d")?))
    }

    pub fn list_stocks(&self) -> Result<Vec<StockRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT s.ticker, s.company_name, s.sector, s.industry, s.market_cap,
                    s.last_metadata_refresh, COUNT(p.price_date), MAX(p.price_date)
             FROM stocks s
             LEFT JOIN prices p ON p.ticker = s.ticker
             GROUP BY s.ticker
             ORDER BY s.ticker",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StockRow {
                ticker: row.get(0)?,
                company_name: row.get(1)?,
                sector: row.get(2)?,
                industry: row.get(3)?,
                market_cap: row.get(4)?,
                last_metadata_refresh: row.get(5)?,
                price_count: row.get(6)?,
                last_price_date: row.get(7)?,
            })
        })?;
        let mut stocks = Vec::new();
        for row in rows {
            stocks.push(row?);
        }
        Ok(stocks)
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    Ok(NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)?.and_utc())
}
