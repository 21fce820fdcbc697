//! CSV file adapters for candles and market quotes.
//!
//! Candle files: `open_time,open,high,low,close,volume`.
//! Quote files: `market_id,timestamp,resolution_time,market_price,outcome`,
//! where an empty outcome marks an unresolved window.
//! Timestamps are RFC 3339 or integer epoch milliseconds.

use crate::domain::candle::{Candle, PriceSeries};
use crate::domain::error::PolyedgeError;
use crate::domain::market::{Direction, MarketQuote};
use crate::ports::price_port::PriceSource;
use crate::ports::quote_port::MarketQuoteSource;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

fn data_error(path: &Path, reason: impl std::fmt::Display) -> PolyedgeError {
    PolyedgeError::Data {
        reason: format!("{}: {}", path.display(), reason),
    }
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| format!("timestamp {millis} out of range"));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{value}': {e}"))
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, PolyedgeError> {
    let content = fs::read_to_string(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    rdr.deserialize()
        .enumerate()
        .map(|(i, row)| row.map_err(|e| data_error(path, format!("row {}: {e}", i + 1))))
        .collect()
}

#[derive(Debug, Deserialize)]
struct CandleRow {
    open_time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// One candle file per asset.
pub struct CsvPriceAdapter {
    path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The whole file as one series.
    pub fn load_all(&self, asset: &str, resolution: Duration) -> Result<PriceSeries, PolyedgeError> {
        self.fetch_series(asset, resolution, DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
    }
}

impl PriceSource for CsvPriceAdapter {
    fn fetch_series(
        &self,
        asset: &str,
        resolution: Duration,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries, PolyedgeError> {
        let mut candles = Vec::new();
        for (i, row) in read_rows::<CandleRow>(&self.path)?.into_iter().enumerate() {
            let open_time = parse_timestamp(&row.open_time).map_err(|e| data_error(&self.path, e))?;
            if [row.open, row.high, row.low, row.close, row.volume]
                .iter()
                .any(|v| !v.is_finite())
            {
                return Err(data_error(
                    &self.path,
                    format!("row {}: non-finite price or volume", i + 1),
                ));
            }
            if open_time < start || open_time >= end {
                continue;
            }
            candles.push(Candle {
                open_time,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }
        candles.sort_by_key(|c| c.open_time);
        PriceSeries::new(asset, resolution, candles)
    }
}

#[derive(Debug, Deserialize)]
struct QuoteRow {
    market_id: String,
    timestamp: String,
    resolution_time: String,
    market_price: f64,
    #[serde(default)]
    outcome: Option<String>,
}

pub struct CsvQuoteAdapter {
    path: PathBuf,
}

impl CsvQuoteAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load_all(&self) -> Result<Vec<MarketQuote>, PolyedgeError> {
        self.quotes(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
    }

    fn parse_row(&self, row: QuoteRow) -> Result<MarketQuote, PolyedgeError> {
        let outcome = match row.outcome.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(s.parse::<Direction>().map_err(|e| data_error(&self.path, e))?),
        };
        Ok(MarketQuote {
            timestamp: parse_timestamp(&row.timestamp).map_err(|e| data_error(&self.path, e))?,
            resolution_time: parse_timestamp(&row.resolution_time)
                .map_err(|e| data_error(&self.path, e))?,
            market_id: row.market_id,
            market_price: row.market_price,
            outcome,
        })
    }
}

impl MarketQuoteSource for CsvQuoteAdapter {
    fn quote(
        &self,
        market_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<MarketQuote>, PolyedgeError> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|q| q.market_id == market_id && q.timestamp == timestamp))
    }

    fn quotes(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MarketQuote>, PolyedgeError> {
        let mut quotes = read_rows::<QuoteRow>(&self.path)?
            .into_iter()
            .map(|row| self.parse_row(row))
            .filter(|q| {
                q.as_ref()
                    .map_or(true, |q| q.timestamp >= start && q.timestamp < end)
            })
            .collect::<Result<Vec<_>, _>>()?;
        quotes.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.market_id.cmp(&b.market_id))
        });
        Ok(quotes)
    }
}
