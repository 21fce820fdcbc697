#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
pub use polyedge::domain::candle::{Candle, PriceSeries};
use polyedge::domain::error::PolyedgeError;
use polyedge::domain::indicator::IndicatorParams;
pub use polyedge::domain::market::{Direction, MarketQuote};
use polyedge::domain::strategy::{Approach, IndicatorConfig, StrategyConfig};
use polyedge::ports::price_port::PriceSource;
use polyedge::ports::quote_port::MarketQuoteSource;
use std::collections::HashMap;

/// 2025-01-01T00:00:00Z
pub const EPOCH: i64 = 1_735_689_600;

/// Closes that leave RSI(14) at exactly 20 after the 15th candle.
pub const OVERSOLD: [f64; 15] = [
    100.0, 101.0, 102.0, 101.0, 100.0, 99.0, 98.0, 97.0, 96.0, 95.0, 94.0, 94.0, 94.0, 94.0, 94.0,
];

pub fn minute(i: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(EPOCH + i * 60, 0).unwrap()
}

pub fn make_candle(i: i64, close: f64) -> Candle {
    Candle {
        open_time: minute(i),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1.0,
    }
}

/// One-minute candles starting at [`EPOCH`].
pub fn series(closes: &[f64]) -> PriceSeries {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_candle(i as i64, c))
        .collect();
    PriceSeries::new("BTCUSDT", Duration::minutes(1), candles).unwrap()
}

pub fn quote(id: &str, at: i64, price: f64, outcome: Option<Direction>) -> MarketQuote {
    MarketQuote {
        market_id: id.to_string(),
        timestamp: minute(at),
        resolution_time: minute(at + 15),
        market_price: price,
        outcome,
    }
}

pub fn rsi_reversion() -> StrategyConfig {
    StrategyConfig::new(
        "RSI Reversion",
        Approach::MeanReversion,
        vec![IndicatorConfig::enabled(IndicatorParams::RSI_DEFAULT)],
    )
}

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, asset: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(asset.to_string(), candles);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_series(
        &self,
        asset: &str,
        resolution: Duration,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries, PolyedgeError> {
        if let Some(reason) = self.errors.get(asset) {
            return Err(PolyedgeError::Data {
                reason: reason.clone(),
            });
        }
        let candles = self
            .data
            .get(asset)
            .map(|c| {
                c.iter()
                    .filter(|c| c.open_time >= start && c.open_time < end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        PriceSeries::new(asset, resolution, candles)
    }
}

pub struct MockQuoteSource {
    pub quotes: Vec<MarketQuote>,
}

impl MarketQuoteSource for MockQuoteSource {
    fn quote(
        &self,
        market_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<MarketQuote>, PolyedgeError> {
        Ok(self
            .quotes
            .iter()
            .find(|q| q.market_id == market_id && q.timestamp == timestamp)
            .cloned())
    }

    fn quotes(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MarketQuote>, PolyedgeError> {
        Ok(self
            .quotes
            .iter()
            .filter(|q| q.timestamp >= start && q.timestamp < end)
            .cloned()
            .collect())
    }
}
