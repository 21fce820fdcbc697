//! Market quote port trait.

use crate::domain::error::PolyedgeError;
use crate::domain::market::MarketQuote;
use chrono::{DateTime, Utc};

pub trait MarketQuoteSource {
    /// The quote of `market_id` at `timestamp`, if one was recorded.
    fn quote(
        &self,
        market_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<MarketQuote>, PolyedgeError>;

    /// Every quote with `start <= timestamp < end`, ordered by time then market.
    fn quotes(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MarketQuote>, PolyedgeError>;
}
