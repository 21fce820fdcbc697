//! Price data port trait.

use crate::domain::candle::PriceSeries;
use crate::domain::error::PolyedgeError;
use chrono::{DateTime, Duration, Utc};

pub trait PriceSource {
    /// Candles for `asset` with `start <= open_time < end`, ordered.
    ///
    /// Missing candles stay missing; implementations never interpolate.
    fn fetch_series(
        &self,
        asset: &str,
        resolution: Duration,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<PriceSeries, PolyedgeError>;
}
