//! OHLCV candles and the ordered price series they form.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::PolyedgeError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A missing stretch between two recorded candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
    pub missing: i64,
}

/// Candles for one asset at one resolution, strictly increasing by `open_time`.
///
/// The ordering is checked once on construction so every consumer can slice
/// by time with a binary search.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    asset: String,
    resolution: Duration,
    candles: Vec<Candle>,
}

impl PriceSeries {
    pub fn new(
        asset: impl Into<String>,
        resolution: Duration,
        candles: Vec<Candle>,
    ) -> Result<Self, PolyedgeError> {
        let asset = asset.into();
        if let Some(index) = candles
            .windows(2)
            .position(|w| w[1].open_time <= w[0].open_time)
        {
            return Err(PolyedgeError::UnorderedPriceSeries {
                asset,
                index: index + 1,
            });
        }
        Ok(Self {
            asset,
            resolution,
            candles,
        })
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Candles whose `open_time` is strictly before `cutoff`.
    pub fn before(&self, cutoff: DateTime<Utc>) -> &[Candle] {
        let end = self.candles.partition_point(|c| c.open_time < cutoff);
        &self.candles[..end]
    }

    /// Intervals where one or more candles are missing at this resolution.
    pub fn gaps(&self) -> Vec<Gap> {
        let step = self.resolution.num_seconds();
        if step <= 0 {
            return Vec::new();
        }
        self.candles
            .windows(2)
            .filter_map(|w| {
                let elapsed = (w[1].open_time - w[0].open_time).num_seconds();
                let missing = elapsed / step - 1;
                (missing > 0).then_some(Gap {
                    after: w[0].open_time,
                    before: w[1].open_time,
                    missing,
                })
            })
            .collect()
    }
}

/// The trailing run of `candles` with no missing candle at `resolution`.
///
/// A pair of neighbours at least two steps apart marks a gap, matching
/// [`PriceSeries::gaps`].
pub fn contiguous_tail(candles: &[Candle], resolution: Duration) -> &[Candle] {
    if resolution <= Duration::zero() {
        return candles;
    }
    let start = candles
        .windows(2)
        .rposition(|w| w[1].open_time - w[0].open_time >= resolution * 2)
        .map_or(0, |i| i + 1);
    &candles[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle_at(minute: i64, close: f64) -> Candle {
        Candle {
            open_time: DateTime::from_timestamp(1_735_689_600 + minute * 60, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err = PriceSeries::new(
            "BTCUSDT",
            Duration::minutes(1),
            vec![candle_at(0, 1.0), candle_at(1, 1.0), candle_at(1, 2.0)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PolyedgeError::UnorderedPriceSeries { index: 2, .. }
        ));
    }

    #[test]
    fn before_excludes_cutoff() {
        let series = PriceSeries::new(
            "BTCUSDT",
            Duration::minutes(1),
            (0..10).map(|i| candle_at(i, 100.0)).collect(),
        )
        .unwrap();
        let cutoff = candle_at(5, 0.0).open_time;
        assert_eq!(series.before(cutoff).len(), 5);
        assert_eq!(series.before(candle_at(-1, 0.0).open_time).len(), 0);
        assert_eq!(series.before(candle_at(100, 0.0).open_time).len(), 10);
    }

    #[test]
    fn gaps_are_reported_not_filled() {
        let series = PriceSeries::new(
            "BTCUSDT",
            Duration::minutes(1),
            vec![candle_at(0, 1.0), candle_at(1, 1.0), candle_at(4, 1.0)],
        )
        .unwrap();
        let gaps = series.gaps();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].missing, 2);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn contiguous_tail_starts_after_last_gap() {
        let step = Duration::minutes(1);
        let candles: Vec<Candle> = (0..10)
            .chain(20..33)
            .map(|i| candle_at(i, 1.0))
            .collect();
        let tail = contiguous_tail(&candles, step);
        assert_eq!(tail.len(), 13);
        assert_eq!(tail[0].open_time, candle_at(20, 0.0).open_time);

        let unbroken: Vec<Candle> = (0..10).map(|i| candle_at(i, 1.0)).collect();
        assert_eq!(contiguous_tail(&unbroken, step).len(), 10);
        assert!(contiguous_tail(&[], step).is_empty());
    }

    #[test]
    fn contiguous_tail_tolerates_jitter_below_two_steps() {
        let mut late = candle_at(3, 1.0);
        late.open_time += Duration::seconds(30);
        let candles = vec![candle_at(0, 1.0), candle_at(1, 1.0), candle_at(2, 1.0), late];
        assert_eq!(contiguous_tail(&candles, Duration::minutes(1)).len(), 4);
    }
}
