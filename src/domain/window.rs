//! Synthetic market windows cut from a candle series.
//!
//! Used when no quote history is available: every wall-clock aligned window
//! becomes one market, decided at its open at a fixed market price and
//! resolved UP when the window's last close is above its first open.
//! Windows the series does not fully cover are left unresolved.

use chrono::{DateTime, Duration, Utc};

use crate::domain::candle::{Candle, PriceSeries};
use crate::domain::market::{Direction, MarketQuote};

pub const DEFAULT_WINDOW_MINUTES: i64 = 15;
pub const DEFAULT_MARKET_PRICE: f64 = 0.5;

fn window_start(open_time: DateTime<Utc>, window_secs: i64) -> i64 {
    open_time.timestamp().div_euclid(window_secs) * window_secs
}

fn outcome(candles: &[Candle], start: DateTime<Utc>, window: Duration, resolution: Duration) -> Option<Direction> {
    let first = candles.first()?;
    let last = candles.last()?;
    let expected = window.num_seconds() / resolution.num_seconds().max(1);
    let complete = first.open_time == start
        && last.open_time + resolution == start + window
        && candles.len() as i64 == expected;
    if !complete {
        return None;
    }
    Some(if last.close > first.open {
        Direction::Up
    } else {
        Direction::Down
    })
}

pub fn synthesize_quotes(series: &PriceSeries, window: Duration, market_price: f64) -> Vec<MarketQuote> {
    let window_secs = window.num_seconds();
    if window_secs <= 0 {
        return Vec::new();
    }
    let minutes = window.num_minutes();

    series
        .candles()
        .chunk_by(|a, b| window_start(a.open_time, window_secs) == window_start(b.open_time, window_secs))
        .filter_map(|chunk| {
            let start_secs = window_start(chunk.first()?.open_time, window_secs);
            let start = DateTime::from_timestamp(start_secs, 0)?;
            Some(MarketQuote {
                market_id: format!("{}-{}m-{}", series.asset(), minutes, start_secs),
                timestamp: start,
                resolution_time: start + window,
                market_price,
                outcome: outcome(chunk, start, window, series.resolution()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series_from(start_minute: i64, closes: &[f64]) -> PriceSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                open_time: DateTime::from_timestamp(1_735_689_600 + (start_minute + i as i64) * 60, 0)
                    .unwrap(),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 10.0,
            })
            .collect();
        PriceSeries::new("BTCUSDT", Duration::minutes(1), candles).unwrap()
    }

    #[test]
    fn cuts_aligned_windows() {
        let mut closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..15).map(|i| 200.0 - i as f64));
        let quotes = synthesize_quotes(&series_from(0, &closes), Duration::minutes(15), 0.5);

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].market_id, "BTCUSDT-15m-1735689600");
        assert_eq!(quotes[0].outcome, Some(Direction::Up));
        assert_eq!(quotes[1].outcome, Some(Direction::Down));
        assert_eq!(quotes[1].timestamp - quotes[0].timestamp, Duration::minutes(15));
        assert_eq!(quotes[0].resolution_time, quotes[1].timestamp);
        assert!(quotes.iter().all(|q| q.market_price == 0.5));
    }

    #[test]
    fn partial_windows_are_unresolved() {
        let closes = vec![100.0; 20];
        let quotes = synthesize_quotes(&series_from(5, &closes), Duration::minutes(15), 0.5);
        // minutes 5..15 and 15..25 of a 0..30 grid
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].outcome, None);
        assert_eq!(quotes[1].outcome, None);
    }

    #[test]
    fn outcome_compares_last_close_to_first_open() {
        // each candle opens 0.5 below its close
        let quotes = synthesize_quotes(&series_from(0, &[100.0; 15]), Duration::minutes(15), 0.5);
        assert_eq!(quotes[0].outcome, Some(Direction::Up));

        let mut closes = vec![100.0; 15];
        closes[14] = 99.5;
        let quotes = synthesize_quotes(&series_from(0, &closes), Duration::minutes(15), 0.5);
        assert_eq!(quotes[0].outcome, Some(Direction::Down));
    }

    #[test]
    fn non_positive_window_yields_nothing() {
        let s = series_from(0, &[100.0; 15]);
        assert!(synthesize_quotes(&s, Duration::zero(), 0.5).is_empty());
    }
}
