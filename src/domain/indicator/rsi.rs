//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n candles
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If both averages are 0 (flat prices): RSI = 50
//!
//! Warmup: first n candles are invalid (need n price changes to compute initial average).

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorParams, IndicatorPoint, IndicatorSeries, IndicatorValue};

/// RSI reported when there is no movement at all.
pub const NEUTRAL_RSI: f64 = 50.0;

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { NEUTRAL_RSI } else { 100.0 }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(candles: &[Candle], period: usize) -> IndicatorSeries {
    let params = IndicatorParams::Rsi { period };

    if period == 0 || candles.len() < 2 {
        let values = candles
            .iter()
            .map(|c| IndicatorPoint {
                open_time: c.open_time,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            })
            .collect();
        return IndicatorSeries { params, values };
    }

    let mut values = Vec::with_capacity(candles.len());
    values.push(IndicatorPoint {
        open_time: candles[0].open_time,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    });

    let changes: Vec<f64> = candles.windows(2).map(|w| w[1].close - w[0].close).collect();
    let gain = |i: usize| changes[i].max(0.0);
    let loss = |i: usize| (-changes[i]).max(0.0);

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, candle) in candles.iter().enumerate().skip(1) {
        let change_idx = i - 1;

        if change_idx + 1 < period {
            values.push(IndicatorPoint {
                open_time: candle.open_time,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
            continue;
        }

        if change_idx + 1 == period {
            avg_gain = (0..period).map(gain).sum::<f64>() / period as f64;
            avg_loss = (0..period).map(loss).sum::<f64>() / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain(change_idx)) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss(change_idx)) / period as f64;
        }

        values.push(IndicatorPoint {
            open_time: candle.open_time,
            valid: true,
            value: IndicatorValue::Simple(rsi_from_averages(avg_gain, avg_loss).clamp(0.0, 100.0)),
        });
    }

    IndicatorSeries { params, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_candles;
    use proptest::prelude::*;

    fn simple(point: &IndicatorPoint) -> f64 {
        match point.value {
            IndicatorValue::Simple(v) => v,
            _ => panic!("Expected Simple value"),
        }
    }

    #[test]
    fn rsi_empty_candles() {
        let series = calculate_rsi(&[], 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_candle() {
        let series = calculate_rsi(&make_candles(&[100.0]), 14);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&make_candles(&prices), 14);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(!series.values[i].valid, "Candle {} should be invalid", i);
        }
        assert!(series.values[14].valid, "Candle 14 should be valid");
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_candles(&prices), 14);
        assert!((simple(&series.values[14]) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_candles(&prices), 14);
        assert!(simple(&series.values[14]).abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_constant_prices_is_neutral() {
        let series = calculate_rsi(&make_candles(&[100.0; 30]), 14);
        for point in series.values.iter().filter(|p| p.valid) {
            assert!((simple(point) - NEUTRAL_RSI).abs() < f64::EPSILON);
        }
        assert_eq!(series.values.iter().filter(|p| p.valid).count(), 16);
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&make_candles(&[100.0, 101.0]), 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsi_known_calculation() {
        let prices = [
            44.0, 44.25, 44.50, 43.75, 44.50, 44.25, 44.75, 45.25, 45.50, 45.25, 45.50, 46.0,
            46.25, 46.0, 46.50,
        ];
        let series = calculate_rsi(&make_candles(&prices), 14);

        assert!(series.values[14].valid);
        // gains sum to 4.0, losses to 1.5 over the 14 changes
        let expected = 100.0 - 100.0 / (1.0 + 4.0 / 1.5);
        assert!((simple(&series.values[14]) - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_wilder_smoothing_step() {
        let prices = [10.0, 11.0, 10.0, 12.0];
        let series = calculate_rsi(&make_candles(&prices), 2);

        // seed over changes [+1, -1]: gain 0.5, loss 0.5
        // next change +2: gain (0.5 + 2) / 2 = 1.25, loss 0.25
        let expected = 100.0 - 100.0 / (1.0 + 1.25 / 0.25);
        assert!((simple(&series.values[3]) - expected).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn rsi_bounded(prices in proptest::collection::vec(1.0f64..10_000.0, 2..120), period in 1usize..30) {
            let series = calculate_rsi(&make_candles(&prices), period);
            for point in series.values.iter().filter(|p| p.valid) {
                let v = simple(point);
                prop_assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
            }
        }
    }
}
