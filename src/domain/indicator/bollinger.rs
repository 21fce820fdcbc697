//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//! - Bandwidth: (Upper - Lower) / Middle, the volatility proxy
//! - %B: position of the last close inside the bands (0.5 when they collapse)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//! A StdDev within `FLAT_TOLERANCE` of the middle band counts as zero.
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) candles are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    IndicatorParams, IndicatorPoint, IndicatorSeries, IndicatorValue, snap_flat,
};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_STDDEV_MULT: f64 = 2.0;

pub fn calculate_bollinger(candles: &[Candle], period: usize, stddev_mult: f64) -> IndicatorSeries {
    let params = IndicatorParams::Bollinger {
        period,
        stddev_mult,
    };
    let mut values = Vec::with_capacity(candles.len());
    let warmup = period.saturating_sub(1);

    for (i, candle) in candles.iter().enumerate() {
        let valid = period > 0 && i >= warmup;

        let value = if valid {
            let window = &candles[i + 1 - period..=i];

            let middle: f64 = window.iter().map(|c| c.close).sum::<f64>() / period as f64;
            let variance: f64 = window
                .iter()
                .map(|c| {
                    let diff = c.close - middle;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;

            let stddev = snap_flat(variance.sqrt(), middle);
            let upper = middle + stddev_mult * stddev;
            let lower = middle - stddev_mult * stddev;
            let width = upper - lower;

            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
                bandwidth: if middle != 0.0 { width / middle } else { 0.0 },
                percent_b: if width > 0.0 {
                    (candle.close - lower) / width
                } else {
                    0.5
                },
            }
        } else {
            IndicatorValue::Bollinger {
                upper: 0.0,
                middle: 0.0,
                lower: 0.0,
                bandwidth: 0.0,
                percent_b: 0.5,
            }
        };

        values.push(IndicatorPoint {
            open_time: candle.open_time,
            valid,
            value,
        });
    }

    IndicatorSeries { params, values }
}
