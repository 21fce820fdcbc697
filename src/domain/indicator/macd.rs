//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Line and histogram within `FLAT_TOLERANCE` of the price are reported as 0.
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: slow - 1 + signal - 1 candles.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    IndicatorParams, IndicatorPoint, IndicatorSeries, IndicatorValue, calculate_ema, snap_flat,
};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let params = IndicatorParams::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if candles.is_empty() || fast == 0 || slow == 0 || signal_period == 0 || fast > slow {
        return IndicatorSeries {
            params,
            values: Vec::new(),
        };
    }

    let ema_fast = calculate_ema(candles, fast);
    let ema_slow = calculate_ema(candles, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => snap_flat(f - s, *s),
            _ => 0.0,
        })
        .collect();

    let k = 2.0 / (signal_period as f64 + 1.0);
    let mut signal_line: Vec<f64> = vec![0.0; candles.len()];
    let macd_warmup = slow - 1;

    if macd_warmup + signal_period <= candles.len() {
        let seed_end = macd_warmup + signal_period;
        let mut signal_ema =
            macd_line[macd_warmup..seed_end].iter().sum::<f64>() / signal_period as f64;
        signal_line[seed_end - 1] = signal_ema;

        for i in seed_end..candles.len() {
            signal_ema = macd_line[i] * k + signal_ema * (1.0 - k);
            signal_line[i] = signal_ema;
        }
    }

    let signal_warmup = slow - 1 + signal_period - 1;

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let line = macd_line[i];
            let signal = signal_line[i];
            IndicatorPoint {
                open_time: candle.open_time,
                valid: i >= signal_warmup,
                value: IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: snap_flat(line - signal, candle.close),
                },
            }
        })
        .collect();

    IndicatorSeries { params, values }
}

pub fn calculate_macd_default(candles: &[Candle]) -> IndicatorSeries {
    calculate_macd(candles, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
