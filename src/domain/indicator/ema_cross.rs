//! EMA crossover: a fast and a slow EMA plus the cross event on the last candle.
//!
//! A cross up happens when fast - slow moves from <= 0 to > 0 between two
//! consecutive candles, a cross down when it moves from >= 0 to < 0.
//! Warmup: first (slow-1) candles are invalid; the first valid candle can not
//! report a cross because there is no previous spread.
//! A spread within `FLAT_TOLERANCE` of the slow EMA is 0 and the fast EMA is
//! reported equal to the slow one.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    CrossEvent, IndicatorParams, IndicatorPoint, IndicatorSeries, IndicatorValue, calculate_ema,
    snap_flat,
};

pub const DEFAULT_FAST: usize = 9;
pub const DEFAULT_SLOW: usize = 21;

pub fn calculate_ema_cross(candles: &[Candle], fast: usize, slow: usize) -> IndicatorSeries {
    let params = IndicatorParams::EmaCross { fast, slow };

    if candles.is_empty() || fast == 0 || slow == 0 {
        return IndicatorSeries {
            params,
            values: Vec::new(),
        };
    }

    let ema_fast = calculate_ema(candles, fast);
    let ema_slow = calculate_ema(candles, slow);
    let mut prev_spread: Option<f64> = None;

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| match (ema_fast[i], ema_slow[i]) {
            (Some(f), Some(s)) => {
                let spread = snap_flat(f - s, s);
                let f = if spread == 0.0 { s } else { f };
                let cross = match prev_spread {
                    Some(prev) if prev <= 0.0 && spread > 0.0 => CrossEvent::CrossUp,
                    Some(prev) if prev >= 0.0 && spread < 0.0 => CrossEvent::CrossDown,
                    _ => CrossEvent::NoCross,
                };
                prev_spread = Some(spread);
                IndicatorPoint {
                    open_time: candle.open_time,
                    valid: true,
                    value: IndicatorValue::EmaCross {
                        fast: f,
                        slow: s,
                        cross,
                    },
                }
            }
            _ => IndicatorPoint {
                open_time: candle.open_time,
                valid: false,
                value: IndicatorValue::EmaCross {
                    fast: 0.0,
                    slow: 0.0,
                    cross: CrossEvent::NoCross,
                },
            },
        })
        .collect();

    IndicatorSeries { params, values }
}
