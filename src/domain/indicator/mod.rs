//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorParams`: indicator identity + validated parameters
//! - `IndicatorPoint`: a single point in an indicator time series
//! - `IndicatorValue`: enum for the different indicator output shapes
//! - `IndicatorSeries`: a time series of indicator values
//! - `IndicatorReading`: the latest point of a series, or undefined
//!
//! Every calculation is pure: it borrows the candles and never mutates them.

pub mod bollinger;
pub mod ema;
pub mod ema_cross;
pub mod macd;
pub mod rsi;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::candle::Candle;

pub use ema::calculate_ema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum IndicatorParams {
    Rsi {
        period: usize,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult: f64,
    },
    EmaCross {
        fast: usize,
        slow: usize,
    },
}

impl IndicatorParams {
    pub const RSI_DEFAULT: Self = IndicatorParams::Rsi { period: 14 };
    pub const MACD_DEFAULT: Self = IndicatorParams::Macd {
        fast: macd::DEFAULT_FAST,
        slow: macd::DEFAULT_SLOW,
        signal: macd::DEFAULT_SIGNAL,
    };
    pub const BOLLINGER_DEFAULT: Self = IndicatorParams::Bollinger {
        period: bollinger::DEFAULT_PERIOD,
        stddev_mult: bollinger::DEFAULT_STDDEV_MULT,
    };
    pub const EMA_CROSS_DEFAULT: Self = IndicatorParams::EmaCross {
        fast: ema_cross::DEFAULT_FAST,
        slow: ema_cross::DEFAULT_SLOW,
    };

    /// Default parameters for an indicator name as written in config files.
    pub fn default_for(name: &str) -> Option<Self> {
        match name {
            "rsi" => Some(Self::RSI_DEFAULT),
            "macd" => Some(Self::MACD_DEFAULT),
            "bollinger" => Some(Self::BOLLINGER_DEFAULT),
            "ema_cross" => Some(Self::EMA_CROSS_DEFAULT),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndicatorParams::Rsi { .. } => "rsi",
            IndicatorParams::Macd { .. } => "macd",
            IndicatorParams::Bollinger { .. } => "bollinger",
            IndicatorParams::EmaCross { .. } => "ema_cross",
        }
    }

    /// Number of candles required before the indicator yields a defined value.
    pub fn min_candles(&self) -> usize {
        match *self {
            IndicatorParams::Rsi { period } => period + 1,
            IndicatorParams::Macd { slow, signal, .. } => (slow + signal).saturating_sub(1),
            IndicatorParams::Bollinger { period, .. } => period,
            IndicatorParams::EmaCross { slow, .. } => slow,
        }
    }
}

impl fmt::Display for IndicatorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorParams::Rsi { period } => write!(f, "RSI({})", period),
            IndicatorParams::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorParams::Bollinger {
                period,
                stddev_mult,
            } => write!(f, "BOLLINGER({},{})", period, stddev_mult),
            IndicatorParams::EmaCross { fast, slow } => write!(f, "EMA_CROSS({},{})", fast, slow),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossEvent {
    CrossUp,
    CrossDown,
    NoCross,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
        bandwidth: f64,
        percent_b: f64,
    },
    EmaCross {
        fast: f64,
        slow: f64,
        cross: CrossEvent,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub open_time: DateTime<Utc>,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub params: IndicatorParams,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// The last point, if it is past warm-up.
    pub fn latest(&self) -> Option<IndicatorValue> {
        self.values.last().filter(|p| p.valid).map(|p| p.value)
    }
}

/// Latest value of one indicator at a window's decision time.
///
/// `value == None` is the "undefined" reading: not enough history, or no
/// candles at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub params: IndicatorParams,
    pub value: Option<IndicatorValue>,
}

impl IndicatorReading {
    pub fn undefined(params: IndicatorParams) -> Self {
        Self {
            params,
            value: None,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }

    /// Flattened `name -> value` view, e.g. `macd.histogram`.
    pub fn fields(&self) -> BTreeMap<String, f64> {
        let name = self.params.name();
        let mut out = BTreeMap::new();
        let mut put = |field: &str, v: f64| {
            out.insert(format!("{name}.{field}"), v);
        };
        match self.value {
            None => {}
            Some(IndicatorValue::Simple(v)) => put("value", v),
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) => {
                put("macd_line", line);
                put("signal_line", signal);
                put("histogram", histogram);
            }
            Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
                bandwidth,
                percent_b,
            }) => {
                put("upper", upper);
                put("mid", middle);
                put("lower", lower);
                put("bandwidth", bandwidth);
                put("percent_b", percent_b);
            }
            Some(IndicatorValue::EmaCross { fast, slow, cross }) => {
                put("fast", fast);
                put("slow", slow);
                let event = match cross {
                    CrossEvent::CrossUp => 1.0,
                    CrossEvent::CrossDown => -1.0,
                    CrossEvent::NoCross => 0.0,
                };
                put("cross", event);
            }
        }
        out
    }
}

pub fn calculate(candles: &[Candle], params: IndicatorParams) -> IndicatorSeries {
    match params {
        IndicatorParams::Rsi { period } => rsi::calculate_rsi(candles, period),
        IndicatorParams::Macd { fast, slow, signal } => {
            macd::calculate_macd(candles, fast, slow, signal)
        }
        IndicatorParams::Bollinger {
            period,
            stddev_mult,
        } => bollinger::calculate_bollinger(candles, period, stddev_mult),
        IndicatorParams::EmaCross { fast, slow } => {
            ema_cross::calculate_ema_cross(candles, fast, slow)
        }
    }
}

/// Relative tolerance below which a spread is rounding noise on the price scale.
pub const FLAT_TOLERANCE: f64 = 1e-12;

/// `value`, or exactly 0 when it is within [`FLAT_TOLERANCE`] of `scale`.
///
/// Averages of a constant, non-representable price (100.1, 0.3) are off by an
/// ulp, so spreads between them come out as tiny non-zero numbers.
pub fn snap_flat(value: f64, scale: f64) -> f64 {
    if value.abs() <= scale.abs() * FLAT_TOLERANCE {
        0.0
    } else {
        value
    }
}

/// Reading of `params` as of the last candle in `candles`.
pub fn reading(candles: &[Candle], params: IndicatorParams) -> IndicatorReading {
    if candles.len() < params.min_candles() {
        return IndicatorReading::undefined(params);
    }
    IndicatorReading {
        params,
        value: calculate(candles, params).latest(),
    }
}
