//! Probability model: turns indicator readings into P(UP) and a confidence.
//!
//! Each defined reading is first interpreted as a vote (`IndicatorSignal`):
//! a direction bias and the amount it moves the probability away from 0.5.
//!
//! Momentum reads trends as confirmation. RSI above `50 + rsi_neutral_band`,
//! %B above `0.5 + bollinger_neutral_band`, a positive MACD histogram and a
//! fast EMA above the slow EMA each vote UP by `momentum_weight` (mirror
//! images vote DOWN). A fresh EMA cross in the vote's direction adds
//! `cross_bonus`.
//!
//! Mean reversion reads the same oscillators inversely and scales by how
//! extreme they are. RSI outside the neutral band votes toward 50 with
//! `reversion_weight * |50 - rsi| / 50`; %B votes toward the middle band with
//! `reversion_weight * |0.5 - %B| * 2` (capped at 1). MACD and EMA cross carry
//! no reversion information and do not vote.
//!
//! P(UP) = 0.5 + sum(sign * nudge), clipped to [0.01, 0.99].
//!
//! Confidence = (majority votes / votes) * (1 - (1 - single_signal_confidence)^votes),
//! so one lone vote scores `single_signal_confidence`, unanimous agreement
//! grows toward 1 with more votes, and split votes are discounted. No votes
//! means confidence 0.
//!
//! Hybrid blends both sub-models with `hybrid_momentum_weight`. Auto picks one
//! sub-model per window from the Bollinger bandwidth (see [`choose_sub_model`]).

use serde::{Deserialize, Serialize};

use crate::domain::candle::Candle;
use crate::domain::indicator::{self, CrossEvent, IndicatorParams, IndicatorReading, IndicatorValue};
use crate::domain::market::Direction;
use crate::domain::strategy::Approach;

pub const NEUTRAL_PROBABILITY: f64 = 0.5;
pub const MIN_PROBABILITY: f64 = 0.01;
pub const MAX_PROBABILITY: f64 = 0.99;

/// Tunable constants of the model; all deterministic, all documented above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelWeights {
    pub momentum_weight: f64,
    pub cross_bonus: f64,
    pub reversion_weight: f64,
    pub rsi_neutral_band: f64,
    pub bollinger_neutral_band: f64,
    pub single_signal_confidence: f64,
    pub hybrid_momentum_weight: f64,
    pub auto_volatility_threshold: f64,
}

impl Default for ModelWeights {
    fn default() -> Self {
        ModelWeights {
            momentum_weight: 0.08,
            cross_bonus: 0.04,
            reversion_weight: 0.20,
            rsi_neutral_band: 10.0,
            bollinger_neutral_band: 0.15,
            single_signal_confidence: 0.72,
            hybrid_momentum_weight: 0.5,
            auto_volatility_threshold: 0.004,
        }
    }
}

/// The sub-model actually applied to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubModel {
    Momentum,
    MeanReversion,
    Hybrid,
}

/// One indicator's vote: which way it leans and how far it moves P(UP).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSignal {
    pub params: IndicatorParams,
    pub direction: Direction,
    pub nudge: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityEstimate {
    pub probability: f64,
    pub confidence: f64,
    pub sub_model: SubModel,
    pub volatility: Option<f64>,
    pub signals: Vec<IndicatorSignal>,
}

impl ProbabilityEstimate {
    fn neutral(sub_model: SubModel, volatility: Option<f64>) -> Self {
        ProbabilityEstimate {
            probability: NEUTRAL_PROBABILITY,
            confidence: 0.0,
            sub_model,
            volatility,
            signals: Vec::new(),
        }
    }
}

/// Auto mode: quiet markets revert, volatile markets trend.
///
/// Bandwidth at or above `threshold` selects momentum; below it, or when no
/// bandwidth is available yet, mean reversion.
pub fn choose_sub_model(volatility: Option<f64>, threshold: f64) -> SubModel {
    match volatility {
        Some(v) if v >= threshold => SubModel::Momentum,
        _ => SubModel::MeanReversion,
    }
}

/// Bollinger bandwidth for the auto switch: taken from an enabled Bollinger
/// reading when one is defined, otherwise computed with default bands.
pub fn volatility_proxy(candles: &[Candle], readings: &[IndicatorReading]) -> Option<f64> {
    let from_reading = |r: &IndicatorReading| match r.value {
        Some(IndicatorValue::Bollinger { bandwidth, .. }) => Some(bandwidth),
        _ => None,
    };
    readings
        .iter()
        .find_map(from_reading)
        .or_else(|| from_reading(&indicator::reading(candles, IndicatorParams::BOLLINGER_DEFAULT)))
}

fn momentum_signal(reading: &IndicatorReading, w: &ModelWeights) -> Option<IndicatorSignal> {
    let direction = match reading.value? {
        IndicatorValue::Simple(rsi) => {
            if rsi > 50.0 + w.rsi_neutral_band {
                Direction::Up
            } else if rsi < 50.0 - w.rsi_neutral_band {
                Direction::Down
            } else {
                return None;
            }
        }
        IndicatorValue::Macd { histogram, .. } => {
            if histogram > 0.0 {
                Direction::Up
            } else if histogram < 0.0 {
                Direction::Down
            } else {
                return None;
            }
        }
        IndicatorValue::Bollinger { percent_b, .. } => {
            if percent_b > 0.5 + w.bollinger_neutral_band {
                Direction::Up
            } else if percent_b < 0.5 - w.bollinger_neutral_band {
                Direction::Down
            } else {
                return None;
            }
        }
        IndicatorValue::EmaCross { fast, slow, cross } => {
            let direction = if fast > slow {
                Direction::Up
            } else if fast < slow {
                Direction::Down
            } else {
                return None;
            };
            let fresh = matches!(
                (direction, cross),
                (Direction::Up, CrossEvent::CrossUp) | (Direction::Down, CrossEvent::CrossDown)
            );
            return Some(IndicatorSignal {
                params: reading.params,
                direction,
                nudge: w.momentum_weight + if fresh { w.cross_bonus } else { 0.0 },
            });
        }
    };
    Some(IndicatorSignal {
        params: reading.params,
        direction,
        nudge: w.momentum_weight,
    })
}

fn mean_reversion_signal(reading: &IndicatorReading, w: &ModelWeights) -> Option<IndicatorSignal> {
    let (distance, band, scale) = match reading.value? {
        // positive distance: oversold, expect a move up
        IndicatorValue::Simple(rsi) => (50.0 - rsi, w.rsi_neutral_band, 50.0),
        IndicatorValue::Bollinger { percent_b, .. } => (0.5 - percent_b, w.bollinger_neutral_band, 0.5),
        IndicatorValue::Macd { .. } | IndicatorValue::EmaCross { .. } => return None,
    };
    if distance.abs() <= band {
        return None;
    }
    let extremity = (distance.abs() / scale).min(1.0);
    Some(IndicatorSignal {
        params: reading.params,
        direction: if distance > 0.0 { Direction::Up } else { Direction::Down },
        nudge: w.reversion_weight * extremity,
    })
}

fn combine(signals: &[IndicatorSignal], w: &ModelWeights) -> (f64, f64) {
    if signals.is_empty() {
        return (NEUTRAL_PROBABILITY, 0.0);
    }
    let shift: f64 = signals.iter().map(|s| s.direction.sign() * s.nudge).sum();
    let probability = (NEUTRAL_PROBABILITY + shift).clamp(MIN_PROBABILITY, MAX_PROBABILITY);

    let votes = signals.len();
    let up = signals.iter().filter(|s| s.direction == Direction::Up).count();
    let majority = up.max(votes - up);
    let agreement = majority as f64 / votes as f64;
    let saturation = 1.0 - (1.0 - w.single_signal_confidence).powi(votes as i32);
    let confidence = (agreement * saturation).clamp(0.0, 1.0);

    (probability, confidence)
}

fn run_sub_model(
    readings: &[IndicatorReading],
    sub_model: SubModel,
    w: &ModelWeights,
) -> (f64, f64, Vec<IndicatorSignal>) {
    let interpret = |f: fn(&IndicatorReading, &ModelWeights) -> Option<IndicatorSignal>| {
        readings.iter().filter_map(|r| f(r, w)).collect::<Vec<_>>()
    };
    match sub_model {
        SubModel::Momentum => {
            let signals = interpret(momentum_signal);
            let (p, c) = combine(&signals, w);
            (p, c, signals)
        }
        SubModel::MeanReversion => {
            let signals = interpret(mean_reversion_signal);
            let (p, c) = combine(&signals, w);
            (p, c, signals)
        }
        SubModel::Hybrid => {
            let (pm, cm, mut signals) = run_sub_model(readings, SubModel::Momentum, w);
            let (pr, cr, reversion) = run_sub_model(readings, SubModel::MeanReversion, w);
            signals.extend(reversion);
            let k = w.hybrid_momentum_weight;
            (k * pm + (1.0 - k) * pr, k * cm + (1.0 - k) * cr, signals)
        }
    }
}

/// Estimate P(UP) for one window.
///
/// `volatility` is only consulted by [`Approach::Auto`]. When every reading
/// is undefined (or there are none) the estimate is 0.5 with confidence 0.
pub fn estimate(
    readings: &[IndicatorReading],
    approach: Approach,
    volatility: Option<f64>,
    weights: &ModelWeights,
) -> ProbabilityEstimate {
    let sub_model = match approach {
        Approach::Momentum => SubModel::Momentum,
        Approach::MeanReversion => SubModel::MeanReversion,
        Approach::Hybrid => SubModel::Hybrid,
        Approach::Auto => choose_sub_model(volatility, weights.auto_volatility_threshold),
    };

    if !readings.iter().any(IndicatorReading::is_defined) {
        return ProbabilityEstimate::neutral(sub_model, volatility);
    }

    let (probability, confidence, signals) = run_sub_model(readings, sub_model, weights);
    ProbabilityEstimate {
        probability,
        confidence,
        sub_model,
        volatility,
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rsi(value: f64) -> IndicatorReading {
        IndicatorReading {
            params: IndicatorParams::RSI_DEFAULT,
            value: Some(IndicatorValue::Simple(value)),
        }
    }

    fn macd(histogram: f64) -> IndicatorReading {
        IndicatorReading {
            params: IndicatorParams::MACD_DEFAULT,
            value: Some(IndicatorValue::Macd {
                line: histogram,
                signal: 0.0,
                histogram,
            }),
        }
    }

    fn bollinger(percent_b: f64, bandwidth: f64) -> IndicatorReading {
        IndicatorReading {
            params: IndicatorParams::BOLLINGER_DEFAULT,
            value: Some(IndicatorValue::Bollinger {
                upper: 102.0,
                middle: 100.0,
                lower: 98.0,
                bandwidth,
                percent_b,
            }),
        }
    }

    fn ema_cross(fast: f64, slow: f64, cross: CrossEvent) -> IndicatorReading {
        IndicatorReading {
            params: IndicatorParams::EMA_CROSS_DEFAULT,
            value: Some(IndicatorValue::EmaCross { fast, slow, cross }),
        }
    }

    fn w() -> ModelWeights {
        ModelWeights::default()
    }

    #[test]
    fn oversold_rsi_mean_reversion() {
        let e = estimate(&[rsi(20.0)], Approach::MeanReversion, None, &w());
        assert_abs_diff_eq!(e.probability, 0.62, epsilon = 1e-12);
        assert_abs_diff_eq!(e.confidence, 0.72, epsilon = 1e-12);
        assert_eq!(e.sub_model, SubModel::MeanReversion);
        assert_eq!(e.signals.len(), 1);
        assert_eq!(e.signals[0].direction, Direction::Up);
    }

    #[test]
    fn overbought_rsi_mean_reversion_points_down() {
        let e = estimate(&[rsi(85.0)], Approach::MeanReversion, None, &w());
        assert_abs_diff_eq!(e.probability, 0.5 - 0.2 * 0.7, epsilon = 1e-12);
    }

    #[test]
    fn neutral_rsi_casts_no_vote() {
        let e = estimate(&[rsi(50.0)], Approach::MeanReversion, None, &w());
        assert_eq!(e.probability, NEUTRAL_PROBABILITY);
        assert_eq!(e.confidence, 0.0);
        assert!(e.signals.is_empty());
    }

    #[test]
    fn all_undefined_is_no_opinion() {
        let readings = [
            IndicatorReading::undefined(IndicatorParams::RSI_DEFAULT),
            IndicatorReading::undefined(IndicatorParams::MACD_DEFAULT),
        ];
        for approach in [
            Approach::Momentum,
            Approach::MeanReversion,
            Approach::Hybrid,
            Approach::Auto,
        ] {
            let e = estimate(&readings, approach, None, &w());
            assert_eq!(e.probability, NEUTRAL_PROBABILITY);
            assert_eq!(e.confidence, 0.0);
        }
    }

    #[test]
    fn no_indicators_zero_confidence() {
        let e = estimate(&[], Approach::Momentum, None, &w());
        assert_eq!(e.confidence, 0.0);
        assert_eq!(e.probability, NEUTRAL_PROBABILITY);
    }

    #[test]
    fn momentum_trend_confirmation() {
        let readings = [macd(0.3), ema_cross(101.0, 100.0, CrossEvent::NoCross)];
        let e = estimate(&readings, Approach::Momentum, None, &w());
        assert_abs_diff_eq!(e.probability, 0.5 + 0.08 + 0.08, epsilon = 1e-12);
        assert_abs_diff_eq!(e.confidence, 1.0 - 0.28_f64.powi(2), epsilon = 1e-12);
    }

    #[test]
    fn fresh_cross_adds_bonus() {
        let readings = [ema_cross(101.0, 100.0, CrossEvent::CrossUp)];
        let e = estimate(&readings, Approach::Momentum, None, &w());
        assert_abs_diff_eq!(e.probability, 0.5 + 0.08 + 0.04, epsilon = 1e-12);
    }

    #[test]
    fn momentum_reads_rsi_as_strength() {
        let e = estimate(&[rsi(75.0)], Approach::Momentum, None, &w());
        assert!(e.probability > NEUTRAL_PROBABILITY);
        let e = estimate(&[rsi(75.0)], Approach::MeanReversion, None, &w());
        assert!(e.probability < NEUTRAL_PROBABILITY);
    }

    #[test]
    fn mean_reversion_ignores_trend_indicators() {
        let readings = [macd(1.0), ema_cross(105.0, 100.0, CrossEvent::CrossUp)];
        let e = estimate(&readings, Approach::MeanReversion, None, &w());
        assert_eq!(e.probability, NEUTRAL_PROBABILITY);
        assert_eq!(e.confidence, 0.0);
    }

    #[test]
    fn unanimous_beats_split() {
        let unanimous = estimate(
            &[macd(0.5), ema_cross(2.0, 1.0, CrossEvent::NoCross)],
            Approach::Momentum,
            None,
            &w(),
        );
        let split = estimate(
            &[macd(0.5), ema_cross(1.0, 2.0, CrossEvent::NoCross)],
            Approach::Momentum,
            None,
            &w(),
        );
        assert!(unanimous.confidence > split.confidence);
        assert_abs_diff_eq!(split.probability, NEUTRAL_PROBABILITY, epsilon = 1e-12);
    }

    #[test]
    fn probability_is_clipped() {
        let weights = ModelWeights {
            momentum_weight: 0.45,
            ..w()
        };
        let readings = [
            macd(1.0),
            ema_cross(2.0, 1.0, CrossEvent::CrossUp),
            rsi(90.0),
            bollinger(1.2, 0.05),
        ];
        let e = estimate(&readings, Approach::Momentum, None, &weights);
        assert_eq!(e.probability, MAX_PROBABILITY);
    }

    #[test]
    fn bollinger_extremity_is_capped() {
        let e = estimate(&[bollinger(-1.0, 0.01)], Approach::MeanReversion, None, &w());
        assert_abs_diff_eq!(e.probability, 0.5 + 0.2, epsilon = 1e-12);
    }

    #[test]
    fn hybrid_is_equal_weight_blend() {
        let readings = [rsi(20.0), macd(0.4)];
        let m = estimate(&readings, Approach::Momentum, None, &w());
        let r = estimate(&readings, Approach::MeanReversion, None, &w());
        let h = estimate(&readings, Approach::Hybrid, None, &w());
        assert_abs_diff_eq!(h.probability, (m.probability + r.probability) / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(h.confidence, (m.confidence + r.confidence) / 2.0, epsilon = 1e-12);
        assert_eq!(h.sub_model, SubModel::Hybrid);
    }

    #[test]
    fn choose_sub_model_thresholds() {
        assert_eq!(choose_sub_model(None, 0.004), SubModel::MeanReversion);
        assert_eq!(choose_sub_model(Some(0.001), 0.004), SubModel::MeanReversion);
        assert_eq!(choose_sub_model(Some(0.004), 0.004), SubModel::Momentum);
        assert_eq!(choose_sub_model(Some(0.02), 0.004), SubModel::Momentum);
    }

    #[test]
    fn auto_follows_volatility() {
        let readings = [rsi(20.0)];
        let quiet = estimate(&readings, Approach::Auto, Some(0.001), &w());
        let wild = estimate(&readings, Approach::Auto, Some(0.05), &w());
        assert_eq!(quiet.sub_model, SubModel::MeanReversion);
        assert_eq!(wild.sub_model, SubModel::Momentum);
        assert!(quiet.probability > NEUTRAL_PROBABILITY);
        assert!(wild.probability < NEUTRAL_PROBABILITY);
    }

    #[test]
    fn volatility_proxy_prefers_enabled_bollinger() {
        let readings = [bollinger(0.5, 0.123)];
        assert_eq!(volatility_proxy(&[], &readings), Some(0.123));
        assert_eq!(volatility_proxy(&[], &[rsi(40.0)]), None);
    }
}
