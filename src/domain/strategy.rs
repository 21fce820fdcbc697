//! Strategy configuration: approach, thresholds, indicators and sizing.
//!
//! A `StrategyConfig` is validated once (see `config_validation`) and is then
//! read-only for the whole simulation run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::indicator::IndicatorParams;
use crate::domain::probability::ModelWeights;

pub const DEFAULT_MIN_EV: f64 = 0.08;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.65;
pub const DEFAULT_INITIAL_CAPITAL: f64 = 1000.0;
pub const DEFAULT_MAX_POSITION_PCT: f64 = 0.02;
pub const DEFAULT_LOOKBACK_CANDLES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    Momentum,
    MeanReversion,
    Hybrid,
    Auto,
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Approach::Momentum => "momentum",
            Approach::MeanReversion => "mean_reversion",
            Approach::Hybrid => "hybrid",
            Approach::Auto => "auto",
        };
        f.write_str(s)
    }
}

impl FromStr for Approach {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "momentum" => Ok(Approach::Momentum),
            "mean_reversion" | "mean-reversion" => Ok(Approach::MeanReversion),
            "hybrid" => Ok(Approach::Hybrid),
            "auto" => Ok(Approach::Auto),
            other => Err(format!("unknown approach '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub params: IndicatorParams,
}

impl IndicatorConfig {
    pub fn enabled(params: IndicatorParams) -> Self {
        Self {
            enabled: true,
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub approach: Approach,
    pub min_ev: f64,
    pub min_confidence: f64,
    pub indicators: Vec<IndicatorConfig>,
    pub initial_capital: f64,
    pub max_position_pct: f64,
    /// Fraction of gross winnings lost to fees and slippage on a winning trade.
    pub fee_pct: f64,
    /// Candles fed to the indicators per window; 0 means the whole history.
    pub lookback_candles: usize,
    pub model: ModelWeights,
}

impl StrategyConfig {
    pub fn new(
        name: impl Into<String>,
        approach: Approach,
        indicators: Vec<IndicatorConfig>,
    ) -> Self {
        StrategyConfig {
            name: name.into(),
            approach,
            min_ev: DEFAULT_MIN_EV,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            indicators,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            max_position_pct: DEFAULT_MAX_POSITION_PCT,
            fee_pct: 0.0,
            lookback_candles: DEFAULT_LOOKBACK_CANDLES,
            model: ModelWeights::default(),
        }
    }

    pub fn enabled_indicators(&self) -> impl Iterator<Item = IndicatorParams> + '_ {
        self.indicators
            .iter()
            .filter(|i| i.enabled)
            .map(|i| i.params)
    }

    /// Longest warm-up among enabled indicators.
    pub fn required_history(&self) -> usize {
        self.enabled_indicators()
            .map(|p| p.min_candles())
            .max()
            .unwrap_or(0)
    }
}
