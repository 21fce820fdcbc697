//! Ready-made strategies, usable as-is or as the base of a strategy file.

use crate::domain::indicator::IndicatorParams;
use crate::domain::strategy::{Approach, IndicatorConfig, StrategyConfig};

/// Fee and slippage charged on winnings by every preset.
pub const PRESET_FEE_PCT: f64 = 0.01;

pub struct Preset {
    pub id: &'static str,
    pub description: &'static str,
    pub config: StrategyConfig,
}

fn preset(id: &'static str, description: &'static str, mut config: StrategyConfig) -> Preset {
    config.fee_pct = PRESET_FEE_PCT;
    Preset {
        id,
        description,
        config,
    }
}

fn conservative_mean_reversion() -> Preset {
    let mut config = StrategyConfig::new(
        "Conservative Mean Reversion",
        Approach::MeanReversion,
        vec![
            IndicatorConfig::enabled(IndicatorParams::RSI_DEFAULT),
            IndicatorConfig::enabled(IndicatorParams::BOLLINGER_DEFAULT),
        ],
    );
    config.min_ev = 0.10;
    config.min_confidence = 0.70;
    preset(
        "conservative_mean_reversion",
        "Bets on a return to the mean when RSI and Bollinger Bands agree on an excess. Few signals, high confidence.",
        config,
    )
}

fn balanced_momentum() -> Preset {
    preset(
        "balanced_momentum",
        "Follows the trend, with RSI and MACD confirming momentum. More signals than the conservative preset.",
        StrategyConfig::new(
            "Balanced Momentum",
            Approach::Momentum,
            vec![
                IndicatorConfig::enabled(IndicatorParams::RSI_DEFAULT),
                IndicatorConfig::enabled(IndicatorParams::MACD_DEFAULT),
            ],
        ),
    )
}

fn aggressive_scalper() -> Preset {
    let mut config = StrategyConfig::new(
        "Aggressive Scalper",
        Approach::Momentum,
        vec![
            IndicatorConfig::enabled(IndicatorParams::Rsi { period: 7 }),
            IndicatorConfig::enabled(IndicatorParams::Macd {
                fast: 8,
                slow: 17,
                signal: 9,
            }),
        ],
    );
    config.min_ev = 0.05;
    config.min_confidence = 0.60;
    config.max_position_pct = 0.03;
    preset(
        "aggressive_scalper",
        "Fast indicators and low thresholds. Many trades, higher risk.",
        config,
    )
}

pub fn all() -> Vec<Preset> {
    vec![
        conservative_mean_reversion(),
        balanced_momentum(),
        aggressive_scalper(),
    ]
}

pub fn get(id: &str) -> Option<Preset> {
    all().into_iter().find(|p| p.id == id)
}
