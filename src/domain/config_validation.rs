//! Strategy configuration: parsing from a `ConfigPort` and validation.
//!
//! Validation runs once before a simulation starts; a config that passes is
//! never re-checked mid-run.

use crate::domain::error::PolyedgeError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::presets;
use crate::domain::probability::ModelWeights;
use crate::domain::strategy::{Approach, IndicatorConfig, StrategyConfig};
use crate::ports::config_port::ConfigPort;

const INDICATOR_SECTION_PREFIX: &str = "indicator.";

fn check(ok: bool, field: &str, reason: &str) -> Result<(), PolyedgeError> {
    if ok {
        Ok(())
    } else {
        Err(PolyedgeError::invalid(field, reason))
    }
}

pub fn validate_strategy_config(config: &StrategyConfig) -> Result<(), PolyedgeError> {
    validate_thresholds(config)?;
    validate_sizing(config)?;
    validate_indicators(config)?;
    validate_model(&config.model)?;
    validate_lookback(config)?;
    Ok(())
}

fn validate_thresholds(config: &StrategyConfig) -> Result<(), PolyedgeError> {
    check(!config.name.trim().is_empty(), "name", "must not be empty")?;
    check(
        (0.0..1.0).contains(&config.min_ev),
        "min_ev",
        "must be in [0, 1)",
    )?;
    check(
        (0.0..=1.0).contains(&config.min_confidence),
        "min_confidence",
        "must be in [0, 1]",
    )
}

fn validate_sizing(config: &StrategyConfig) -> Result<(), PolyedgeError> {
    check(
        config.initial_capital.is_finite() && config.initial_capital > 0.0,
        "initial_capital",
        "must be positive",
    )?;
    check(
        config.max_position_pct > 0.0 && config.max_position_pct <= 1.0,
        "max_position_pct",
        "must be in (0, 1]",
    )?;
    check(
        (0.0..1.0).contains(&config.fee_pct),
        "fee_pct",
        "must be in [0, 1)",
    )
}

fn validate_indicators(config: &StrategyConfig) -> Result<(), PolyedgeError> {
    check(
        config.enabled_indicators().next().is_some(),
        "indicators",
        "at least one indicator must be enabled",
    )?;
    for indicator in &config.indicators {
        validate_params(&indicator.params)?;
    }
    Ok(())
}

fn validate_params(params: &IndicatorParams) -> Result<(), PolyedgeError> {
    let field = |key: &str| format!("indicator.{}.{}", params.name(), key);
    let period = |key: &str, value: usize| check(value >= 1, &field(key), "must be at least 1");
    let ordered = |fast: usize, slow: usize| check(fast < slow, &field("fast"), "must be below slow");

    match *params {
        IndicatorParams::Rsi { period: p } => period("period", p),
        IndicatorParams::Macd { fast, slow, signal } => {
            period("fast", fast)?;
            period("slow", slow)?;
            period("signal", signal)?;
            ordered(fast, slow)
        }
        IndicatorParams::Bollinger {
            period: p,
            stddev_mult,
        } => {
            period("period", p)?;
            check(
                stddev_mult.is_finite() && stddev_mult > 0.0,
                &field("stddev_mult"),
                "must be positive",
            )
        }
        IndicatorParams::EmaCross { fast, slow } => {
            period("fast", fast)?;
            period("slow", slow)?;
            ordered(fast, slow)
        }
    }
}

fn validate_model(model: &ModelWeights) -> Result<(), PolyedgeError> {
    let nudge = |value: f64, key: &str| {
        check(
            (0.0..=0.5).contains(&value),
            &format!("model.{key}"),
            "must be in [0, 0.5]",
        )
    };
    nudge(model.momentum_weight, "momentum_weight")?;
    nudge(model.cross_bonus, "cross_bonus")?;
    nudge(model.reversion_weight, "reversion_weight")?;
    check(
        (0.0..50.0).contains(&model.rsi_neutral_band),
        "model.rsi_neutral_band",
        "must be in [0, 50)",
    )?;
    check(
        (0.0..0.5).contains(&model.bollinger_neutral_band),
        "model.bollinger_neutral_band",
        "must be in [0, 0.5)",
    )?;
    check(
        model.single_signal_confidence > 0.0 && model.single_signal_confidence <= 1.0,
        "model.single_signal_confidence",
        "must be in (0, 1]",
    )?;
    check(
        (0.0..=1.0).contains(&model.hybrid_momentum_weight),
        "model.hybrid_momentum_weight",
        "must be in [0, 1]",
    )?;
    check(
        model.auto_volatility_threshold.is_finite() && model.auto_volatility_threshold >= 0.0,
        "model.auto_volatility_threshold",
        "must be non-negative",
    )
}

fn validate_lookback(config: &StrategyConfig) -> Result<(), PolyedgeError> {
    let required = config.required_history();
    if config.lookback_candles != 0 && config.lookback_candles < required {
        return Err(PolyedgeError::invalid(
            "lookback_candles",
            format!("must be 0 or at least {required} for the enabled indicators"),
        ));
    }
    Ok(())
}

fn double(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, PolyedgeError> {
    config
        .get_double(section, key)
        .map_err(|reason| PolyedgeError::invalid(format!("{section}.{key}"), reason))
}

fn count(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<usize>, PolyedgeError> {
    let field = format!("{section}.{key}");
    let value = config
        .get_int(section, key)
        .map_err(|reason| PolyedgeError::invalid(field.as_str(), reason))?;
    value
        .map(|v| {
            usize::try_from(v).map_err(|_| PolyedgeError::invalid(field.as_str(), "must not be negative"))
        })
        .transpose()
}

fn allowed_keys(params: &IndicatorParams) -> &'static [&'static str] {
    match params {
        IndicatorParams::Rsi { .. } => &["enabled", "period"],
        IndicatorParams::Macd { .. } => &["enabled", "fast", "slow", "signal"],
        IndicatorParams::Bollinger { .. } => &["enabled", "period", "stddev_mult"],
        IndicatorParams::EmaCross { .. } => &["enabled", "fast", "slow"],
    }
}

/// Overlay `[indicator.<name>]` keys onto `base`.
fn parse_indicator(config: &dyn ConfigPort, base: IndicatorConfig) -> Result<IndicatorConfig, PolyedgeError> {
    let section = format!("{INDICATOR_SECTION_PREFIX}{}", base.params.name());
    let allowed = allowed_keys(&base.params);
    if let Some(unknown) = config.keys(&section).into_iter().find(|k| !allowed.contains(&k.as_str())) {
        return Err(PolyedgeError::invalid(
            format!("{section}.{unknown}"),
            "unknown parameter",
        ));
    }

    let get = |key: &str, current: usize| -> Result<usize, PolyedgeError> {
        Ok(count(config, &section, key)?.unwrap_or(current))
    };
    let params = match base.params {
        IndicatorParams::Rsi { period } => IndicatorParams::Rsi {
            period: get("period", period)?,
        },
        IndicatorParams::Macd { fast, slow, signal } => IndicatorParams::Macd {
            fast: get("fast", fast)?,
            slow: get("slow", slow)?,
            signal: get("signal", signal)?,
        },
        IndicatorParams::Bollinger {
            period,
            stddev_mult,
        } => IndicatorParams::Bollinger {
            period: get("period", period)?,
            stddev_mult: double(config, &section, "stddev_mult")?.unwrap_or(stddev_mult),
        },
        IndicatorParams::EmaCross { fast, slow } => IndicatorParams::EmaCross {
            fast: get("fast", fast)?,
            slow: get("slow", slow)?,
        },
    };

    let enabled = config
        .get_bool(&section, "enabled")
        .map_err(|reason| PolyedgeError::invalid(format!("{section}.enabled"), reason))?
        .unwrap_or(base.enabled);

    Ok(IndicatorConfig { enabled, params })
}

fn parse_indicator_list(config: &dyn ConfigPort, base: &[IndicatorConfig]) -> Result<Vec<IndicatorConfig>, PolyedgeError> {
    let listed: Vec<IndicatorConfig> = match config.get_string("strategy", "indicators") {
        None => base.to_vec(),
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                let lower = name.to_lowercase();
                base.iter()
                    .find(|i| i.params.name() == lower)
                    .copied()
                    .or_else(|| IndicatorParams::default_for(&lower).map(IndicatorConfig::enabled))
                    .ok_or_else(|| {
                        PolyedgeError::invalid("strategy.indicators", format!("unknown indicator '{name}'"))
                    })
            })
            .collect::<Result<_, _>>()?,
    };

    let unlisted = config.sections().into_iter().find(|section| {
        section
            .strip_prefix(INDICATOR_SECTION_PREFIX)
            .is_some_and(|name| !listed.iter().any(|i| i.params.name() == name))
    });
    if let Some(section) = unlisted {
        return Err(PolyedgeError::invalid(
            section,
            "indicator is not listed in [strategy] indicators",
        ));
    }

    listed
        .into_iter()
        .map(|indicator| parse_indicator(config, indicator))
        .collect()
}

fn parse_model(config: &dyn ConfigPort, base: ModelWeights) -> Result<ModelWeights, PolyedgeError> {
    let mut model = base;
    for key in config.keys("model") {
        let slot = match key.as_str() {
            "momentum_weight" => &mut model.momentum_weight,
            "cross_bonus" => &mut model.cross_bonus,
            "reversion_weight" => &mut model.reversion_weight,
            "rsi_neutral_band" => &mut model.rsi_neutral_band,
            "bollinger_neutral_band" => &mut model.bollinger_neutral_band,
            "single_signal_confidence" => &mut model.single_signal_confidence,
            "hybrid_momentum_weight" => &mut model.hybrid_momentum_weight,
            "auto_volatility_threshold" => &mut model.auto_volatility_threshold,
            other => {
                return Err(PolyedgeError::invalid(
                    format!("model.{other}"),
                    "unknown model parameter",
                ));
            }
        };
        if let Some(value) = double(config, "model", &key)? {
            *slot = value;
        }
    }
    Ok(model)
}

/// Build a validated `StrategyConfig` from a strategy file.
///
/// `[strategy] preset = <id>` starts from a preset; every other key overrides it.
/// Without a preset, `approach` is required.
pub fn parse_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, PolyedgeError> {
    let base = match config.get_string("strategy", "preset") {
        Some(id) => presets::get(&id)
            .map(|p| p.config)
            .ok_or_else(|| PolyedgeError::invalid("strategy.preset", format!("unknown preset '{id}'")))?,
        None => {
            let approach = config
                .get_string("strategy", "approach")
                .ok_or_else(|| PolyedgeError::ConfigMissing {
                    section: "strategy".to_string(),
                    key: "approach".to_string(),
                })?;
            let approach: Approach = approach
                .parse()
                .map_err(|reason: String| PolyedgeError::invalid("strategy.approach", reason))?;
            StrategyConfig::new("custom", approach, Vec::new())
        }
    };

    let approach = match config.get_string("strategy", "approach") {
        Some(a) => a
            .parse()
            .map_err(|reason: String| PolyedgeError::invalid("strategy.approach", reason))?,
        None => base.approach,
    };

    let strategy = StrategyConfig {
        name: config.get_string("strategy", "name").unwrap_or_else(|| base.name.clone()),
        approach,
        min_ev: double(config, "strategy", "min_ev")?.unwrap_or(base.min_ev),
        min_confidence: double(config, "strategy", "min_confidence")?.unwrap_or(base.min_confidence),
        indicators: parse_indicator_list(config, &base.indicators)?,
        initial_capital: double(config, "strategy", "initial_capital")?.unwrap_or(base.initial_capital),
        max_position_pct: double(config, "strategy", "max_position_pct")?
            .unwrap_or(base.max_position_pct),
        fee_pct: double(config, "strategy", "fee_pct")?.unwrap_or(base.fee_pct),
        lookback_candles: count(config, "strategy", "lookback_candles")?.unwrap_or(base.lookback_candles),
        model: parse_model(config, base.model)?,
    };

    validate_strategy_config(&strategy)?;
    Ok(strategy)
}
