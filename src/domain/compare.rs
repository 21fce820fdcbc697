//! Side-by-side runs of several strategies over the same history.
//!
//! Runs share only read-only inputs; each one owns its own simulator state,
//! so they execute in parallel without locking. Results come back in input
//! order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::backtest::{SimulationResult, run_backtest};
use crate::domain::candle::PriceSeries;
use crate::domain::error::PolyedgeError;
use crate::domain::market::MarketQuote;
use crate::domain::strategy::StrategyConfig;

pub fn run_many(
    series: &PriceSeries,
    quotes: &[MarketQuote],
    configs: &[StrategyConfig],
) -> Result<Vec<SimulationResult>, PolyedgeError> {
    configs
        .par_iter()
        .map(|config| run_backtest(series, quotes, config))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub name: String,
    pub run_id: String,
    pub total_trades: usize,
    pub win_rate: f64,
    pub total_pnl_pct: f64,
    pub final_capital: f64,
    pub max_drawdown: f64,
}

/// Rank by total return, then win rate, then name.
pub fn leaderboard(results: &[SimulationResult]) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<&SimulationResult> = results.iter().collect();
    ranked.sort_by(|a, b| {
        b.metrics
            .total_pnl_pct
            .total_cmp(&a.metrics.total_pnl_pct)
            .then_with(|| b.metrics.win_rate.total_cmp(&a.metrics.win_rate))
            .then_with(|| a.config.name.cmp(&b.config.name))
    });

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, r)| LeaderboardEntry {
            rank: i + 1,
            name: r.config.name.clone(),
            run_id: r.id.clone(),
            total_trades: r.metrics.total_trades,
            win_rate: r.metrics.win_rate,
            total_pnl_pct: r.metrics.total_pnl_pct,
            final_capital: r.final_capital,
            max_drawdown: r.metrics.max_drawdown,
        })
        .collect()
}
