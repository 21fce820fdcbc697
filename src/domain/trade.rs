//! Signal decisions and the trades they open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::edge::{SignalOutcome, entry_price};
use crate::domain::indicator::IndicatorReading;
use crate::domain::market::Direction;
use crate::domain::probability::{IndicatorSignal, SubModel};

/// Everything the engine concluded about one window. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDecision {
    pub timestamp: DateTime<Utc>,
    pub market_id: String,
    pub market_price: f64,
    pub model_probability: f64,
    pub expected_value: f64,
    pub confidence: f64,
    pub outcome: SignalOutcome,
    /// Side the edge points to, whether or not a trade was placed.
    pub direction: Direction,
    pub sub_model: SubModel,
    pub contributing_readings: Vec<IndicatorReading>,
    /// How the model read each defined indicator; empty when none voted.
    pub signals: Vec<IndicatorSignal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeResult {
    Win,
    Loss,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub market_id: String,
    pub direction: Direction,
    /// Price of the share bought: the UP price for BUY, 1 - UP price for SELL.
    pub entry_price: f64,
    pub stake: f64,
    pub model_probability: f64,
    pub expected_value: f64,
    pub confidence: f64,
    pub result: TradeResult,
    pub pnl: f64,
    pub capital_after: f64,
    /// Position of the originating decision in `SimulationResult::decisions`.
    pub decision_index: usize,
}

impl Trade {
    /// Open a pending trade for a BUY or SELL decision. `None` for NONE.
    pub fn open(decision: &SignalDecision, decision_index: usize, stake: f64) -> Option<Self> {
        let direction = decision.outcome.direction()?;
        Some(Trade {
            timestamp: decision.timestamp,
            market_id: decision.market_id.clone(),
            direction,
            entry_price: entry_price(decision.market_price, direction),
            stake,
            model_probability: decision.model_probability,
            expected_value: decision.expected_value,
            confidence: decision.confidence,
            result: TradeResult::Pending,
            pnl: 0.0,
            capital_after: 0.0,
            decision_index,
        })
    }

    /// Settle against the realised outcome.
    ///
    /// A win pays `stake * (1/entry_price - 1)` less `fee_pct` of that gross
    /// amount; a loss forfeits the stake.
    pub fn resolve(self, outcome: Direction, fee_pct: f64) -> Self {
        let (result, pnl) = if outcome == self.direction {
            let gross = self.stake * (1.0 / self.entry_price - 1.0);
            (TradeResult::Win, gross * (1.0 - fee_pct))
        } else {
            (TradeResult::Loss, -self.stake)
        };
        Trade {
            result,
            pnl,
            ..self
        }
    }

    pub fn is_win(&self) -> bool {
        self.result == TradeResult::Win
    }
}
