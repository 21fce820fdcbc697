//! Edge calculator: expected value of a binary bet and the trade decision.
//!
//! Buying the UP share at price `m` pays `1/m - 1` per unit staked when UP
//! wins and loses the stake otherwise, so with model probability `p`:
//!
//!   EV(UP)   = p * (1/m - 1) - (1 - p)
//!   EV(DOWN) = (1 - p) * (1/(1 - m) - 1) - p
//!
//! The bet direction is the side the edge points to (`p > m` is UP).

use serde::{Deserialize, Serialize};

use crate::domain::market::{Direction, is_degenerate_price};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalOutcome {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "NONE")]
    NoTrade,
}

impl SignalOutcome {
    pub fn direction(self) -> Option<Direction> {
        match self {
            SignalOutcome::Buy => Some(Direction::Up),
            SignalOutcome::Sell => Some(Direction::Down),
            SignalOutcome::NoTrade => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeThresholds {
    pub min_ev: f64,
    pub min_confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeAssessment {
    pub direction: Direction,
    pub expected_value: f64,
    pub outcome: SignalOutcome,
}

/// Price paid for one share of `direction` when the UP share trades at `market_price`.
pub fn entry_price(market_price: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Up => market_price,
        Direction::Down => 1.0 - market_price,
    }
}

/// Expected value per unit staked; `None` for a degenerate market.
pub fn expected_value(model_probability: f64, market_price: f64, direction: Direction) -> Option<f64> {
    if is_degenerate_price(market_price) {
        return None;
    }
    let price = entry_price(market_price, direction);
    let p_win = match direction {
        Direction::Up => model_probability,
        Direction::Down => 1.0 - model_probability,
    };
    Some(p_win * (1.0 / price - 1.0) - (1.0 - p_win))
}

/// Decide BUY / SELL / NONE for one window.
///
/// Returns `None` when the market price is 0, 1 or outside that range: the
/// window can not be traded and is reported as skipped by the caller.
pub fn assess(
    model_probability: f64,
    confidence: f64,
    market_price: f64,
    thresholds: &EdgeThresholds,
) -> Option<EdgeAssessment> {
    let direction = if model_probability >= market_price {
        Direction::Up
    } else {
        Direction::Down
    };
    let ev = expected_value(model_probability, market_price, direction)?;

    let has_edge = match direction {
        Direction::Up => model_probability > market_price,
        Direction::Down => model_probability < market_price,
    };
    let passes = has_edge && ev >= thresholds.min_ev && confidence >= thresholds.min_confidence;

    let outcome = match (passes, direction) {
        (true, Direction::Up) => SignalOutcome::Buy,
        (true, Direction::Down) => SignalOutcome::Sell,
        (false, _) => SignalOutcome::NoTrade,
    };

    Some(EdgeAssessment {
        direction,
        expected_value: ev,
        outcome,
    })
}
