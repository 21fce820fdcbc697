//! Backtest simulator: replays indicators -> probability -> edge over
//! historical market windows and settles every bet against the known outcome.
//!
//! A run moves `Initialized -> Running -> Completed`, or to `Failed` when the
//! price series is empty. Per-window problems never abort a run; they are
//! recorded in `SimulationResult::skipped` with a [`SkipReason`].
//!
//! Indicators for a window only see candles that opened strictly before the
//! window's decision time (`MarketQuote::timestamp`), capped to the most recent
//! `lookback_candles`, and only the trailing run of those with no missing
//! candle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

use crate::domain::candle::{Candle, PriceSeries, contiguous_tail};
use crate::domain::config_validation::validate_strategy_config;
use crate::domain::edge::{self, EdgeThresholds, SignalOutcome};
use crate::domain::error::PolyedgeError;
use crate::domain::indicator::{self, IndicatorReading};
use crate::domain::market::MarketQuote;
use crate::domain::metrics::{CapitalPoint, SummaryMetrics};
use crate::domain::probability::{self, estimate};
use crate::domain::strategy::{Approach, StrategyConfig};
use crate::domain::trade::{SignalDecision, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunState {
    Initialized,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// No candle covers the interval right before the decision time, or
    /// missing candles leave too short a run for any indicator.
    DataGap,
    /// Market price at or beyond 0 or 1.
    DegenerateMarket,
    /// Every enabled indicator is still warming up.
    InsufficientHistory,
    /// The window has no realised outcome yet.
    Unresolved,
    /// A second quote for a market that was already evaluated.
    DuplicateWindow,
    /// Resolution time before the quote time.
    MalformedWindow,
    /// A trade was signalled but no capital is left to stake.
    InsufficientCapital,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::DataGap => "DATA_GAP",
            SkipReason::DegenerateMarket => "DEGENERATE_MARKET",
            SkipReason::InsufficientHistory => "INSUFFICIENT_HISTORY",
            SkipReason::Unresolved => "UNRESOLVED",
            SkipReason::DuplicateWindow => "DUPLICATE_WINDOW",
            SkipReason::MalformedWindow => "MALFORMED_WINDOW",
            SkipReason::InsufficientCapital => "INSUFFICIENT_CAPITAL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedWindow {
    pub timestamp: DateTime<Utc>,
    pub market_id: String,
    pub reason: SkipReason,
}

/// The self-contained record of one run. Field set is additive-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub id: String,
    pub config: StrategyConfig,
    pub asset: String,
    pub status: RunState,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub trades: Vec<Trade>,
    pub decisions: Vec<SignalDecision>,
    pub skipped: Vec<SkippedWindow>,
    pub capital_curve: Vec<CapitalPoint>,
    pub metrics: SummaryMetrics,
}

impl SimulationResult {
    /// The decision that opened `trade`.
    pub fn decision_for(&self, trade: &Trade) -> Option<&SignalDecision> {
        self.decisions.get(trade.decision_index)
    }
}

pub struct Simulator<'a> {
    id: String,
    series: &'a PriceSeries,
    config: &'a StrategyConfig,
    quotes: Vec<&'a MarketQuote>,
    state: RunState,
    capital: f64,
    seen: BTreeSet<&'a str>,
    trades: Vec<Trade>,
    decisions: Vec<SignalDecision>,
    skipped: Vec<SkippedWindow>,
    capital_curve: Vec<CapitalPoint>,
}

impl<'a> Simulator<'a> {
    /// Prepare a run. Quotes are replayed by `(timestamp, market_id)` whatever
    /// order they arrive in.
    pub fn new(
        series: &'a PriceSeries,
        quotes: &'a [MarketQuote],
        config: &'a StrategyConfig,
    ) -> Result<Self, PolyedgeError> {
        let mut ordered: Vec<&MarketQuote> = quotes.iter().collect();
        ordered.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.market_id.cmp(&b.market_id))
        });

        Ok(Simulator {
            id: run_id(series, quotes, config)?,
            series,
            config,
            quotes: ordered,
            state: RunState::Initialized,
            capital: config.initial_capital,
            seen: BTreeSet::new(),
            trades: Vec::new(),
            decisions: Vec::new(),
            skipped: Vec::new(),
            capital_curve: Vec::new(),
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn run(&mut self) -> Result<(), PolyedgeError> {
        if self.state != RunState::Initialized {
            return Err(PolyedgeError::Data {
                reason: format!("simulation {} was already started", self.id),
            });
        }
        if self.series.is_empty() {
            self.state = RunState::Failed;
            return Err(PolyedgeError::EmptyPriceSeries {
                asset: self.series.asset().to_string(),
            });
        }

        self.state = RunState::Running;
        info!(
            run_id = %self.id,
            strategy = %self.config.name,
            approach = %self.config.approach,
            candles = self.series.len(),
            windows = self.quotes.len(),
            "backtest started"
        );

        let quotes = std::mem::take(&mut self.quotes);
        for quote in quotes.iter().copied() {
            self.evaluate(quote);
        }
        self.quotes = quotes;

        self.state = RunState::Completed;
        info!(
            run_id = %self.id,
            trades = self.trades.len(),
            skipped = self.skipped.len(),
            final_capital = self.capital,
            "backtest completed"
        );
        Ok(())
    }

    /// Finalize the run; metrics are computed once here.
    pub fn into_result(self) -> SimulationResult {
        let metrics = SummaryMetrics::compute(
            &self.trades,
            self.config.initial_capital,
            &self.capital_curve,
            self.skipped.len(),
        );
        SimulationResult {
            id: self.id,
            config: self.config.clone(),
            asset: self.series.asset().to_string(),
            status: self.state,
            initial_capital: self.config.initial_capital,
            final_capital: self.capital,
            trades: self.trades,
            decisions: self.decisions,
            skipped: self.skipped,
            capital_curve: self.capital_curve,
            metrics,
        }
    }

    fn skip(&mut self, quote: &MarketQuote, reason: SkipReason) {
        warn!(
            market_id = %quote.market_id,
            timestamp = %quote.timestamp,
            %reason,
            "window skipped"
        );
        self.skipped.push(SkippedWindow {
            timestamp: quote.timestamp,
            market_id: quote.market_id.clone(),
            reason,
        });
    }

    /// Candles visible at the decision time, capped to the lookback.
    fn history(&self, decision_time: DateTime<Utc>) -> &'a [Candle] {
        let visible = self.series.before(decision_time);
        match self.config.lookback_candles {
            0 => visible,
            n => &visible[visible.len().saturating_sub(n)..],
        }
    }

    fn evaluate(&mut self, quote: &'a MarketQuote) {
        if !self.seen.insert(quote.market_id.as_str()) {
            return self.skip(quote, SkipReason::DuplicateWindow);
        }
        if quote.resolution_time < quote.timestamp {
            return self.skip(quote, SkipReason::MalformedWindow);
        }
        let Some(outcome) = quote.outcome else {
            return self.skip(quote, SkipReason::Unresolved);
        };

        let history = self.history(quote.timestamp);
        let resolution = self.series.resolution();
        if history
            .last()
            .is_none_or(|last| last.open_time + resolution < quote.timestamp)
        {
            return self.skip(quote, SkipReason::DataGap);
        }

        // indicators never read across missing candles
        let contiguous = contiguous_tail(history, resolution);
        let readings: Vec<IndicatorReading> = self
            .config
            .enabled_indicators()
            .map(|params| indicator::reading(contiguous, params))
            .collect();
        if !readings.iter().any(IndicatorReading::is_defined) {
            let reason = if contiguous.len() < history.len() {
                SkipReason::DataGap
            } else {
                SkipReason::InsufficientHistory
            };
            return self.skip(quote, reason);
        }

        let volatility = match self.config.approach {
            Approach::Auto => probability::volatility_proxy(contiguous, &readings),
            _ => None,
        };
        let forecast = estimate(&readings, self.config.approach, volatility, &self.config.model);

        let thresholds = EdgeThresholds {
            min_ev: self.config.min_ev,
            min_confidence: self.config.min_confidence,
        };
        let Some(assessment) = edge::assess(
            forecast.probability,
            forecast.confidence,
            quote.market_price,
            &thresholds,
        ) else {
            return self.skip(quote, SkipReason::DegenerateMarket);
        };

        let decision = SignalDecision {
            timestamp: quote.timestamp,
            market_id: quote.market_id.clone(),
            market_price: quote.market_price,
            model_probability: forecast.probability,
            expected_value: assessment.expected_value,
            confidence: forecast.confidence,
            outcome: assessment.outcome,
            direction: assessment.direction,
            sub_model: forecast.sub_model,
            contributing_readings: readings,
            signals: forecast.signals,
        };
        debug!(
            market_id = %decision.market_id,
            probability = decision.model_probability,
            confidence = decision.confidence,
            ev = decision.expected_value,
            outcome = ?decision.outcome,
            "window evaluated"
        );

        let decision_index = self.decisions.len();
        self.decisions.push(decision);
        if assessment.outcome == SignalOutcome::NoTrade {
            return;
        }
        if self.capital <= 0.0 {
            return self.skip(quote, SkipReason::InsufficientCapital);
        }

        let stake = (self.config.max_position_pct * self.capital).min(self.capital);
        let Some(trade) = Trade::open(&self.decisions[decision_index], decision_index, stake) else {
            return;
        };
        let mut trade = trade.resolve(outcome, self.config.fee_pct);
        self.capital = (self.capital + trade.pnl).max(0.0);
        trade.capital_after = self.capital;

        self.capital_curve.push(CapitalPoint {
            timestamp: trade.timestamp,
            capital: self.capital,
        });
        self.trades.push(trade);
    }
}

/// Replay `config` over `quotes` using `series` for indicator history.
///
/// The config is validated before anything runs; an empty price series fails
/// the run. Zero quotes is a valid, empty run.
pub fn run_backtest(
    series: &PriceSeries,
    quotes: &[MarketQuote],
    config: &StrategyConfig,
) -> Result<SimulationResult, PolyedgeError> {
    validate_strategy_config(config)?;
    let mut simulator = Simulator::new(series, quotes, config)?;
    simulator.run()?;
    Ok(simulator.into_result())
}

/// Stable run identifier: FNV-1a over the config and the shape of the inputs.
fn run_id(
    series: &PriceSeries,
    quotes: &[MarketQuote],
    config: &StrategyConfig,
) -> Result<String, PolyedgeError> {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut bytes = serde_json::to_vec(config)?;
    bytes.extend_from_slice(series.asset().as_bytes());
    bytes.extend_from_slice(&(series.len() as u64).to_le_bytes());
    for candle in [series.candles().first(), series.candles().last()]
        .into_iter()
        .flatten()
    {
        bytes.extend_from_slice(&candle.open_time.timestamp_millis().to_le_bytes());
    }
    bytes.extend_from_slice(&(quotes.len() as u64).to_le_bytes());

    let hash = bytes
        .iter()
        .fold(OFFSET, |h, &b| (h ^ u64::from(b)).wrapping_mul(PRIME));
    Ok(format!("sim-{hash:016x}"))
}
