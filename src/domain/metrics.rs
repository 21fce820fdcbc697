//! Summary statistics of a finished simulation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::trade::{Trade, TradeResult};

/// Capital right after a trade resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalPoint {
    pub timestamp: DateTime<Utc>,
    pub capital: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    /// `total_pnl` as a fraction of initial capital.
    pub total_pnl_pct: f64,
    pub avg_win: f64,
    /// Mean size of a losing trade, as a positive number.
    pub avg_loss: f64,
    /// Mean EV the model expected per unit staked.
    pub avg_ev_expected: f64,
    /// Mean P&L actually realised per unit staked.
    pub avg_ev_realized: f64,
    /// Largest peak-to-trough fall of the capital curve, as a fraction of the peak.
    pub max_drawdown: f64,
    pub max_consecutive_losses: usize,
    pub max_position_used: f64,
    pub skipped_windows: usize,
}

impl SummaryMetrics {
    pub fn compute(
        trades: &[Trade],
        initial_capital: f64,
        capital_curve: &[CapitalPoint],
        skipped_windows: usize,
    ) -> Self {
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut ev_expected = 0.0_f64;
        let mut ev_realized = 0.0_f64;
        let mut max_position_used = 0.0_f64;
        let mut losing_streak = 0usize;
        let mut max_consecutive_losses = 0usize;

        for trade in trades {
            match trade.result {
                TradeResult::Win => {
                    winning_trades += 1;
                    total_wins += trade.pnl;
                    losing_streak = 0;
                }
                TradeResult::Loss => {
                    losing_trades += 1;
                    total_losses += trade.pnl.abs();
                    losing_streak += 1;
                    max_consecutive_losses = max_consecutive_losses.max(losing_streak);
                }
                TradeResult::Pending => {}
            }
            ev_expected += trade.expected_value;
            if trade.stake > 0.0 {
                ev_realized += trade.pnl / trade.stake;
            }
            max_position_used = max_position_used.max(trade.stake);
        }

        let total_trades = trades.len();
        let mean = |sum: f64, n: usize| if n > 0 { sum / n as f64 } else { 0.0 };
        let total_pnl = trades.iter().map(|t| t.pnl).sum::<f64>();

        SummaryMetrics {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate: mean(winning_trades as f64, total_trades),
            total_pnl,
            total_pnl_pct: if initial_capital > 0.0 {
                total_pnl / initial_capital
            } else {
                0.0
            },
            avg_win: mean(total_wins, winning_trades),
            avg_loss: mean(total_losses, losing_trades),
            avg_ev_expected: mean(ev_expected, total_trades),
            avg_ev_realized: mean(ev_realized, total_trades),
            max_drawdown: compute_drawdown(initial_capital, capital_curve),
            max_consecutive_losses,
            max_position_used,
            skipped_windows,
        }
    }
}

fn compute_drawdown(initial_capital: f64, capital_curve: &[CapitalPoint]) -> f64 {
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;

    for point in capital_curve {
        if point.capital > peak {
            peak = point.capital;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.capital) / peak);
        }
    }

    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Direction;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_735_689_600 + i * 900, 0).unwrap()
    }

    fn make_trade(i: i64, stake: f64, pnl: f64) -> Trade {
        Trade {
            timestamp: ts(i),
            market_id: format!("m{i}"),
            direction: Direction::Up,
            entry_price: 0.5,
            stake,
            model_probability: 0.6,
            expected_value: 0.2,
            confidence: 0.7,
            result: if pnl > 0.0 {
                TradeResult::Win
            } else {
                TradeResult::Loss
            },
            pnl,
            capital_after: 0.0,
            decision_index: i as usize,
        }
    }

    fn make_curve(values: &[f64]) -> Vec<CapitalPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &capital)| CapitalPoint {
                timestamp: ts(i as i64),
                capital,
            })
            .collect()
    }

    #[test]
    fn metrics_empty_run() {
        let m = SummaryMetrics::compute(&[], 1000.0, &[], 3);
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.total_pnl, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.skipped_windows, 3);
    }

    #[test]
    fn metrics_wins_and_losses() {
        let trades = vec![
            make_trade(0, 20.0, 20.0),
            make_trade(1, 20.0, -20.0),
            make_trade(2, 10.0, 30.0),
            make_trade(3, 10.0, -10.0),
        ];
        let m = SummaryMetrics::compute(&trades, 1000.0, &[], 0);

        assert_eq!(m.winning_trades, 2);
        assert_eq!(m.losing_trades, 2);
        assert_abs_diff_eq!(m.win_rate, 0.5);
        assert_abs_diff_eq!(m.total_pnl, 20.0);
        assert_abs_diff_eq!(m.total_pnl_pct, 0.02);
        assert_abs_diff_eq!(m.avg_win, 25.0);
        assert_abs_diff_eq!(m.avg_loss, 15.0);
        assert_abs_diff_eq!(m.max_position_used, 20.0);
    }

    #[test]
    fn metrics_realized_ev_per_unit_stake() {
        let trades = vec![make_trade(0, 10.0, 10.0), make_trade(1, 10.0, -10.0)];
        let m = SummaryMetrics::compute(&trades, 1000.0, &[], 0);
        assert_abs_diff_eq!(m.avg_ev_realized, 0.0);
        assert_abs_diff_eq!(m.avg_ev_expected, 0.2);
    }

    #[test]
    fn metrics_consecutive_losses() {
        let trades = vec![
            make_trade(0, 1.0, -1.0),
            make_trade(1, 1.0, 1.0),
            make_trade(2, 1.0, -1.0),
            make_trade(3, 1.0, -1.0),
            make_trade(4, 1.0, -1.0),
            make_trade(5, 1.0, 1.0),
        ];
        let m = SummaryMetrics::compute(&trades, 100.0, &[], 0);
        assert_eq!(m.max_consecutive_losses, 3);
    }

    #[test]
    fn metrics_max_drawdown() {
        let curve = make_curve(&[110.0, 90.0, 95.0, 80.0, 100.0]);
        let dd = compute_drawdown(100.0, &curve);
        assert_abs_diff_eq!(dd, (110.0 - 80.0) / 110.0, epsilon = 1e-9);
    }

    #[test]
    fn metrics_drawdown_counts_from_initial_capital() {
        let curve = make_curve(&[90.0, 95.0]);
        assert_abs_diff_eq!(compute_drawdown(100.0, &curve), 0.1, epsilon = 1e-9);
    }
}
