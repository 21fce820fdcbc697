//! Result hand-off port trait.

use crate::domain::backtest::SimulationResult;
use crate::domain::compare::LeaderboardEntry;
use crate::domain::error::PolyedgeError;
use std::path::Path;

/// Port for persisting finished runs.
pub trait ResultSink {
    fn write(&self, result: &SimulationResult, output_path: &Path) -> Result<(), PolyedgeError>;

    fn write_leaderboard(
        &self,
        entries: &[LeaderboardEntry],
        output_path: &Path,
    ) -> Result<(), PolyedgeError>;
}
