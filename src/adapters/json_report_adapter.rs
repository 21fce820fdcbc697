//! JSON result adapter implementing ResultSink.

use crate::domain::backtest::SimulationResult;
use crate::domain::compare::LeaderboardEntry;
use crate::domain::error::PolyedgeError;
use crate::ports::report_port::ResultSink;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), PolyedgeError> {
        let json = serde_json::to_string_pretty(value)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for JsonReportAdapter {
    fn write(&self, result: &SimulationResult, output_path: &Path) -> Result<(), PolyedgeError> {
        Self::write_json(result, output_path)
    }

    fn write_leaderboard(
        &self,
        entries: &[LeaderboardEntry],
        output_path: &Path,
    ) -> Result<(), PolyedgeError> {
        Self::write_json(entries, output_path)
    }
}

/// Read a result previously written by [`JsonReportAdapter`].
pub fn read_result(path: &Path) -> Result<SimulationResult, PolyedgeError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
