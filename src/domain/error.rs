//! Domain error types.
//!
//! Only run-level failures live here. Conditions that affect a single window
//! are recorded as a [`SkipReason`](crate::domain::backtest::SkipReason) in the
//! simulation result instead of aborting the run.

/// Top-level error type for polyedge.
#[derive(Debug, thiserror::Error)]
pub enum PolyedgeError {
    #[error("invalid config {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("price series for {asset} is empty")]
    EmptyPriceSeries { asset: String },

    #[error("price series for {asset} is not strictly increasing at candle {index}")]
    UnorderedPriceSeries { asset: String, index: usize },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PolyedgeError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PolyedgeError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<&PolyedgeError> for std::process::ExitCode {
    fn from(err: &PolyedgeError) -> Self {
        let code: u8 = match err {
            PolyedgeError::Io(_) => 1,
            PolyedgeError::InvalidConfig { .. }
            | PolyedgeError::ConfigParse { .. }
            | PolyedgeError::ConfigMissing { .. } => 2,
            PolyedgeError::EmptyPriceSeries { .. }
            | PolyedgeError::UnorderedPriceSeries { .. }
            | PolyedgeError::Data { .. } => 3,
            PolyedgeError::Serialization(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_message() {
        let err = PolyedgeError::invalid("min_ev", "must be in [0, 1)");
        assert_eq!(err.to_string(), "invalid config min_ev: must be in [0, 1)");
    }

    #[test]
    fn exit_codes_group_by_family() {
        use std::process::ExitCode;
        let config = PolyedgeError::ConfigMissing {
            section: "strategy".into(),
            key: "approach".into(),
        };
        let data = PolyedgeError::EmptyPriceSeries {
            asset: "BTCUSDT".into(),
        };
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));
        assert_eq!(ExitCode::from(&data), ExitCode::from(3));
    }
}
