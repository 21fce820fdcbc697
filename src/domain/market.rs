//! Binary up/down market windows as quoted by a market data source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// +1 for up, -1 for down.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "yes" => Ok(Direction::Up),
            "down" | "no" => Ok(Direction::Down),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// One window of a binary market: the price of the UP share at `timestamp`
/// and, once the window has closed at `resolution_time`, the realised outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub market_id: String,
    pub timestamp: DateTime<Utc>,
    pub resolution_time: DateTime<Utc>,
    pub market_price: f64,
    pub outcome: Option<Direction>,
}

/// Prices at or beyond the bounds of (0, 1) leave nothing to bet on.
pub fn is_degenerate_price(market_price: f64) -> bool {
    !(market_price > 0.0 && market_price < 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parse_and_display() {
        assert_eq!("UP".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!(" down ".parse::<Direction>(), Ok(Direction::Down));
        assert_eq!("yes".parse::<Direction>(), Ok(Direction::Up));
        assert!("sideways".parse::<Direction>().is_err());
        assert_eq!(Direction::Down.to_string(), "DOWN");
    }

    #[test]
    fn degenerate_prices() {
        assert!(is_degenerate_price(0.0));
        assert!(is_degenerate_price(1.0));
        assert!(is_degenerate_price(-0.2));
        assert!(is_degenerate_price(f64::NAN));
        assert!(!is_degenerate_price(0.5));
        assert!(!is_degenerate_price(0.01));
    }
}
