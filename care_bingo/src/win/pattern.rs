//! Winning patterns a session can play for.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::BingoError;

/// Pattern a card must cover to win
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinPattern {
    /// Any complete row, column or diagonal
    #[default]
    #[serde(alias = "line")]
    Standard,
    /// The four corner squares
    FourCorners,
    /// Every square on the card
    #[serde(alias = "full_house")]
    Blackout,
}

impl fmt::Display for WinPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinPattern::Standard => write!(f, "standard"),
            WinPattern::FourCorners => write!(f, "four_corners"),
            WinPattern::Blackout => write!(f, "blackout"),
        }
    }
}

impl FromStr for WinPattern {
    type Err = BingoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "standard" | "line" => Ok(WinPattern::Standard),
            "four_corners" => Ok(WinPattern::FourCorners),
            "blackout" | "full_house" => Ok(WinPattern::Blackout),
            other => Err(BingoError::invalid_argument(format!(
                "unknown winning pattern '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_parse_aliases() {
        assert_eq!("line".parse::<WinPattern>().unwrap(), WinPattern::Standard);
        assert_eq!("Four-Corners".parse::<WinPattern>().unwrap(), WinPattern::FourCorners);
        assert_eq!("full_house".parse::<WinPattern>().unwrap(), WinPattern::Blackout);
    }

    #[test]
    fn test_pattern_parse_rejects_unknown() {
        let err = "x_shape".parse::<WinPattern>().unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn test_pattern_serde_round_trip_names() {
        assert_eq!(
            serde_json::to_string(&WinPattern::FourCorners).unwrap(),
            "\"four_corners\""
        );
        let parsed: WinPattern = serde_json::from_str("\"line\"").unwrap();
        assert_eq!(parsed, WinPattern::Standard);
    }
}
