use std::fmt;

use serde::{Deserialize, Serialize};

/// Risk bucket derived from a 0-100 score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Risk {
    Low,
    Medium,
    High,
}

impl Risk {
    /// `>= 70` is Low, `>= 40` is Medium, anything else is High.
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            Risk::Low
        } else if score >= 40 {
            Risk::Medium
        } else {
            Risk::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::Low => "Low",
            Risk::Medium => "Medium",
            Risk::High => "High",
        }
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Risk {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Risk::Low),
            "Medium" => Ok(Risk::Medium),
            "High" => Ok(Risk::High),
            other => Err(format!("unknown risk bucket: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Outlook {
    Bearish,
    Neutral,
    Bullish,
}

impl Outlook {
    /// Outlook from a 24h percent change: `>= +3` Bullish, `<= -3` Bearish.
    pub fn from_d1_pct(d1_pct: f64) -> Self {
        if d1_pct >= 3.0 {
            Outlook::Bullish
        } else if d1_pct <= -3.0 {
            Outlook::Bearish
        } else {
            Outlook::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outlook::Bearish => "Bearish",
            Outlook::Neutral => "Neutral",
            Outlook::Bullish => "Bullish",
        }
    }
}

impl fmt::Display for Outlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Outlook {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bearish" => Ok(Outlook::Bearish),
            "Neutral" => Ok(Outlook::Neutral),
            "Bullish" => Ok(Outlook::Bullish),
            other => Err(format!("unknown outlook: {other}")),
        }
    }
}

/// Explainable score for a single token.
///
/// `evidence` lists every adjustment applied to `score`, in the order it
/// was applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub token: String,
    /// 0 to 100.
    pub score: u8,
    pub risk: Risk,
    pub outlook: Outlook,
    pub evidence: Vec<String>,
}

/// Input starting with a lowercase `0x` and at least 8 characters long is
/// treated as a contract address. `0X` is not.
pub fn is_address(token: &str) -> bool {
    let token = token.trim();
    token.len() >= 8 && token.starts_with("0x")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_thresholds() {
        assert_eq!(Risk::from_score(100), Risk::Low);
        assert_eq!(Risk::from_score(70), Risk::Low);
        assert_eq!(Risk::from_score(69), Risk::Medium);
        assert_eq!(Risk::from_score(40), Risk::Medium);
        assert_eq!(Risk::from_score(39), Risk::High);
        assert_eq!(Risk::from_score(0), Risk::High);
    }

    #[test]
    fn risk_is_monotonic() {
        let rank = |r: Risk| match r {
            Risk::High => 0,
            Risk::Medium => 1,
            Risk::Low => 2,
        };
        for s in 0..100u8 {
            assert!(rank(Risk::from_score(s)) <= rank(Risk::from_score(s + 1)));
        }
    }

    #[test]
    fn outlook_from_daily_change() {
        assert_eq!(Outlook::from_d1_pct(3.0), Outlook::Bullish);
        assert_eq!(Outlook::from_d1_pct(-3.0), Outlook::Bearish);
        assert_eq!(Outlook::from_d1_pct(2.99), Outlook::Neutral);
        assert_eq!(Outlook::from_d1_pct(0.0), Outlook::Neutral);
    }

    #[test]
    fn address_detection() {
        assert!(is_address("0x1234abcd"));
        assert!(is_address("0xABCDEF12"));
        assert!(!is_address("0XABCDEF12"));
        assert!(!is_address("0x1234"));
        assert!(!is_address("ETH"));
    }

    #[test]
    fn risk_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&Risk::Medium).unwrap(), "\"Medium\"");
        assert_eq!("High".parse::<Risk>().unwrap(), Risk::High);
        assert!("high".parse::<Risk>().is_err());
    }
}
