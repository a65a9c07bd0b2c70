use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::Risk;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Sentiment,
    Valuation,
    Risk,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Sentiment => "sentiment",
            AgentKind::Valuation => "valuation",
            AgentKind::Risk => "risk",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stance {
    Buy,
    Hold,
    Sell,
}

impl Stance {
    pub const ALL: [Stance; 3] = [Stance::Buy, Stance::Hold, Stance::Sell];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Buy => "BUY",
            Stance::Hold => "HOLD",
            Stance::Sell => "SELL",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Stance::Buy),
            "HOLD" => Ok(Stance::Hold),
            "SELL" => Ok(Stance::Sell),
            other => Err(format!("unknown stance: {other}")),
        }
    }
}

/// Input shared by every agent in one analysis/debate cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AgentInput {
    pub token: String,
    /// Caller-supplied metadata, carried through to the persisted agent runs.
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl AgentInput {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            context: serde_json::Map::new(),
        }
    }
}

/// Quant metrics computed by the valuation agent from daily closes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QuantMetrics {
    /// Sample stdev of daily returns.
    pub volatility: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub mean_return: f64,
}

/// Structured inputs each agent based its stance on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentFeatures {
    Sentiment {
        posts: usize,
        news_symbol: Option<String>,
        aggregate_score: f64,
        normalized: f64,
        /// Set only when the momentum fallback was used.
        d1_pct: Option<f64>,
    },
    Valuation {
        score: u8,
        history_points: usize,
        quant: Option<QuantMetrics>,
    },
    Risk {
        risk: Risk,
        red_flag: bool,
    },
}

impl AgentFeatures {
    /// The blended score this opinion was derived from, if any.
    pub fn score(&self) -> Option<u8> {
        match self {
            AgentFeatures::Valuation { score, .. } => Some(*score),
            _ => None,
        }
    }
}

/// One agent's opinion for one round. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentOpinion {
    pub agent: AgentKind,
    pub stance: Stance,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub rationale: String,
    pub features: AgentFeatures,
}

pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DebateConfig {
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Majority fraction. Validated and persisted, not used by aggregation.
    #[serde(default = "default_quorum")]
    pub quorum: f64,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            quorum: default_quorum(),
        }
    }
}

impl DebateConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&self.rounds) {
            return Err(format!(
                "rounds must be between {MIN_ROUNDS} and {MAX_ROUNDS}, got {}",
                self.rounds
            ));
        }
        if !(0.5..=1.0).contains(&self.quorum) {
            return Err(format!(
                "quorum must be between 0.5 and 1.0, got {}",
                self.quorum
            ));
        }
        Ok(())
    }
}

fn default_rounds() -> u32 {
    3
}
fn default_quorum() -> f64 {
    0.5
}

/// Aggregated outcome of one debate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsensusDecision {
    pub decision: Stance,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub opinions: Vec<AgentOpinion>,
    /// One `"[agent] rationale"` line per opinion, in emission order.
    pub rationale: Vec<String>,
}
