//! Durable records handed to the store: per-day signals and debate runs.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent_message::{AgentInput, AgentKind, AgentOpinion, Stance};
use crate::analysis::{Outlook, Risk};

/// One backtest signal row. Unique per `(date, token)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalDaily {
    pub date: NaiveDate,
    pub token: String,
    pub score: u8,
    pub risk: Risk,
    pub outlook: Outlook,
    pub decision: Stance,
    pub confidence: f64,
    pub price_usd: Decimal,
}

/// Persisted trace of a single agent opinion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRun {
    pub id: Uuid,
    pub token: String,
    pub agent: AgentKind,
    pub input: AgentInput,
    pub opinion: AgentOpinion,
    pub score: Option<u8>,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl AgentRun {
    pub fn new(input: &AgentInput, opinion: &AgentOpinion) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: input.token.clone(),
            agent: opinion.agent,
            input: input.clone(),
            opinion: opinion.clone(),
            score: opinion.features.score(),
            confidence: opinion.confidence,
            created_at: Utc::now(),
        }
    }
}

/// Persisted terminal record of one debate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsensusRun {
    pub id: Uuid,
    pub token: String,
    pub decision: Stance,
    pub confidence: f64,
    pub rationale: Vec<String>,
    pub rounds: u32,
    pub quorum: f64,
    pub created_at: DateTime<Utc>,
}

/// Performance of the long-only BUY basket over a window of days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSummary {
    pub window_days: u32,
    /// Number of daily basket returns in the series.
    pub daily_count: usize,
    /// 0.21 = +21%.
    pub cumulative_return: f64,
    pub mean_daily: f64,
    pub stdev_daily: f64,
    /// Daily Sharpe-like ratio, not annualized.
    pub sharpe_daily: f64,
    pub max_drawdown: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_message::AgentFeatures;
    use rust_decimal_macros::dec;

    #[test]
    fn signal_price_serializes_as_string() {
        let signal = SignalDaily {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            token: "ETH".to_string(),
            score: 65,
            risk: Risk::Medium,
            outlook: Outlook::Neutral,
            decision: Stance::Hold,
            confidence: 0.5,
            price_usd: dec!(3512.25),
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["price_usd"], "3512.25");
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["decision"], "HOLD");
    }

    #[test]
    fn agent_run_takes_score_from_valuation_features() {
        let input = AgentInput::new("SOL");
        let opinion = AgentOpinion {
            agent: AgentKind::Valuation,
            stance: Stance::Buy,
            confidence: 0.8,
            rationale: "strong".to_string(),
            features: AgentFeatures::Valuation {
                score: 74,
                history_points: 60,
                quant: None,
            },
        };

        let run = AgentRun::new(&input, &opinion);
        assert_eq!(run.token, "SOL");
        assert_eq!(run.agent, AgentKind::Valuation);
        assert_eq!(run.score, Some(74));
        assert_eq!(run.confidence, 0.8);
    }
}
