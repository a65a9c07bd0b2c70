use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::signal::SignalDaily;

/// Condition an alert watches for on the latest daily signals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertCondition {
    /// Consensus decision differs from the previous day.
    ConsensusFlip,
    /// Latest score is at or above `score_gte`.
    ScoreThreshold { score_gte: u8 },
    /// Risk bucket differs from the previous day.
    RiskChange,
}

impl AlertCondition {
    pub fn name(&self) -> &'static str {
        match self {
            AlertCondition::ConsensusFlip => "consensus_flip",
            AlertCondition::ScoreThreshold { .. } => "score_threshold",
            AlertCondition::RiskChange => "risk_change",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRule {
    pub id: Uuid,
    pub token: String,
    pub condition: AlertCondition,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A fired alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertEvent {
    pub rule_id: Uuid,
    pub token: String,
    pub kind: String,
    pub reason: String,
    pub snapshot: Option<SignalDaily>,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_rule_from_toml() {
        let rule: AlertRule = toml::from_str(
            r#"
id = "00000000-0000-0000-0000-000000000001"
token = "ETH"

[condition]
type = "score_threshold"
score_gte = 75
"#,
        )
        .unwrap();
        assert!(rule.active);
        assert_eq!(
            rule.condition,
            AlertCondition::ScoreThreshold { score_gte: 75 }
        );
        assert_eq!(rule.condition.name(), "score_threshold");
    }
}
