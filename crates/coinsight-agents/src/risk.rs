use std::sync::Arc;

use async_trait::async_trait;
use coinsight_models::{AgentFeatures, AgentInput, AgentKind, AgentOpinion, AnalysisResult, Risk, Stance};
use coinsight_scoring::ScoringEngine;
use tokio::time::Instant;

use crate::specialist::SpecialistAgent;

/// Evidence fragments that force a SELL regardless of the risk bucket.
const RED_FLAGS: [&str; 2] = ["no liquidity found", "not verified"];

/// Maps the analysis risk bucket to a stance, with a red-flag guardrail.
pub struct RiskAgent {
    engine: Arc<ScoringEngine>,
}

impl RiskAgent {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        Self { engine }
    }
}

pub fn has_red_flag(evidence: &[String]) -> bool {
    evidence.iter().any(|line| {
        let line = line.to_lowercase();
        RED_FLAGS.iter().any(|flag| line.contains(flag))
    })
}

pub fn risk_opinion(analysis: &AnalysisResult) -> AgentOpinion {
    let (stance, confidence) = match analysis.risk {
        Risk::Low => (Stance::Buy, 0.7),
        Risk::High => (Stance::Sell, 0.8),
        Risk::Medium => (Stance::Hold, 0.5),
    };

    let red_flag = has_red_flag(&analysis.evidence);
    let (stance, confidence) = if red_flag {
        (Stance::Sell, f64::max(confidence, 0.8))
    } else {
        (stance, confidence)
    };

    AgentOpinion {
        agent: AgentKind::Risk,
        stance,
        confidence,
        rationale: format!(
            "Risk level {}{}",
            analysis.risk,
            if red_flag { "; red flag detected" } else { "" }
        ),
        features: AgentFeatures::Risk {
            risk: analysis.risk,
            red_flag,
        },
    }
}

#[async_trait]
impl SpecialistAgent for RiskAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Risk
    }

    async fn evaluate(&self, input: &AgentInput, deadline: Instant) -> AgentOpinion {
        let analysis = self.engine.analyze_until(&input.token, deadline).await;
        risk_opinion(&analysis)
    }
}
