use std::sync::Arc;

use async_trait::async_trait;
use coinsight_models::{AgentFeatures, AgentInput, AgentKind, AgentOpinion, QuantMetrics, Stance};
use coinsight_scoring::quant::{max_drawdown, mean, pct_returns, simple_sharpe, stdev};
use coinsight_scoring::ScoringEngine;
use tokio::time::{timeout_at, Instant};

use crate::specialist::SpecialistAgent;

const PRIMARY_DAYS: u32 = 60;
const FALLBACK_DAYS: u32 = 30;
const MIN_HISTORY: usize = 20;

const BUY_SCORE: u8 = 70;
const SELL_SCORE: u8 = 40;
const GOOD_SHARPE: f64 = 0.7;
const CALM_VOL: f64 = 0.04;
const CALM_DRAWDOWN: f64 = 0.25;
const WILD_VOL: f64 = 0.10;
const DEEP_DRAWDOWN: f64 = 0.6;

/// Blends the fused analysis score with volatility, drawdown and Sharpe
/// computed from daily closes.
pub struct ValuationAgent {
    engine: Arc<ScoringEngine>,
}

impl ValuationAgent {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        Self { engine }
    }

    async fn closes(&self, token: &str, deadline: Instant) -> Option<Vec<f64>> {
        let source = self.engine.source();
        let primary = timeout_at(deadline, source.daily_closes(token, PRIMARY_DAYS))
            .await
            .ok()
            .flatten();
        match primary {
            Some(closes) if closes.len() >= MIN_HISTORY => Some(closes),
            _ => timeout_at(deadline, source.daily_closes(token, FALLBACK_DAYS))
                .await
                .ok()
                .flatten(),
        }
    }
}

fn quant_metrics(closes: &[f64]) -> QuantMetrics {
    let rets = pct_returns(closes);
    QuantMetrics {
        volatility: stdev(&rets),
        max_drawdown: max_drawdown(closes),
        sharpe: simple_sharpe(&rets),
        mean_return: mean(&rets),
    }
}

fn base_stance(score: u8) -> Stance {
    if score >= BUY_SCORE {
        Stance::Buy
    } else if score <= SELL_SCORE {
        Stance::Sell
    } else {
        Stance::Hold
    }
}

pub fn valuation_opinion(score: u8, closes: Option<&[f64]>) -> AgentOpinion {
    let history_points = closes.map_or(0, <[f64]>::len);
    let stance = base_stance(score);

    let Some(closes) = closes.filter(|c| c.len() >= MIN_HISTORY) else {
        return AgentOpinion {
            agent: AgentKind::Valuation,
            stance,
            confidence: if stance == Stance::Hold { 0.5 } else { 0.6 },
            rationale:
                "Quant: insufficient history for volatility/drawdown (used base score only)."
                    .to_string(),
            features: AgentFeatures::Valuation {
                score,
                history_points,
                quant: None,
            },
        };
    };

    let q = quant_metrics(closes);
    let calm = q.volatility <= CALM_VOL && q.max_drawdown <= CALM_DRAWDOWN;
    let wild = q.volatility >= WILD_VOL || q.max_drawdown >= DEEP_DRAWDOWN;

    let mut stance = stance;
    if stance == Stance::Hold && q.sharpe >= GOOD_SHARPE && q.mean_return > 0.0 {
        stance = Stance::Buy;
    }
    if q.sharpe <= 0.0 && wild {
        stance = Stance::Sell;
    }

    let agreement = match stance {
        Stance::Buy => [score >= BUY_SCORE, q.sharpe >= GOOD_SHARPE, calm]
            .iter()
            .filter(|hit| **hit)
            .count(),
        Stance::Sell => [score <= SELL_SCORE, q.sharpe <= 0.0, wild]
            .iter()
            .filter(|hit| **hit)
            .count(),
        Stance::Hold => 1,
    };

    AgentOpinion {
        agent: AgentKind::Valuation,
        stance,
        confidence: f64::min(1.0, 0.3 + 0.25 * agreement as f64),
        rationale: format!(
            "Quant: daily σ {:.1}%, max DD {:.0}%, Sharpe* {:.2}, μ {:.2}%. Blend: base score {score}/100 with quant overlays.",
            q.volatility * 100.0,
            q.max_drawdown * 100.0,
            q.sharpe,
            q.mean_return * 100.0,
        ),
        features: AgentFeatures::Valuation {
            score,
            history_points,
            quant: Some(q),
        },
    }
}

#[async_trait]
impl SpecialistAgent for ValuationAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Valuation
    }

    async fn evaluate(&self, input: &AgentInput, deadline: Instant) -> AgentOpinion {
        let (analysis, closes) = tokio::join!(
            self.engine.analyze_until(&input.token, deadline),
            self.closes(&input.token, deadline),
        );
        valuation_opinion(analysis.score, closes.as_deref())
    }
}
