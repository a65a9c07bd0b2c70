//! Scripted agents for debate tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use coinsight_models::{AgentFeatures, AgentInput, AgentKind, AgentOpinion, Risk, Stance};
use tokio::time::Instant;

use crate::specialist::SpecialistAgent;

/// Opinion with a `"scripted {stance}"` rationale and neutral features.
pub fn opinion(agent: AgentKind, stance: Stance, confidence: f64) -> AgentOpinion {
    let features = match agent {
        AgentKind::Sentiment => AgentFeatures::Sentiment {
            posts: 0,
            news_symbol: None,
            aggregate_score: 0.0,
            normalized: 0.0,
            d1_pct: None,
        },
        AgentKind::Valuation => AgentFeatures::Valuation {
            score: 50,
            history_points: 0,
            quant: None,
        },
        AgentKind::Risk => AgentFeatures::Risk {
            risk: Risk::Medium,
            red_flag: false,
        },
    };
    AgentOpinion {
        agent,
        stance,
        confidence,
        rationale: format!("scripted {stance}"),
        features,
    }
}

/// Agent that always answers with the same opinion, optionally after a
/// delay or by panicking.
#[derive(Clone)]
pub struct ScriptedAgent {
    kind: AgentKind,
    stance: Stance,
    confidence: f64,
    delay: Option<Duration>,
    panics: bool,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAgent {
    pub fn new(kind: AgentKind, stance: Stance, confidence: f64) -> Self {
        Self {
            kind,
            stance,
            confidence,
            delay: None,
            panics: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleeps this long before answering, ignoring the deadline.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpecialistAgent for ScriptedAgent {
    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn evaluate(&self, _input: &AgentInput, _deadline: Instant) -> AgentOpinion {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panics {
            panic!("scripted {} agent panicked", self.kind);
        }
        opinion(self.kind, self.stance, self.confidence)
    }
}
