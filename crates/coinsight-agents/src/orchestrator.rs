use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use coinsight_models::{
    AgentInput, AgentOpinion, AgentRun, ConsensusDecision, ConsensusRun, DebateConfig,
};
use coinsight_scoring::ScoringEngine;
use coinsight_store::RunRecorder;
use tokio::sync::watch;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::consensus::aggregate;
use crate::error::AgentError;
use crate::risk::RiskAgent;
use crate::sentiment::SentimentAgent;
use crate::specialist::SpecialistAgent;
use crate::valuation::ValuationAgent;

/// Progress of the debates run by one orchestrator.
///
/// There is a single channel per orchestrator. When debates run
/// concurrently on a shared orchestrator the last phase sent wins, so
/// `Done` only means some debate finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebatePhase {
    Idle,
    Running { round: u32, of: u32 },
    Aggregating,
    Done,
}

/// Runs the agents for a number of rounds and aggregates their opinions.
pub struct Orchestrator {
    agents: Vec<Arc<dyn SpecialistAgent>>,
    recorder: Arc<dyn RunRecorder>,
    timeout: Duration,
    phase: watch::Sender<DebatePhase>,
}

impl Orchestrator {
    /// Opinions are emitted in `agents` order within each round.
    pub fn new(
        agents: Vec<Arc<dyn SpecialistAgent>>,
        recorder: Arc<dyn RunRecorder>,
        timeout: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(DebatePhase::Idle);
        Self {
            agents,
            recorder,
            timeout,
            phase,
        }
    }

    /// Sentiment, valuation and risk over one shared engine.
    pub fn standard(
        engine: Arc<ScoringEngine>,
        recorder: Arc<dyn RunRecorder>,
        timeout: Duration,
    ) -> Self {
        let agents: Vec<Arc<dyn SpecialistAgent>> = vec![
            Arc::new(SentimentAgent::new(Arc::clone(&engine))),
            Arc::new(ValuationAgent::new(Arc::clone(&engine))),
            Arc::new(RiskAgent::new(engine)),
        ];
        Self::new(agents, recorder, timeout)
    }

    /// Orchestrator-wide phase updates, last writer wins.
    pub fn subscribe(&self) -> watch::Receiver<DebatePhase> {
        self.phase.subscribe()
    }

    /// Run a full debate and persist its records.
    ///
    /// Agents that miss the deadline or panic contribute no opinion for that
    /// round; whatever was collected is aggregated.
    pub async fn debate(
        &self,
        input: &AgentInput,
        config: &DebateConfig,
    ) -> Result<ConsensusDecision, AgentError> {
        config.validate().map_err(AgentError::InvalidConfig)?;

        let started = Instant::now();
        let deadline = started + self.timeout;
        info!(token = %input.token, rounds = config.rounds, "Starting debate");

        let mut opinions = Vec::with_capacity(self.agents.len() * config.rounds as usize);
        for round in 1..=config.rounds {
            if Instant::now() >= deadline {
                warn!(token = %input.token, round, "Debate deadline reached, skipping remaining rounds");
                break;
            }
            self.phase.send_replace(DebatePhase::Running {
                round,
                of: config.rounds,
            });
            opinions.extend(self.run_round(input, round, deadline).await);
        }

        self.phase.send_replace(DebatePhase::Aggregating);
        let decision = aggregate(opinions);
        self.record(input, config, &decision)?;
        self.phase.send_replace(DebatePhase::Done);

        info!(
            token = %input.token,
            decision = %decision.decision,
            confidence = decision.confidence,
            opinions = decision.opinions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Debate complete"
        );
        Ok(decision)
    }

    async fn run_round(&self, input: &AgentInput, round: u32, deadline: Instant) -> Vec<AgentOpinion> {
        let mut handles = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let agent = Arc::clone(agent);
            let input = input.clone();
            let kind = agent.kind();
            let handle = tokio::spawn(async move {
                let agent_start = Instant::now();
                let opinion = agent.evaluate(&input, deadline).await;
                (opinion, agent_start.elapsed())
            });
            handles.push((kind, handle));
        }

        let mut opinions = Vec::with_capacity(handles.len());
        for (kind, mut handle) in handles {
            match timeout_at(deadline, &mut handle).await {
                Ok(Ok((opinion, elapsed))) => {
                    debug!(
                        agent = %kind,
                        round,
                        stance = %opinion.stance,
                        confidence = opinion.confidence,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Agent answered"
                    );
                    opinions.push(opinion);
                }
                Ok(Err(e)) => {
                    error!(agent = %kind, round, error = %e, "Agent task panicked");
                }
                Err(_) => {
                    handle.abort();
                    warn!(agent = %kind, round, "Agent missed the debate deadline");
                }
            }
        }
        opinions
    }

    fn record(
        &self,
        input: &AgentInput,
        config: &DebateConfig,
        decision: &ConsensusDecision,
    ) -> Result<(), AgentError> {
        let agent_runs: Vec<AgentRun> = decision
            .opinions
            .iter()
            .map(|opinion| AgentRun::new(input, opinion))
            .collect();
        let consensus = ConsensusRun {
            id: Uuid::new_v4(),
            token: input.token.clone(),
            decision: decision.decision,
            confidence: decision.confidence,
            rationale: decision.rationale.clone(),
            rounds: config.rounds,
            quorum: config.quorum,
            created_at: Utc::now(),
        };
        self.recorder
            .record_debate(&agent_runs, &consensus)
            .map_err(AgentError::from)
            .inspect_err(|e| {
                error!(token = %input.token, error = %e, "Failed to record debate");
            })
    }
}
