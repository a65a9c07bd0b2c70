use async_trait::async_trait;
use coinsight_models::{AgentInput, AgentKind, AgentOpinion};
use tokio::time::Instant;

/// One debate participant. Mockable for testing.
///
/// Agents never fail: missing provider data lowers confidence or switches
/// to a fallback signal instead. `deadline` bounds any provider work.
#[async_trait]
pub trait SpecialistAgent: Send + Sync {
    fn kind(&self) -> AgentKind;

    async fn evaluate(&self, input: &AgentInput, deadline: Instant) -> AgentOpinion;
}
