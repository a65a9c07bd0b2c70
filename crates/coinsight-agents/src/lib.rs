pub mod consensus;
pub mod error;
pub mod orchestrator;
pub mod risk;
pub mod sentiment;
pub mod specialist;
pub mod valuation;

pub mod test_support;

pub use consensus::aggregate;
pub use error::AgentError;
pub use orchestrator::{DebatePhase, Orchestrator};
pub use risk::RiskAgent;
pub use sentiment::SentimentAgent;
pub use specialist::SpecialistAgent;
pub use valuation::ValuationAgent;
