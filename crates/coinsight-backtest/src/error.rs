use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Store error: {0}")]
    Store(#[from] coinsight_store::StoreError),

    #[error("Debate error: {0}")]
    Debate(#[from] coinsight_agents::AgentError),

    #[error("Configuration error: {0}")]
    Config(String),
}
