use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid debate config: {0}")]
    InvalidConfig(String),

    #[error("Store error: {0}")]
    Store(#[from] coinsight_store::StoreError),
}
