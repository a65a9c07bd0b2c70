pub mod error;
pub mod memory;
pub mod sqlite;

use chrono::NaiveDate;
use coinsight_models::{AgentRun, ConsensusRun, SignalDaily};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Sink for the records a debate produces.
pub trait RunRecorder: Send + Sync {
    /// Persist every agent run and the terminal consensus run together.
    /// On error nothing from this debate is stored.
    fn record_debate(
        &self,
        agent_runs: &[AgentRun],
        consensus: &ConsensusRun,
    ) -> Result<(), StoreError>;
}

/// Daily signal storage used by the backtest engine.
pub trait SignalStore: Send + Sync {
    /// Insert or replace the row for `(signal.date, signal.token)`.
    fn upsert_signal(&self, signal: &SignalDaily) -> Result<(), StoreError>;

    /// All rows with `date >= since`, ordered by date then token.
    fn signals_since(&self, since: NaiveDate) -> Result<Vec<SignalDaily>, StoreError>;
}
