use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use coinsight_models::{AgentRun, ConsensusRun, SignalDaily};

use crate::error::StoreError;
use crate::{RunRecorder, SignalStore};

#[derive(Default)]
struct Tables {
    agent_runs: Vec<AgentRun>,
    consensus_runs: Vec<ConsensusRun>,
    signals: BTreeMap<(NaiveDate, String), SignalDaily>,
}

/// In-process store. Used by tests and by one-shot CLI runs that don't
/// configure a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("store mutex poisoned: {e}")))?;
        Ok(f(&mut tables))
    }

    pub fn agent_runs(&self) -> Result<Vec<AgentRun>, StoreError> {
        self.with_tables(|t| t.agent_runs.clone())
    }

    pub fn consensus_runs(&self) -> Result<Vec<ConsensusRun>, StoreError> {
        self.with_tables(|t| t.consensus_runs.clone())
    }
}

impl RunRecorder for MemoryStore {
    fn record_debate(
        &self,
        agent_runs: &[AgentRun],
        consensus: &ConsensusRun,
    ) -> Result<(), StoreError> {
        self.with_tables(|t| {
            t.agent_runs.extend_from_slice(agent_runs);
            t.consensus_runs.push(consensus.clone());
        })
    }
}

impl SignalStore for MemoryStore {
    fn upsert_signal(&self, signal: &SignalDaily) -> Result<(), StoreError> {
        self.with_tables(|t| {
            t.signals
                .insert((signal.date, signal.token.clone()), signal.clone());
        })
    }

    fn signals_since(&self, since: NaiveDate) -> Result<Vec<SignalDaily>, StoreError> {
        self.with_tables(|t| {
            t.signals
                .range((since, String::new())..)
                .map(|(_, s)| s.clone())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinsight_models::{Outlook, Risk, Stance};
    use rust_decimal_macros::dec;

    fn signal(d: u32, token: &str, score: u8) -> SignalDaily {
        SignalDaily {
            date: NaiveDate::from_ymd_opt(2024, 6, d).unwrap(),
            token: token.to_string(),
            score,
            risk: Risk::from_score(score),
            outlook: Outlook::Neutral,
            decision: Stance::Hold,
            confidence: 0.4,
            price_usd: dec!(1),
        }
    }

    #[test]
    fn upsert_replaces_same_key() {
        let store = MemoryStore::new();
        store.upsert_signal(&signal(1, "ETH", 40)).unwrap();
        store.upsert_signal(&signal(1, "ETH", 72)).unwrap();

        let rows = store
            .signals_since(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, 72);
        assert_eq!(rows[0].risk, Risk::Low);
    }

    #[test]
    fn since_is_inclusive() {
        let store = MemoryStore::new();
        store.upsert_signal(&signal(1, "ETH", 50)).unwrap();
        store.upsert_signal(&signal(2, "BTC", 50)).unwrap();
        store.upsert_signal(&signal(2, "ADA", 50)).unwrap();

        let rows = store
            .signals_since(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap())
            .unwrap();
        let tokens: Vec<&str> = rows.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(tokens, vec!["ADA", "BTC"]);
    }
}
