use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use coinsight_agents::Orchestrator;
use coinsight_models::{AgentInput, DebateConfig, SignalDaily, UniverseEntry};
use coinsight_scoring::ScoringEngine;
use coinsight_store::SignalStore;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::BacktestError;

/// Scores and debates the daily universe, writing one `SignalDaily` per token.
pub struct BacktestRunner {
    engine: Arc<ScoringEngine>,
    orchestrator: Arc<Orchestrator>,
    store: Arc<dyn SignalStore>,
    concurrency: usize,
    debate: DebateConfig,
}

impl BacktestRunner {
    pub fn new(
        engine: Arc<ScoringEngine>,
        orchestrator: Arc<Orchestrator>,
        store: Arc<dyn SignalStore>,
        concurrency: usize,
        rounds: u32,
    ) -> Result<Self, BacktestError> {
        if concurrency == 0 {
            return Err(BacktestError::Config("concurrency must be at least 1".into()));
        }
        let debate = DebateConfig {
            rounds,
            quorum: 0.5,
        };
        debate.validate().map_err(BacktestError::Config)?;
        Ok(Self {
            engine,
            orchestrator,
            store,
            concurrency,
            debate,
        })
    }

    /// Run today's (UTC) signals for the top `limit` tokens.
    pub async fn run_day(&self, limit: usize) -> Result<usize, BacktestError> {
        self.run_day_for(Utc::now().date_naive(), limit).await
    }

    /// Returns the number of tokens whose signal was written. A token whose
    /// debate or write fails is logged and skipped.
    pub async fn run_day_for(&self, date: NaiveDate, limit: usize) -> Result<usize, BacktestError> {
        let started = Instant::now();
        let universe = self.engine.source().top_symbols(limit).await;
        if universe.is_empty() {
            warn!(%date, limit, "Empty universe, nothing to backtest");
            return Ok(0);
        }
        info!(%date, tokens = universe.len(), concurrency = self.concurrency, "Backtest day starting");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for entry in universe {
            let semaphore = Arc::clone(&semaphore);
            let engine = Arc::clone(&self.engine);
            let orchestrator = Arc::clone(&self.orchestrator);
            let store = Arc::clone(&self.store);
            let debate = self.debate;
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| BacktestError::Config(format!("worker pool closed: {e}")))?;
                let symbol = entry.symbol.clone();
                signal_for(&engine, &orchestrator, store.as_ref(), date, entry, &debate)
                    .await
                    .inspect_err(|e| {
                        error!(token = %symbol, error = %e, "Backtest token failed");
                    })
            });
        }

        let mut written = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => written += 1,
                Ok(Err(_)) => {}
                Err(e) => error!(error = %e, "Backtest task panicked"),
            }
        }

        info!(
            %date,
            written,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backtest day complete"
        );
        Ok(written)
    }
}

async fn signal_for(
    engine: &ScoringEngine,
    orchestrator: &Orchestrator,
    store: &dyn SignalStore,
    date: NaiveDate,
    entry: UniverseEntry,
    debate: &DebateConfig,
) -> Result<(), BacktestError> {
    let analysis = engine.analyze(&entry.symbol).await;
    let decision = orchestrator
        .debate(&AgentInput::new(entry.symbol), debate)
        .await?;

    store.upsert_signal(&SignalDaily {
        date,
        token: analysis.token,
        score: analysis.score,
        risk: analysis.risk,
        outlook: analysis.outlook,
        decision: decision.decision,
        confidence: decision.confidence,
        price_usd: entry.price_usd,
    })?;
    Ok(())
}
