//! Coinsight - crypto token scoring and multi-agent consensus.
//!
//! Fuses market, on-chain, liquidity, holder and news signals into a 0-100
//! score, debates a BUY/HOLD/SELL stance across three specialist agents,
//! and backtests the daily decisions.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use coinsight::models::{AgentInput, CoinsightConfig, DebateConfig};
//! use coinsight::Coinsight;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let app = Coinsight::build(&CoinsightConfig::default())?;
//! let analysis = app.analyze("ETH").await;
//! let decision = app.debate(&AgentInput::new("ETH"), &DebateConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub use coinsight_agents as agents;
pub use coinsight_backtest as backtest;
pub use coinsight_cache as cache;
pub use coinsight_models as models;
pub use coinsight_providers as providers;
pub use coinsight_scoring as scoring;
pub use coinsight_store as store;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use coinsight_agents::{AgentError, Orchestrator};
use coinsight_backtest::{BacktestError, BacktestRunner, DailySchedule, Daemon};
use coinsight_cache::{JsonCache, MemoryCache, NoopCache, SqliteCache, TieredCache};
use coinsight_models::{
    AgentInput, AlertEvent, AnalysisResult, BacktestSummary, CacheConfig, CoinsightConfig,
    ConsensusDecision, DebateConfig,
};
use coinsight_providers::{HttpSignalSource, SignalSource};
use coinsight_scoring::ScoringEngine;
use coinsight_store::SqliteStore;

/// Read a TOML config file and layer provider keys from the environment.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<CoinsightConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let mut config: CoinsightConfig =
        toml::from_str(&raw).with_context(|| format!("Failed to parse config: {}", path.display()))?;
    config.providers.apply_env();
    Ok(config)
}

/// Memory-only cache, or memory in front of a shared SQLite file.
pub fn build_cache(config: &CacheConfig) -> anyhow::Result<Arc<dyn JsonCache>> {
    let max_ttl = Duration::from_secs(config.coin_list_ttl_seconds);
    match &config.sqlite_path {
        Some(path) => {
            let sqlite = SqliteCache::open(path)
                .with_context(|| format!("Failed to open cache DB: {path}"))?;
            Ok(Arc::new(TieredCache::new(
                sqlite,
                config.memory_max_capacity,
                max_ttl,
            )))
        }
        None => Ok(Arc::new(MemoryCache::new(config.memory_max_capacity, max_ttl))),
    }
}

/// Fully wired engine, debate orchestrator and store.
pub struct Coinsight {
    config: CoinsightConfig,
    engine: Arc<ScoringEngine>,
    orchestrator: Arc<Orchestrator>,
    store: Arc<SqliteStore>,
    cache: Arc<dyn JsonCache>,
}

impl Coinsight {
    /// Wire everything over the live HTTP providers.
    pub fn build(config: &CoinsightConfig) -> anyhow::Result<Self> {
        let cache = build_cache(&config.cache)?;
        let source = HttpSignalSource::new(&config.providers, &config.cache, Arc::clone(&cache));
        if let Some(dir) = Path::new(&config.store.sqlite_path).parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create store dir: {}", dir.display()))?;
            }
        }
        let store = SqliteStore::open(&config.store.sqlite_path)
            .with_context(|| format!("Failed to open store DB: {}", config.store.sqlite_path))?;
        let mut app = Self::with_parts(config, Arc::new(source), Arc::new(store));
        app.cache = cache;
        Ok(app)
    }

    /// Wire over an arbitrary signal source and store, with no provider cache.
    pub fn with_parts(
        config: &CoinsightConfig,
        source: Arc<dyn SignalSource>,
        store: Arc<SqliteStore>,
    ) -> Self {
        let engine = Arc::new(ScoringEngine::new(
            source,
            Duration::from_millis(config.scoring.analysis_timeout_ms),
        ));
        let orchestrator = Arc::new(Orchestrator::standard(
            Arc::clone(&engine),
            store.clone(),
            Duration::from_secs(config.debate.timeout_seconds),
        ));
        Self {
            config: config.clone(),
            engine,
            orchestrator,
            store,
            cache: Arc::new(NoopCache),
        }
    }

    pub fn config(&self) -> &CoinsightConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    pub async fn analyze(&self, token: &str) -> AnalysisResult {
        self.engine.analyze(token).await
    }

    pub async fn debate(
        &self,
        input: &AgentInput,
        config: &DebateConfig,
    ) -> Result<ConsensusDecision, AgentError> {
        self.orchestrator.debate(input, config).await
    }

    pub fn runner(&self) -> Result<BacktestRunner, BacktestError> {
        BacktestRunner::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.orchestrator),
            self.store.clone(),
            self.config.backtest.concurrency,
            self.config.backtest.rounds,
        )
    }

    pub async fn run_backtest_day(&self, limit: usize) -> Result<usize, BacktestError> {
        self.runner()?.run_day(limit).await
    }

    pub fn backtest_summary(&self, days: u32) -> Result<BacktestSummary, BacktestError> {
        coinsight_backtest::backtest_summary(self.store.as_ref(), days)
    }

    pub fn alerts(&self) -> Result<Vec<AlertEvent>, BacktestError> {
        coinsight_backtest::evaluate_alerts(self.store.as_ref(), &self.config.alerts, Utc::now())
    }

    /// Scheduled daemon using the backtest section of the config.
    pub fn daemon(&self) -> Result<Daemon, BacktestError> {
        let backtest = &self.config.backtest;
        let schedule = DailySchedule::new(backtest.schedule_hour_utc, backtest.schedule_minute_utc)?;
        Ok(Daemon::new(
            Arc::new(self.runner()?),
            self.store.clone(),
            self.config.alerts.clone(),
            schedule,
            backtest.universe_limit,
        )
        .with_cache(Arc::clone(&self.cache)))
    }
}
