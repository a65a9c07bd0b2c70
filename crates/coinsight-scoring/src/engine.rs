use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use coinsight_models::{is_address, AnalysisResult};
use coinsight_providers::SignalSource;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::heuristic::base_score;
use crate::pipeline::{fuse, Fetched, Signals};

/// Fetches provider signals concurrently and fuses them into the base score.
pub struct ScoringEngine {
    source: Arc<dyn SignalSource>,
    analysis_timeout: Duration,
}

impl ScoringEngine {
    pub fn new(source: Arc<dyn SignalSource>, analysis_timeout: Duration) -> Self {
        Self {
            source,
            analysis_timeout,
        }
    }

    pub fn source(&self) -> &Arc<dyn SignalSource> {
        &self.source
    }

    /// Analyze with the engine's own time budget.
    pub async fn analyze(&self, token: &str) -> AnalysisResult {
        self.analyze_until(token, Instant::now() + self.analysis_timeout)
            .await
    }

    /// Analyze, giving up on any provider still pending at `deadline`.
    ///
    /// Never fails: late or missing signals leave the score unchanged and
    /// add an evidence note.
    pub async fn analyze_until(&self, token: &str, deadline: Instant) -> AnalysisResult {
        let started = Instant::now();
        let token = token.trim();
        let address = is_address(token);
        let source = self.source.as_ref();

        let (market, contract, dex, holders) = tokio::join!(
            bounded(deadline, source.market_snapshot(token)),
            on_chain(address, deadline, source.contract_meta(token)),
            on_chain(address, deadline, source.dex_pairs(token)),
            on_chain(address, deadline, source.top_holders(token)),
        );
        let signals = Signals {
            market,
            contract,
            dex,
            holders,
        };
        debug!(
            token,
            market = label(&signals.market),
            contract = label(&signals.contract),
            dex = label(&signals.dex),
            holders = label(&signals.holders),
            "Signals gathered"
        );

        let result = fuse(base_score(token), &signals);
        info!(
            token,
            score = result.score,
            risk = %result.risk,
            outlook = %result.outlook,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        result
    }
}

async fn bounded<T>(deadline: Instant, fut: impl Future<Output = Option<T>>) -> Fetched<T> {
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(Some(value)) => Fetched::Data(value),
        Ok(None) => Fetched::NoData,
        Err(_) => Fetched::TimedOut,
    }
}

async fn on_chain<T>(
    address: bool,
    deadline: Instant,
    fut: impl Future<Output = Option<T>>,
) -> Fetched<T> {
    if address {
        bounded(deadline, fut).await
    } else {
        Fetched::Skipped
    }
}

fn label<T>(fetched: &Fetched<T>) -> &'static str {
    match fetched {
        Fetched::Data(_) => "data",
        Fetched::NoData => "no_data",
        Fetched::TimedOut => "timed_out",
        Fetched::Skipped => "skipped",
    }
}
