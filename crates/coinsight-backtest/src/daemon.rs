use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use coinsight_cache::JsonCache;
use coinsight_models::{AlertEvent, AlertRule};
use coinsight_store::SignalStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::alerts::evaluate_alerts;
use crate::error::BacktestError;
use crate::runner::BacktestRunner;

/// Time of day (UTC) the backtest runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32) -> Result<Self, BacktestError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|at| Self { at })
            .ok_or_else(|| BacktestError::Config(format!("invalid schedule time {hour:02}:{minute:02}")))
    }

    /// First scheduled instant strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

/// Runs the backtest day on a daily schedule, then evaluates alerts.
pub struct Daemon {
    runner: Arc<BacktestRunner>,
    store: Arc<dyn SignalStore>,
    rules: Vec<AlertRule>,
    schedule: DailySchedule,
    limit: usize,
    cache: Option<Arc<dyn JsonCache>>,
    cancel: CancellationToken,
}

impl Daemon {
    pub fn new(
        runner: Arc<BacktestRunner>,
        store: Arc<dyn SignalStore>,
        rules: Vec<AlertRule>,
        schedule: DailySchedule,
        limit: usize,
    ) -> Self {
        Self {
            runner,
            store,
            rules,
            schedule,
            limit,
            cache: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Purge expired provider cache rows after each run.
    pub fn with_cache(mut self, cache: Arc<dyn JsonCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns a CancellationToken that can be used to trigger shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until cancelled.
    pub async fn run(&self) -> Result<(), BacktestError> {
        info!("Coinsight backtest daemon starting");

        loop {
            let now = Utc::now();
            let next = self.schedule.next_after(now);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next = %next, "Next backtest run scheduled");

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Backtest daemon shutting down");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "Scheduled backtest failed");
                    }
                }
            }
        }

        info!("Coinsight backtest daemon stopped");
        Ok(())
    }

    /// One cycle: today's signals, then cache upkeep and alerts over the
    /// fresh rows.
    pub async fn run_once(&self) -> Result<Vec<AlertEvent>, BacktestError> {
        let written = self.runner.run_day(self.limit).await?;
        info!(written, "Daily signals written");

        if let Some(cache) = &self.cache {
            match cache.purge_expired() {
                Ok(purged) => info!(purged, "Expired cache entries purged"),
                Err(e) => warn!(error = %e, "Cache purge failed"),
            }
        }

        let events = evaluate_alerts(self.store.as_ref(), &self.rules, Utc::now())?;
        for event in &events {
            info!(token = %event.token, kind = %event.kind, reason = %event.reason, "Alert");
        }
        Ok(events)
    }
}
