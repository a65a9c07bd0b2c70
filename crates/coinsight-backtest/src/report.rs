//! Next-day performance of the daily BUY basket.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, Utc};
use coinsight_models::{BacktestSummary, SignalDaily, Stance};
use coinsight_scoring::quant::{cumulative_return, equity_drawdown, mean, simple_sharpe, stdev};
use coinsight_store::SignalStore;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::BacktestError;

/// Summary over rows dated within the last `days` days (UTC).
pub fn backtest_summary(store: &dyn SignalStore, days: u32) -> Result<BacktestSummary, BacktestError> {
    let today = Utc::now().date_naive();
    summary_since(store, today - Duration::days(i64::from(days)), days)
}

pub fn summary_since(
    store: &dyn SignalStore,
    since: NaiveDate,
    window_days: u32,
) -> Result<BacktestSummary, BacktestError> {
    let rows = store.signals_since(since)?;
    let returns = basket_returns(&rows);
    debug!(%since, rows = rows.len(), days = returns.len(), "Computed basket returns");
    Ok(summarize(window_days, &returns))
}

/// One return per consecutive pair of dates present in `rows`.
///
/// Each day's BUY basket is held until the next date. Holdings missing on
/// the next date, with a non-positive price, or whose return overflows add
/// nothing but still count toward the basket size.
pub fn basket_returns(rows: &[SignalDaily]) -> Vec<f64> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&SignalDaily>> = BTreeMap::new();
    for row in rows {
        by_date.entry(row.date).or_default().push(row);
    }

    let days: Vec<&Vec<&SignalDaily>> = by_date.values().collect();
    days.windows(2)
        .map(|pair| {
            let (today, next) = (pair[0], pair[1]);
            let next_price: HashMap<&str, Decimal> = next
                .iter()
                .map(|r| (r.token.as_str(), r.price_usd))
                .collect();

            let buys: Vec<&&SignalDaily> =
                today.iter().filter(|r| r.decision == Stance::Buy).collect();
            if buys.is_empty() {
                return 0.0;
            }

            let total = buys
                .iter()
                .filter_map(|b| holding_return(b, &next_price))
                .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(r));
            total
                .and_then(|t| t.checked_div(Decimal::from(buys.len())))
                .and_then(|avg| avg.to_f64())
                .unwrap_or(0.0)
        })
        .collect()
}

/// Next-day return of one holding, or `None` when it can't be priced or
/// falls outside the `Decimal` range.
fn holding_return(buy: &SignalDaily, next_price: &HashMap<&str, Decimal>) -> Option<Decimal> {
    let p0 = buy.price_usd;
    let p1 = *next_price.get(buy.token.as_str())?;
    if p0 <= Decimal::ZERO || p1 <= Decimal::ZERO {
        return None;
    }
    p1.checked_sub(p0)?.checked_div(p0)
}

fn summarize(window_days: u32, returns: &[f64]) -> BacktestSummary {
    BacktestSummary {
        window_days,
        daily_count: returns.len(),
        cumulative_return: cumulative_return(returns),
        mean_daily: mean(returns),
        stdev_daily: stdev(returns),
        sharpe_daily: simple_sharpe(returns),
        max_drawdown: equity_drawdown(returns),
    }
}
