use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use coinsight_models::{AlertCondition, AlertEvent, AlertRule, SignalDaily};
use coinsight_store::SignalStore;
use tracing::{debug, info};

use crate::error::BacktestError;

/// Days of signals loaded to find each token's latest and previous rows.
const LOOKBACK_DAYS: i64 = 2;

/// Evaluate active rules against the most recent daily signals.
pub fn evaluate_alerts(
    store: &dyn SignalStore,
    rules: &[AlertRule],
    now: DateTime<Utc>,
) -> Result<Vec<AlertEvent>, BacktestError> {
    let active: Vec<&AlertRule> = rules.iter().filter(|r| r.active).collect();
    if active.is_empty() {
        return Ok(Vec::new());
    }

    let since = now.date_naive() - Duration::days(LOOKBACK_DAYS);
    let rows = store.signals_since(since)?;
    let history = latest_by_token(rows);

    let events: Vec<AlertEvent> = active
        .into_iter()
        .filter_map(|rule| {
            let rows = history
                .get(&rule.token.to_uppercase())
                .map(Vec::as_slice)
                .unwrap_or_default();
            fire(rule, rows, now)
        })
        .collect();

    info!(rules = rules.len(), fired = events.len(), "Alerts evaluated");
    Ok(events)
}

/// Rows per uppercase token, newest first.
fn latest_by_token(rows: Vec<SignalDaily>) -> HashMap<String, Vec<SignalDaily>> {
    let mut by_token: HashMap<String, Vec<SignalDaily>> = HashMap::new();
    for row in rows {
        by_token.entry(row.token.to_uppercase()).or_default().push(row);
    }
    for rows in by_token.values_mut() {
        rows.sort_by(|a, b| b.date.cmp(&a.date));
    }
    by_token
}

fn fire(rule: &AlertRule, rows: &[SignalDaily], now: DateTime<Utc>) -> Option<AlertEvent> {
    let latest = rows.first();
    let prev = rows.get(1);

    let reason = match (&rule.condition, latest, prev) {
        (AlertCondition::ConsensusFlip, Some(l), Some(p)) if l.decision != p.decision => {
            format!("Consensus flipped {} -> {}", p.decision, l.decision)
        }
        (AlertCondition::ScoreThreshold { score_gte }, Some(l), _) if l.score >= *score_gte => {
            format!("Score {} >= {score_gte}", l.score)
        }
        (AlertCondition::RiskChange, Some(l), Some(p)) if l.risk != p.risk => {
            format!("Risk changed {} -> {}", p.risk, l.risk)
        }
        _ => return None,
    };
    debug!(token = %rule.token, kind = rule.condition.name(), %reason, "Alert fired");

    Some(AlertEvent {
        rule_id: rule.id,
        token: rule.token.clone(),
        kind: rule.condition.name().to_string(),
        reason,
        snapshot: latest.cloned(),
        at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use coinsight_models::{Outlook, Risk, Stance};
    use coinsight_store::MemoryStore;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn signal(day: u32, token: &str, score: u8, decision: Stance) -> SignalDaily {
        SignalDaily {
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            token: token.to_string(),
            score,
            risk: Risk::from_score(score),
            outlook: Outlook::Neutral,
            decision,
            confidence: 0.6,
            price_usd: dec!(1),
        }
    }

    fn rule(token: &str, condition: AlertCondition) -> AlertRule {
        AlertRule {
            id: Uuid::new_v4(),
            token: token.to_string(),
            condition,
            active: true,
        }
    }

    fn store(rows: &[SignalDaily]) -> MemoryStore {
        let store = MemoryStore::new();
        for row in rows {
            store.upsert_signal(row).unwrap();
        }
        store
    }

    #[test]
    fn consensus_flip_fires_on_changed_decision() {
        let store = store(&[
            signal(9, "ETH", 60, Stance::Hold),
            signal(10, "ETH", 72, Stance::Buy),
            signal(10, "BTC", 72, Stance::Buy),
            signal(9, "BTC", 72, Stance::Buy),
        ]);
        let rules = [
            rule("eth", AlertCondition::ConsensusFlip),
            rule("BTC", AlertCondition::ConsensusFlip),
        ];

        let events = evaluate_alerts(&store, &rules, now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].token, "eth");
        assert_eq!(events[0].kind, "consensus_flip");
        assert_eq!(events[0].reason, "Consensus flipped HOLD -> BUY");
        assert_eq!(events[0].snapshot.as_ref().unwrap().score, 72);
        assert_eq!(events[0].at, now());
    }

    #[test]
    fn score_threshold_needs_only_latest() {
        let store = store(&[signal(10, "SOL", 80, Stance::Buy)]);
        let rules = [
            rule("SOL", AlertCondition::ScoreThreshold { score_gte: 80 }),
            rule("SOL", AlertCondition::ScoreThreshold { score_gte: 81 }),
            rule("SOL", AlertCondition::ConsensusFlip),
        ];

        let events = evaluate_alerts(&store, &rules, now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, "Score 80 >= 80");
    }

    #[test]
    fn risk_change_and_inactive_rules() {
        let store = store(&[
            signal(9, "PEPE", 45, Stance::Hold),
            signal(10, "PEPE", 30, Stance::Sell),
        ]);
        let mut inactive = rule("PEPE", AlertCondition::ConsensusFlip);
        inactive.active = false;
        let rules = [rule("PEPE", AlertCondition::RiskChange), inactive];

        let events = evaluate_alerts(&store, &rules, now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, "Risk changed Medium -> High");
    }

    #[test]
    fn stale_rows_are_ignored() {
        let store = store(&[
            signal(1, "ETH", 40, Stance::Sell),
            signal(10, "ETH", 75, Stance::Buy),
        ]);
        let rules = [rule("ETH", AlertCondition::ConsensusFlip)];
        assert!(evaluate_alerts(&store, &rules, now()).unwrap().is_empty());
    }
}
