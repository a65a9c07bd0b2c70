//! End-to-end debates with the real agents over scripted provider data.

use std::sync::Arc;
use std::time::Duration;

use coinsight_agents::{DebatePhase, Orchestrator};
use coinsight_models::{
    AgentFeatures, AgentInput, AgentKind, ContractMeta, DebateConfig, Risk, Stance,
};
use coinsight_providers::test_support::{post, snapshot, FixtureSource};
use coinsight_scoring::ScoringEngine;
use coinsight_store::sqlite::StoreTable;
use coinsight_store::{MemoryStore, SqliteStore};

const SCAM: &str = "0x6982508145454Ce325dDbE47a25d4ec3d2311933";

fn engine(source: FixtureSource) -> Arc<ScoringEngine> {
    Arc::new(ScoringEngine::new(Arc::new(source), Duration::from_secs(5)))
}

/// Uptrend alternating +1.2% and +0.8% days.
fn steady_up(days: usize) -> Vec<f64> {
    let mut price = 2000.0;
    (0..days)
        .map(|i| {
            price *= if i % 2 == 0 { 1.012 } else { 1.008 };
            price
        })
        .collect()
}

#[tokio::test]
async fn blue_chip_with_strong_signals_is_unanimous_buy() {
    let source = FixtureSource::new()
        .with_market("ETH", snapshot("ETH", 1e9, 5.0, 22.5))
        .with_news("ETH", vec![post(10, 1, 2), post(4, 0, 1)])
        .with_closes(60, steady_up(60));
    let store = Arc::new(MemoryStore::new());
    let orch = Orchestrator::standard(engine(source), store.clone(), Duration::from_secs(10));

    let decision = orch
        .debate(&AgentInput::new("ETH"), &DebateConfig::default())
        .await
        .unwrap();

    assert_eq!(decision.decision, Stance::Buy);
    assert_eq!(decision.opinions.len(), 9);
    assert!(decision.opinions.iter().all(|o| o.stance == Stance::Buy));
    // sentiment 1.0 + valuation 1.0 + risk 0.7 per round
    assert!((decision.confidence - 0.9).abs() < 1e-9);
    assert!(decision.rationale[0].starts_with("[sentiment] News sentiment: 2 recent articles"));
    assert!(decision.rationale[1].starts_with("[valuation] Quant: daily σ"));
    assert_eq!(decision.rationale[2], "[risk] Risk level Low");

    let runs = store.agent_runs().unwrap();
    assert_eq!(runs.len(), 9);
    let valuation = runs
        .iter()
        .find(|r| r.agent == AgentKind::Valuation)
        .unwrap();
    assert_eq!(valuation.score, Some(81));
    assert_eq!(store.consensus_runs().unwrap()[0].rounds, 3);
}

#[tokio::test]
async fn unverified_illiquid_contract_is_sell() {
    let source = FixtureSource::new()
        .with_contract(ContractMeta::default())
        .with_dex(Vec::new());
    let store = Arc::new(MemoryStore::new());
    let orch = Orchestrator::standard(engine(source), store.clone(), Duration::from_secs(10));

    let config = DebateConfig {
        rounds: 1,
        quorum: 0.66,
    };
    let decision = orch.debate(&AgentInput::new(SCAM), &config).await.unwrap();

    assert_eq!(decision.decision, Stance::Sell);
    let risk = &decision.opinions[2];
    assert_eq!(risk.agent, AgentKind::Risk);
    assert_eq!(
        risk.features,
        AgentFeatures::Risk {
            risk: Risk::High,
            red_flag: true
        }
    );
    // valuation SELL 0.6 + risk SELL 0.8; sentiment HOLD at zero confidence
    assert!((decision.confidence - 1.4 / 3.0).abs() < 1e-9);
    assert!(decision.rationale[0].contains("No recent news"));
    assert!(decision.rationale[1].contains("insufficient history"));

    let run = &store.consensus_runs().unwrap()[0];
    assert_eq!(run.quorum, 0.66);
    assert_eq!(run.token, SCAM);
}

#[tokio::test]
async fn slow_providers_still_produce_a_decision() {
    let source = FixtureSource::new()
        .with_market("ETH", snapshot("ETH", 1e9, 5.0, 22.5))
        .with_delay(Duration::from_secs(30));
    let store = Arc::new(MemoryStore::new());
    let orch = Orchestrator::standard(engine(source), store.clone(), Duration::from_millis(200));
    let phases = orch.subscribe();

    let started = std::time::Instant::now();
    let decision = orch
        .debate(&AgentInput::new("ETH"), &DebateConfig::default())
        .await
        .unwrap();

    // every provider call hits the deadline, so at most the first round lands
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(decision.opinions.len() <= 3);
    assert!(decision.confidence <= 1.0);
    assert_eq!(*phases.borrow(), DebatePhase::Done);
    assert_eq!(store.consensus_runs().unwrap().len(), 1);
}

#[tokio::test]
async fn debates_persist_to_sqlite() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let orch = Orchestrator::standard(
        engine(FixtureSource::new()),
        store.clone(),
        Duration::from_secs(10),
    );

    let config = DebateConfig {
        rounds: 2,
        quorum: 0.5,
    };
    orch.debate(&AgentInput::new("MOONINU"), &config)
        .await
        .unwrap();
    orch.debate(&AgentInput::new("MOONINU"), &config)
        .await
        .unwrap();

    assert_eq!(store.count(StoreTable::AgentRuns).unwrap(), 12);
    assert_eq!(store.count(StoreTable::ConsensusRuns).unwrap(), 2);
    let history = store.consensus_runs_for("MOONINU", 10).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|r| r.decision == Stance::Sell));
}
