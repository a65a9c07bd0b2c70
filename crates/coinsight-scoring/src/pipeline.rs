//! Ordered fusion of provider signals into the base score.
//!
//! Each step is a pure `(ScoreState, &Signals) -> ScoreState` function and
//! always appends at least one evidence line. Steps run in `PIPELINE` order
//! regardless of the order the signals arrived in.

use coinsight_models::{AnalysisResult, ContractMeta, DexPair, Holder, MarketSnapshot, Outlook, Risk};

use crate::normalize::{bucket_label, compact_usd, minmax, to_score};

const TOP_HOLDERS: usize = 10;
const CONCENTRATION_LIMIT: f64 = 0.5;

/// Outcome of one provider lookup as seen by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    /// The provider answered with nothing or was unavailable.
    NoData,
    /// The analysis deadline passed before the provider answered.
    TimedOut,
    /// Not applicable to this input (e.g. on-chain checks for a symbol).
    Skipped,
}

/// Everything fetched for one analysis.
#[derive(Debug, Clone)]
pub struct Signals {
    pub market: Fetched<MarketSnapshot>,
    pub contract: Fetched<ContractMeta>,
    pub dex: Fetched<Vec<DexPair>>,
    pub holders: Fetched<Vec<Holder>>,
}

impl Signals {
    /// No provider answered. On-chain steps are skipped for symbols.
    pub fn none(address: bool) -> Self {
        fn on_chain<T>(address: bool) -> Fetched<T> {
            if address {
                Fetched::NoData
            } else {
                Fetched::Skipped
            }
        }
        Self {
            market: Fetched::NoData,
            contract: on_chain(address),
            dex: on_chain(address),
            holders: on_chain(address),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreState {
    pub token: String,
    pub score: u8,
    pub outlook: Outlook,
    pub evidence: Vec<String>,
    /// Set by the market step; the holder step needs it.
    pub market_cap: Option<f64>,
}

impl ScoreState {
    pub fn from_base(base: AnalysisResult) -> Self {
        Self {
            token: base.token,
            score: base.score,
            outlook: base.outlook,
            evidence: base.evidence,
            market_cap: None,
        }
    }

    pub fn finish(self) -> AnalysisResult {
        AnalysisResult {
            risk: Risk::from_score(self.score),
            token: self.token,
            score: self.score,
            outlook: self.outlook,
            evidence: self.evidence,
        }
    }

    fn note(mut self, line: impl Into<String>) -> Self {
        self.evidence.push(line.into());
        self
    }
}

pub type Step = fn(ScoreState, &Signals) -> ScoreState;

pub const PIPELINE: [(&str, Step); 4] = [
    ("market", market_step),
    ("contract", contract_step),
    ("dex", dex_step),
    ("holders", holders_step),
];

/// Run every step in order over the base result.
pub fn fuse(base: AnalysisResult, signals: &Signals) -> AnalysisResult {
    PIPELINE
        .iter()
        .fold(ScoreState::from_base(base), |state, (_, step)| {
            step(state, signals)
        })
        .finish()
}

pub fn market_step(mut state: ScoreState, signals: &Signals) -> ScoreState {
    let m = match &signals.market {
        Fetched::Data(m) => m,
        Fetched::TimedOut => {
            return state.note("Market: provider timed out; used heuristic only (fallback).")
        }
        Fetched::NoData | Fetched::Skipped => {
            return state.note("Market: live data unavailable; used heuristic only (fallback).")
        }
    };

    let vol_norm = minmax(m.volume_24h, 1e6, 1e9);
    let mom_norm = minmax(m.d7_pct, -30.0, 30.0);
    let sub = ((0.6 * vol_norm + 0.4 * mom_norm) * 100.0).round();
    state.score = to_score(0.7 * f64::from(state.score) + 0.3 * sub);
    state.outlook = Outlook::from_d1_pct(m.d1_pct);
    state.market_cap = Some(m.market_cap);

    state
        .note(format!("Market: 24h {:.2}%; 7d {:.2}%.", m.d1_pct, m.d7_pct))
        .note(format!(
            "Volume: ${} ({} vs peers).",
            compact_usd(m.volume_24h),
            bucket_label(vol_norm)
        ))
        .note("Source: CoinGecko.")
}

pub fn contract_step(mut state: ScoreState, signals: &Signals) -> ScoreState {
    let meta = match &signals.contract {
        Fetched::Data(meta) => meta,
        Fetched::Skipped => {
            return state.note("On-chain: Skipped (symbol provided, not a contract address).")
        }
        Fetched::TimedOut => {
            return state.note("On-chain: Etherscan lookup timed out (no change applied).")
        }
        Fetched::NoData => {
            return state.note("On-chain: Etherscan metadata unavailable (no change applied).")
        }
    };

    state = if meta.verified {
        state.score = state.score.saturating_add(6).min(100);
        state.note(format!(
            "On-chain: Contract is verified on Etherscan (compiler {}, license {}).",
            meta.compiler_version.as_deref().unwrap_or("unknown"),
            meta.license_type.as_deref().unwrap_or("n/a"),
        ))
    } else {
        state.score = state.score.saturating_sub(12);
        state.note("On-chain: Contract source NOT verified on Etherscan (-12, risk up).")
    };

    if meta.proxy {
        let detail = meta
            .implementation
            .as_deref()
            .map(|i| format!(" (implementation {i})"))
            .unwrap_or_default();
        state = state.note(format!("On-chain: Contract is a PROXY{detail}."));
    }
    state
}

pub fn dex_step(mut state: ScoreState, signals: &Signals) -> ScoreState {
    let pairs = match &signals.dex {
        Fetched::Data(pairs) => pairs,
        Fetched::Skipped => {
            return state.note("DEX: Skipped (symbol provided, not a contract address).")
        }
        Fetched::TimedOut => {
            return state.note("DEX: DexScreener lookup timed out (no change applied).")
        }
        Fetched::NoData => {
            return state.note("DEX: liquidity data unavailable (no change applied).")
        }
    };

    let Some(best) = pairs
        .iter()
        .max_by(|a, b| a.liquidity_usd.total_cmp(&b.liquidity_usd))
    else {
        state.score = state.score.saturating_sub(15);
        return state.note("DEX: No liquidity found on DexScreener (-15).");
    };

    let liq_norm = minmax(best.liquidity_usd, 5e4, 5e7);
    let vol_norm = minmax(best.volume_24h, 1e4, 1e7);
    let sub = ((0.5 * liq_norm + 0.5 * vol_norm) * 100.0).round();
    state.score = to_score(0.8 * f64::from(state.score) + 0.2 * sub);

    state.note(format!(
        "DEX: deepest pool on {} ({}) has ${} liquidity ({}), 24h volume ${}.",
        best.dex_id,
        best.chain_id,
        compact_usd(best.liquidity_usd),
        bucket_label(liq_norm),
        compact_usd(best.volume_24h),
    ))
}

pub fn holders_step(mut state: ScoreState, signals: &Signals) -> ScoreState {
    let holders = match &signals.holders {
        Fetched::Data(holders) => holders,
        Fetched::Skipped => {
            return state.note("Holders: Skipped (symbol provided, not a contract address).")
        }
        Fetched::TimedOut => {
            return state.note("Holders: holder lookup timed out (no change applied).")
        }
        Fetched::NoData => {
            return state.note("Holders: holder data unavailable (no change applied).")
        }
    };

    let Some(cap) = state.market_cap.filter(|c| *c > 0.0) else {
        return state
            .note("Holders: market cap unavailable, concentration not assessed (no change applied).");
    };

    let top: f64 = holders
        .iter()
        .take(TOP_HOLDERS)
        .map(|h| h.balance_usd)
        .sum();
    let share = top / cap;
    let pct = share * 100.0;

    if share > CONCENTRATION_LIMIT {
        state.score = state.score.saturating_sub(15);
        state.note(format!(
            "Holders: top {TOP_HOLDERS} hold {pct:.1}% of market cap, highly concentrated (-15)."
        ))
    } else {
        state.score = state.score.saturating_add(5).min(100);
        state.note(format!(
            "Holders: top {TOP_HOLDERS} hold {pct:.1}% of market cap (+5)."
        ))
    }
}
