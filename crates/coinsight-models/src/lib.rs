pub mod agent_message;
pub mod alert;
pub mod analysis;
pub mod cache_schema;
pub mod config;
pub mod provider_data;
pub mod signal;
pub mod store_schema;

pub use agent_message::{
    AgentFeatures, AgentInput, AgentKind, AgentOpinion, ConsensusDecision, DebateConfig,
    QuantMetrics, Stance,
};
pub use alert::{AlertCondition, AlertEvent, AlertRule};
pub use analysis::{is_address, AnalysisResult, Outlook, Risk};
pub use cache_schema::CacheRow;
pub use config::{
    BacktestConfig, CacheConfig, CoinsightConfig, DebateSettings, ProvidersConfig,
    ScoringConfig, StoreConfig,
};
pub use provider_data::{
    CoinRef, ContractMeta, DexPair, Holder, MarketSnapshot, NewsFeed, NewsPost, NewsVotes,
    UniverseEntry,
};
pub use signal::{AgentRun, BacktestSummary, ConsensusRun, SignalDaily};
