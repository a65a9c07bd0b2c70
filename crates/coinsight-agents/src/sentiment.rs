use std::sync::Arc;

use async_trait::async_trait;
use coinsight_models::{AgentFeatures, AgentInput, AgentKind, AgentOpinion, NewsFeed, Stance};
use coinsight_scoring::normalize::clamp;
use coinsight_scoring::ScoringEngine;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::specialist::SpecialistAgent;

const STANCE_THRESHOLD: f64 = 0.25;
/// Momentum fallback thresholds, in percent.
const D1_BUY: f64 = 3.0;
const D1_SELL: f64 = -3.0;

/// News-vote sentiment, falling back to 24h momentum when there is no news.
pub struct SentimentAgent {
    engine: Arc<ScoringEngine>,
}

impl SentimentAgent {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        Self { engine }
    }
}

/// `d1_pct` is only consulted when the feed has no posts.
pub fn sentiment_opinion(feed: &NewsFeed, d1_pct: Option<f64>) -> AgentOpinion {
    if feed.posts.is_empty() {
        return momentum_opinion(feed, d1_pct.unwrap_or(0.0));
    }

    let n = feed.posts.len();
    let score: i64 = feed.posts.iter().map(|p| p.votes.weighted()).sum();
    let normalized = clamp(score as f64 / (3.0 * n as f64), -1.0, 1.0);
    let stance = if normalized >= STANCE_THRESHOLD {
        Stance::Buy
    } else if normalized <= -STANCE_THRESHOLD {
        Stance::Sell
    } else {
        Stance::Hold
    };

    AgentOpinion {
        agent: AgentKind::Sentiment,
        stance,
        confidence: normalized.abs(),
        rationale: format!(
            "News sentiment: {n} recent articles; aggregate vote score={:.2} (normalized {normalized:.2}).",
            score as f64
        ),
        features: AgentFeatures::Sentiment {
            posts: n,
            news_symbol: feed.symbol.clone(),
            aggregate_score: score as f64,
            normalized,
            d1_pct: None,
        },
    }
}

fn momentum_opinion(feed: &NewsFeed, d1: f64) -> AgentOpinion {
    let stance = if d1 >= D1_BUY {
        Stance::Buy
    } else if d1 <= D1_SELL {
        Stance::Sell
    } else {
        Stance::Hold
    };

    AgentOpinion {
        agent: AgentKind::Sentiment,
        stance,
        confidence: f64::min(1.0, d1.abs() / 10.0),
        rationale: format!(
            "No recent news; fallback to 24h change {d1:.2}% as sentiment proxy."
        ),
        features: AgentFeatures::Sentiment {
            posts: 0,
            news_symbol: feed.symbol.clone(),
            aggregate_score: 0.0,
            normalized: 0.0,
            d1_pct: Some(d1),
        },
    }
}

#[async_trait]
impl SpecialistAgent for SentimentAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Sentiment
    }

    async fn evaluate(&self, input: &AgentInput, deadline: Instant) -> AgentOpinion {
        let source = self.engine.source();
        let feed = timeout_at(deadline, source.news(&input.token))
            .await
            .unwrap_or_else(|_| {
                debug!(token = %input.token, "News fetch hit the deadline");
                NewsFeed::default()
            });

        if !feed.posts.is_empty() {
            return sentiment_opinion(&feed, None);
        }

        let d1 = timeout_at(deadline, source.market_snapshot(&input.token))
            .await
            .ok()
            .flatten()
            .map(|m| m.d1_pct);
        sentiment_opinion(&feed, d1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinsight_providers::test_support::{post, snapshot, FixtureSource};
    use std::time::Duration;

    fn feed(posts: Vec<coinsight_models::NewsPost>) -> NewsFeed {
        NewsFeed {
            symbol: Some("ETH".to_string()),
            posts,
        }
    }

    #[test]
    fn positive_votes_buy() {
        // (5 - 1) + (3 + 2) = 9 → 9 / 6 clamps to 1
        let op = sentiment_opinion(&feed(vec![post(5, 1, 0), post(3, 0, 1)]), None);
        assert_eq!(op.stance, Stance::Buy);
        assert_eq!(op.confidence, 1.0);
        assert_eq!(
            op.rationale,
            "News sentiment: 2 recent articles; aggregate vote score=9.00 (normalized 1.00)."
        );
    }

    #[test]
    fn mixed_votes_hold() {
        // 1 + (-1) + 0 + 0 = 0
        let op = sentiment_opinion(
            &feed(vec![post(1, 0, 0), post(0, 1, 0), post(0, 0, 0), post(0, 0, 0)]),
            Some(9.0),
        );
        assert_eq!(op.stance, Stance::Hold);
        assert_eq!(op.confidence, 0.0);
        match op.features {
            AgentFeatures::Sentiment { posts, d1_pct, .. } => {
                assert_eq!(posts, 4);
                assert_eq!(d1_pct, None);
            }
            other => panic!("unexpected features {other:?}"),
        }
    }

    #[test]
    fn negative_votes_sell() {
        // -3 over 4 posts → -0.25
        let op = sentiment_opinion(
            &feed(vec![post(0, 3, 0), post(0, 0, 0), post(0, 0, 0), post(0, 0, 0)]),
            None,
        );
        assert_eq!(op.stance, Stance::Sell);
        assert_eq!(op.confidence, 0.25);
    }

    #[test]
    fn no_news_falls_back_to_momentum() {
        let up = sentiment_opinion(&NewsFeed::default(), Some(4.0));
        assert_eq!(up.stance, Stance::Buy);
        assert!((up.confidence - 0.4).abs() < 1e-12);
        assert_eq!(
            up.rationale,
            "No recent news; fallback to 24h change 4.00% as sentiment proxy."
        );

        let crash = sentiment_opinion(&NewsFeed::default(), Some(-25.0));
        assert_eq!(crash.stance, Stance::Sell);
        assert_eq!(crash.confidence, 1.0);

        let flat = sentiment_opinion(&NewsFeed::default(), None);
        assert_eq!(flat.stance, Stance::Hold);
        assert_eq!(flat.confidence, 0.0);
        assert!(matches!(
            flat.features,
            AgentFeatures::Sentiment {
                d1_pct: Some(d1),
                ..
            } if d1 == 0.0
        ));
    }

    #[tokio::test]
    async fn agent_uses_market_only_without_news() {
        let source = FixtureSource::new().with_market("PEPE", snapshot("PEPE", 1e8, -3.5, 0.0));
        let engine = Arc::new(ScoringEngine::new(
            Arc::new(source.clone()),
            Duration::from_secs(5),
        ));
        let agent = SentimentAgent::new(engine);

        let deadline = Instant::now() + Duration::from_secs(5);
        let op = agent.evaluate(&AgentInput::new("PEPE"), deadline).await;
        assert_eq!(op.stance, Stance::Sell);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn agent_skips_market_when_news_exists() {
        let source = FixtureSource::new().with_news("ETH", vec![post(6, 0, 0)]);
        let engine = Arc::new(ScoringEngine::new(
            Arc::new(source.clone()),
            Duration::from_secs(5),
        ));

        let deadline = Instant::now() + Duration::from_secs(5);
        let op = SentimentAgent::new(engine)
            .evaluate(&AgentInput::new("ETH"), deadline)
            .await;
        assert_eq!(op.stance, Stance::Buy);
        assert_eq!(source.call_count(), 1);
    }
}
