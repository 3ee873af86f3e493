//! One ingestion cycle: fetch, score, persist, decide

use super::{parse_events, MigrationEvent};
use crate::client::HttpFetcher;
use crate::config::FeedConfig;
use crate::error::Result;
use crate::sentiment::SentimentScorer;
use crate::storage::CoinRepository;
use crate::strategy::DecisionEngine;
use crate::types::{CoinRecord, Decision, NewCoin, PostDraft, PostRecord};
use chrono::Utc;
use std::sync::Arc;

/// Result of processing one migration event
#[derive(Debug, Clone)]
pub struct Processed {
    pub coin: CoinRecord,
    pub posts: Vec<PostRecord>,
    pub decision: Decision,
}

/// Summary of one cycle
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// False when the feed returned nothing this cycle
    pub fetched: bool,
    pub decisions: Vec<(String, Decision)>,
    pub failed: usize,
}

impl CycleReport {
    pub fn processed(&self) -> usize {
        self.decisions.len()
    }
}

pub struct Pipeline {
    store: Arc<dyn CoinRepository>,
    scorer: Arc<dyn SentimentScorer>,
    fetcher: HttpFetcher,
    engine: DecisionEngine,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn CoinRepository>,
        scorer: Arc<dyn SentimentScorer>,
        fetcher: HttpFetcher,
        engine: DecisionEngine,
    ) -> Self {
        Self {
            store,
            scorer,
            fetcher,
            engine,
        }
    }

    /// Score the event's posts, persist coin and posts as one write, and
    /// log a decision. A failed write leaves nothing behind.
    pub async fn process(&self, event: MigrationEvent) -> Result<Processed> {
        let new_coin = NewCoin {
            coin_symbol: event.coin_symbol,
            market_cap: event.market_cap,
            volume: event.volume,
            sentiment_score: None,
            migration_date: event.migrated_at,
        };
        let drafts: Vec<PostDraft> = event
            .posts
            .into_iter()
            .map(|post| PostDraft {
                sentiment: Some(self.scorer.score(&post.content)),
                content: post.content,
                created_at: post.created_at.unwrap_or_else(Utc::now),
            })
            .collect();

        let (coin, posts) = self.store.record_migration(&new_coin, &drafts).await?;
        tracing::info!(
            "New migration recorded: {} (id {}, {} posts, aggregate sentiment {:?})",
            coin.coin_symbol,
            coin.id,
            posts.len(),
            coin.sentiment_score
        );

        let decision = self.engine.decide(&coin);
        Ok(Processed {
            coin,
            posts,
            decision,
        })
    }

    /// Fetch the feed once and process every event in it. A failed fetch
    /// yields an empty report; a failed event is logged and skipped.
    pub async fn run_cycle(&self, feed: &FeedConfig) -> CycleReport {
        tracing::info!("Running ingestion cycle against {}", feed.url);

        let query = feed.query();
        let Some(payload) = self
            .fetcher
            .fetch_json(&feed.url, Some(&feed.headers), Some(query.as_slice()))
            .await
        else {
            tracing::warn!("No data from {} this cycle", feed.url);
            return CycleReport::default();
        };

        let (events, undecodable) = parse_events(payload);
        let mut report = CycleReport {
            fetched: true,
            decisions: Vec::with_capacity(events.len()),
            failed: undecodable,
        };

        for event in events {
            let symbol = event.coin_symbol.clone();
            match self.process(event).await {
                Ok(processed) => report.decisions.push((symbol, processed.decision)),
                Err(e) => {
                    tracing::error!("Failed to process migration for {}: {}", symbol, e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Cycle complete: {} processed, {} failed",
            report.processed(),
            report.failed
        );
        report
    }
}
