//! Threshold-based decision engine
//!
//! Classifies a coin's aggregate sentiment as BUY, SELL or HOLD and logs the
//! result. Decisions are observability only: no order is placed and no
//! balance changes.


use crate::config::TradingConfig;
use crate::types::{CoinRecord, Decision};
use tracing::{debug, info};

/// Pure classification. BUY is checked before SELL, so at a zero threshold
/// a zero score is a BUY.
pub fn classify(score: f64, threshold: f64) -> Decision {
    if score >= threshold {
        Decision::Buy
    } else if score <= -threshold {
        Decision::Sell
    } else {
        Decision::Hold
    }
}

/// Classify `coin` against the configured threshold and log the outcome.
/// A coin without a sentiment score is held.
pub fn decide(coin: &CoinRecord, thresholds: &TradingConfig) -> Decision {
    let Some(score) = coin.sentiment_score else {
        debug!("{} has no sentiment score yet", coin.coin_symbol);
        info!("{}: {} - Sentiment Score: n/a", Decision::Hold, coin.coin_symbol);
        return Decision::Hold;
    };

    let decision = classify(score, thresholds.sentiment_threshold);
    info!("{}: {} - Sentiment Score: {}", decision, coin.coin_symbol, score);
    decision
}

/// Decision engine bound to one trading configuration
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    thresholds: TradingConfig,
}

impl DecisionEngine {
    pub fn new(thresholds: TradingConfig) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &TradingConfig {
        &self.thresholds
    }

    pub fn decide(&self, coin: &CoinRecord) -> Decision {
        decide(coin, &self.thresholds)
    }
}
