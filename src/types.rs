//! Core record types shared by the store, pipeline and decision engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A migrated coin as stored in `migrated_coins`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CoinRecord {
    pub id: i64,
    pub coin_symbol: String,
    pub market_cap: Option<f64>,
    pub volume: Option<f64>,
    /// Aggregate sentiment of the coin's posts, [-1, 1]
    pub sentiment_score: Option<f64>,
    pub migration_date: DateTime<Utc>,
}

impl CoinRecord {
    /// Read-only view used by status outputs
    pub fn summary(&self) -> CoinSummary {
        CoinSummary {
            coin: self.coin_symbol.clone(),
            sentiment: self.sentiment_score,
        }
    }
}

/// A coin about to be inserted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCoin {
    pub coin_symbol: String,
    pub market_cap: Option<f64>,
    pub volume: Option<f64>,
    pub sentiment_score: Option<f64>,
    /// Defaults to the insertion time when unset
    pub migration_date: Option<DateTime<Utc>>,
}

impl NewCoin {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            coin_symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_sentiment(mut self, score: f64) -> Self {
        self.sentiment_score = Some(score);
        self
    }

    pub fn migrated_at(mut self, at: DateTime<Utc>) -> Self {
        self.migration_date = Some(at);
        self
    }
}

/// A social post (tweet) as stored in `tweets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostRecord {
    pub id: i64,
    pub coin_id: i64,
    pub content: String,
    pub sentiment: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A post about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub coin_id: i64,
    pub content: String,
    pub sentiment: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A scored post whose coin is inserted in the same write
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub content: String,
    pub sentiment: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl PostDraft {
    pub fn for_coin(&self, coin_id: i64) -> NewPost {
        NewPost {
            coin_id,
            content: self.content.clone(),
            sentiment: self.sentiment,
            created_at: self.created_at,
        }
    }
}

/// `{coin, sentiment}` pair shown by status views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSummary {
    pub coin: String,
    pub sentiment: Option<f64>,
}

impl fmt::Display for CoinSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sentiment {
            Some(score) => write!(f, "{} - Sentiment: {}", self.coin, score),
            None => write!(f, "{} - Sentiment: n/a", self.coin),
        }
    }
}

/// Recommendation logged by the decision engine. Nothing is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
