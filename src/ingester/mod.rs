//! Migration event ingestion
//!
//! ```text
//! Feed (HTTP) → fetch_json → MigrationEvent → score posts → store → decide
//! ```

pub mod pipeline;


pub use pipeline::{CycleReport, Pipeline, Processed};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A coin that met its graduation criterion, with the posts seen for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent")]
pub struct MigrationEvent {
    pub coin_symbol: String,
    pub market_cap: Option<f64>,
    pub volume: Option<f64>,
    pub migrated_at: Option<DateTime<Utc>>,
    pub posts: Vec<SocialPost>,
}

/// Wire shape of an event. Feeds name the same field differently, and some
/// send more than one name; the first present name in each list wins:
/// `coin_symbol`, `symbol`, `coin`; `migrated_at`, `migration_date`;
/// `posts`, `tweets`.
#[derive(Deserialize)]
struct RawEvent {
    coin_symbol: Option<String>,
    symbol: Option<String>,
    coin: Option<String>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    migrated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    migration_date: Option<DateTime<Utc>>,
    posts: Option<Vec<SocialPost>>,
    tweets: Option<Vec<SocialPost>>,
}

impl TryFrom<RawEvent> for MigrationEvent {
    type Error = String;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let coin_symbol = raw
            .coin_symbol
            .or(raw.symbol)
            .or(raw.coin)
            .ok_or_else(|| "missing field `coin_symbol` (or `symbol`, `coin`)".to_string())?;

        Ok(Self {
            coin_symbol,
            market_cap: raw.market_cap,
            volume: raw.volume,
            migrated_at: raw.migrated_at.or(raw.migration_date),
            posts: raw.posts.or(raw.tweets).unwrap_or_default(),
        })
    }
}

impl MigrationEvent {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            coin_symbol: symbol.into(),
            market_cap: None,
            volume: None,
            migrated_at: None,
            posts: Vec::new(),
        }
    }

    pub fn with_post(mut self, content: impl Into<String>) -> Self {
        self.posts.push(SocialPost {
            content: content.into(),
            created_at: None,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPost")]
pub struct SocialPost {
    pub content: String,
    /// Observation time is used when the source omits it
    pub created_at: Option<DateTime<Utc>>,
}

/// `content` wins over `text` when a post carries both
#[derive(Deserialize)]
struct RawPost {
    content: Option<String>,
    text: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawPost> for SocialPost {
    type Error = String;

    fn try_from(raw: RawPost) -> Result<Self, Self::Error> {
        let content = raw
            .content
            .or(raw.text)
            .ok_or_else(|| "missing field `content` (or `text`)".to_string())?;
        Ok(Self {
            content,
            created_at: raw.created_at,
        })
    }
}

/// Decode a feed payload: a bare array, an object wrapping the array under
/// `data` or `coins`, or a single event object. Returns the decoded events
/// and the number of entries that could not be decoded.
pub fn parse_events(payload: Value) -> (Vec<MigrationEvent>, usize) {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("coins")) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                tracing::warn!("Feed payload wrapper is not an array");
                return (Vec::new(), 1);
            }
            None => vec![Value::Object(map)],
        },
        other => {
            tracing::warn!("Unexpected feed payload type: {}", other);
            return (Vec::new(), 1);
        }
    };

    let mut failed = 0;
    let events = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<MigrationEvent>(item) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("Skipping undecodable migration event: {}", e);
                failed += 1;
                None
            }
        })
        .collect();

    (events, failed)
}
