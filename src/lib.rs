//! PumpFun migrated-coin monitor
//!
//! Watches newly migrated coins, scores the social posts seen for them,
//! records everything in a local database and logs a BUY/SELL/HOLD
//! recommendation. Nothing is ever traded.
//!
//! ## Architecture
//!
//! ```text
//! Config → Database
//! Feed → HttpFetcher → Pipeline → SentimentScorer → Database → DecisionEngine (log only)
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ingester;
pub mod sentiment;
pub mod storage;
pub mod strategy;
pub mod types;

pub use crate::config::{load_config, Config};
pub use crate::error::{BotError, Result};
