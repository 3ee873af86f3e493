//! Error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch from {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Coin {0} does not exist")]
    Reference(i64),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Coin {coin_id} still has {posts} posts")]
    CoinInUse { coin_id: i64, posts: i64 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for BotError {
    fn from(e: config::ConfigError) -> Self {
        BotError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
