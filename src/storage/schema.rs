//! Table definitions for the coin store
//!
//! Statements are idempotent and run on every connect. There are no
//! migrations: changing a column means a new database file.

pub const CREATE_MIGRATED_COINS: &str = r#"
CREATE TABLE IF NOT EXISTS migrated_coins (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    coin_symbol TEXT NOT NULL,
    market_cap REAL,
    volume REAL,
    sentiment_score REAL,
    migration_date TEXT NOT NULL
)
"#;

pub const CREATE_COIN_SYMBOL_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS ix_migrated_coins_coin_symbol
    ON migrated_coins (coin_symbol)
"#;

pub const CREATE_MIGRATION_DATE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS ix_migrated_coins_migration_date
    ON migrated_coins (migration_date)
"#;

/// Posts are owned by their coin; a coin with posts cannot be deleted.
pub const CREATE_TWEETS: &str = r#"
CREATE TABLE IF NOT EXISTS tweets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    coin_id INTEGER NOT NULL REFERENCES migrated_coins (id) ON DELETE RESTRICT,
    content TEXT NOT NULL,
    sentiment REAL,
    created_at TEXT NOT NULL
)
"#;

pub const CREATE_TWEETS_COIN_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS ix_tweets_coin_id ON tweets (coin_id)
"#;

/// Execution order matters: `tweets` references `migrated_coins`.
pub const STATEMENTS: &[&str] = &[
    CREATE_MIGRATED_COINS,
    CREATE_COIN_SYMBOL_INDEX,
    CREATE_MIGRATION_DATE_INDEX,
    CREATE_TWEETS,
    CREATE_TWEETS_COIN_INDEX,
];
