//! Persistent store for migrated coins and their social posts
//!
//! `Database` is the SQLite-backed implementation of [`CoinRepository`].
//! The handle wraps a connection pool, so every operation checks out its own
//! connection and clones can be shared between tasks.

pub mod schema;

#[cfg(test)]
mod tests;

use crate::error::{BotError, Result};
use crate::types::{CoinRecord, NewCoin, NewPost, PostDraft, PostRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

const COIN_COLUMNS: &str =
    "id, coin_symbol, market_cap, volume, sentiment_score, migration_date";
const POST_COLUMNS: &str = "id, coin_id, content, sentiment, created_at";

/// Storage seam used by the ingestion pipeline
#[async_trait]
pub trait CoinRepository: Send + Sync {
    /// Insert a coin, defaulting its migration date to now
    async fn insert_coin(&self, coin: &NewCoin) -> Result<CoinRecord>;

    /// Insert a post; fails with [`BotError::Reference`] for an unknown coin
    async fn insert_post(&self, post: &NewPost) -> Result<PostRecord>;

    /// Most recent coins by migration date, newest first
    async fn recent_coins(&self, limit: i64) -> Result<Vec<CoinRecord>>;

    /// Recompute a coin's aggregate sentiment from its posts
    async fn refresh_sentiment(&self, coin_id: i64) -> Result<Option<f64>>;

    /// Insert a coin, its posts and the refreshed aggregate as one unit.
    /// Nothing is written if any step fails.
    async fn record_migration(
        &self,
        coin: &NewCoin,
        posts: &[PostDraft],
    ) -> Result<(CoinRecord, Vec<PostRecord>)>;
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database and ensure the schema exists
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database is a separate database
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let db = Self { pool };
        db.init_schema().await?;

        info!("Connected to coin database at {}", url);
        Ok(db)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Schema ensured ({} statements)", schema::STATEMENTS.len());
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn get_coin(&self, coin_id: i64) -> Result<Option<CoinRecord>> {
        let coin = sqlx::query_as::<_, CoinRecord>(&format!(
            "SELECT {COIN_COLUMNS} FROM migrated_coins WHERE id = ?"
        ))
        .bind(coin_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(coin)
    }

    pub async fn posts_for_coin(&self, coin_id: i64) -> Result<Vec<PostRecord>> {
        let posts = sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM tweets WHERE coin_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(coin_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn count_posts(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tweets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Delete a coin that has no posts. Returns false if it did not exist.
    #[instrument(skip(self))]
    pub async fn delete_coin(&self, coin_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tweets WHERE coin_id = ?")
            .bind(coin_id)
            .fetch_one(&mut *tx)
            .await?;
        if posts > 0 {
            warn!("Refusing to delete coin {} with {} posts", coin_id, posts);
            return Err(BotError::CoinInUse { coin_id, posts });
        }

        let deleted = sqlx::query("DELETE FROM migrated_coins WHERE id = ?")
            .bind(coin_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        Ok(deleted > 0)
    }
}

#[async_trait]
impl CoinRepository for Database {
    #[instrument(skip(self, coin), fields(symbol = %coin.coin_symbol))]
    async fn insert_coin(&self, coin: &NewCoin) -> Result<CoinRecord> {
        let mut tx = self.pool.begin().await?;
        let record = insert_coin_in(&mut *tx, coin).await?;
        tx.commit().await?;
        Ok(record)
    }

    #[instrument(skip(self, post), fields(coin_id = post.coin_id))]
    async fn insert_post(&self, post: &NewPost) -> Result<PostRecord> {
        let mut tx = self.pool.begin().await?;
        let record = insert_post_in(&mut *tx, post).await?;
        tx.commit().await?;
        Ok(record)
    }

    #[instrument(skip(self, coin, posts), fields(symbol = %coin.coin_symbol, posts = posts.len()))]
    async fn record_migration(
        &self,
        coin: &NewCoin,
        posts: &[PostDraft],
    ) -> Result<(CoinRecord, Vec<PostRecord>)> {
        // Dropping the transaction on any error rolls every row back
        let mut tx = self.pool.begin().await?;

        let mut record = insert_coin_in(&mut *tx, coin).await?;
        let mut stored = Vec::with_capacity(posts.len());
        for draft in posts {
            stored.push(insert_post_in(&mut *tx, &draft.for_coin(record.id)).await?);
        }
        if !stored.is_empty() {
            record.sentiment_score = refresh_sentiment_in(&mut *tx, record.id).await?;
        }

        tx.commit().await?;
        Ok((record, stored))
    }

    async fn recent_coins(&self, limit: i64) -> Result<Vec<CoinRecord>> {
        let coins = sqlx::query_as::<_, CoinRecord>(&format!(
            "SELECT {COIN_COLUMNS} FROM migrated_coins \
             ORDER BY migration_date DESC, id DESC LIMIT ?"
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(coins)
    }

    async fn refresh_sentiment(&self, coin_id: i64) -> Result<Option<f64>> {
        let mut conn = self.pool.acquire().await?;
        refresh_sentiment_in(&mut *conn, coin_id).await
    }
}

async fn insert_coin_in(conn: &mut SqliteConnection, coin: &NewCoin) -> Result<CoinRecord> {
    let symbol = coin.coin_symbol.trim();
    if symbol.is_empty() {
        return Err(BotError::InvalidRecord("coin symbol is empty".to_string()));
    }

    let latest: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT migration_date FROM migrated_coins WHERE coin_symbol = ? \
         ORDER BY migration_date DESC LIMIT 1",
    )
    .bind(symbol)
    .fetch_optional(&mut *conn)
    .await?;

    let migration_date = match (coin.migration_date, latest) {
        (Some(at), Some(prev)) if at < prev => {
            return Err(BotError::InvalidRecord(format!(
                "migration date {} for {} precedes latest {}",
                at, symbol, prev
            )));
        }
        (Some(at), _) => at,
        (None, Some(prev)) => Utc::now().max(prev),
        (None, None) => Utc::now(),
    };

    let record = sqlx::query_as::<_, CoinRecord>(&format!(
        "INSERT INTO migrated_coins (coin_symbol, market_cap, volume, sentiment_score, migration_date) \
         VALUES (?, ?, ?, ?, ?) RETURNING {COIN_COLUMNS}"
    ))
    .bind(symbol)
    .bind(coin.market_cap)
    .bind(coin.volume)
    .bind(coin.sentiment_score)
    .bind(migration_date)
    .fetch_one(&mut *conn)
    .await?;

    debug!("Inserted coin {} ({})", record.id, record.coin_symbol);
    Ok(record)
}

async fn insert_post_in(conn: &mut SqliteConnection, post: &NewPost) -> Result<PostRecord> {
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM migrated_coins WHERE id = ?")
        .bind(post.coin_id)
        .fetch_one(&mut *conn)
        .await?;
    if exists == 0 {
        warn!("Rejected post for unknown coin {}", post.coin_id);
        return Err(BotError::Reference(post.coin_id));
    }

    sqlx::query_as::<_, PostRecord>(&format!(
        "INSERT INTO tweets (coin_id, content, sentiment, created_at) \
         VALUES (?, ?, ?, ?) RETURNING {POST_COLUMNS}"
    ))
    .bind(post.coin_id)
    .bind(&post.content)
    .bind(post.sentiment)
    .bind(post.created_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_foreign_key(e, post.coin_id))
}

async fn refresh_sentiment_in(conn: &mut SqliteConnection, coin_id: i64) -> Result<Option<f64>> {
    let row: Option<Option<f64>> = sqlx::query_scalar(
        "UPDATE migrated_coins SET sentiment_score = COALESCE(\
             (SELECT AVG(sentiment) FROM tweets WHERE coin_id = ?1 AND sentiment IS NOT NULL), \
             sentiment_score) \
         WHERE id = ?1 RETURNING sentiment_score",
    )
    .bind(coin_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.ok_or(BotError::Reference(coin_id))
}

fn map_foreign_key(e: sqlx::Error, coin_id: i64) -> BotError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => BotError::Reference(coin_id),
        _ => BotError::Database(e),
    }
}
