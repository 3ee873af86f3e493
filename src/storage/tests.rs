//! Tests for the coin store

#[cfg(test)]
mod tests {
    use super::super::*;
    use chrono::{Duration, TimeZone, Utc};

    async fn memory_db() -> Database {
        Database::connect("sqlite::memory:").await.unwrap()
    }

    fn post(coin_id: i64, content: &str, sentiment: Option<f64>) -> NewPost {
        NewPost {
            coin_id,
            content: content.to_string(),
            sentiment,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("coins.db").display());

        let first = Database::connect(&url).await.unwrap();
        first.insert_coin(&NewCoin::new("PEPE")).await.unwrap();
        first.close().await;

        let second = Database::connect(&url).await.unwrap();
        let coins = second.recent_coins(5).await.unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].coin_symbol, "PEPE");
    }

    #[tokio::test]
    async fn test_insert_coin_assigns_id_and_date() {
        let db = memory_db().await;
        let before = Utc::now();
        let coin = db
            .insert_coin(&NewCoin::new("WIF").with_market_cap(1e6).with_volume(5e4))
            .await
            .unwrap();

        assert!(coin.id > 0);
        assert_eq!(coin.coin_symbol, "WIF");
        assert_eq!(coin.market_cap, Some(1e6));
        assert_eq!(coin.volume, Some(5e4));
        assert!(coin.sentiment_score.is_none());
        assert!(coin.migration_date >= before);
    }

    #[tokio::test]
    async fn test_insert_coin_rejects_empty_symbol() {
        let db = memory_db().await;
        let err = db.insert_coin(&NewCoin::new("   ")).await.unwrap_err();
        assert!(matches!(err, BotError::InvalidRecord(_)));
        assert!(db.recent_coins(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_coin_rejects_older_migration_for_same_symbol() {
        let db = memory_db().await;
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        db.insert_coin(&NewCoin::new("BONK").migrated_at(t0)).await.unwrap();

        let err = db
            .insert_coin(&NewCoin::new("BONK").migrated_at(t0 - Duration::hours(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::InvalidRecord(_)));

        // Other symbols are unaffected
        db.insert_coin(&NewCoin::new("MEW").migrated_at(t0 - Duration::hours(1)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_defaulted_date_clamped_to_latest() {
        let db = memory_db().await;
        let future = Utc::now() + Duration::days(1);
        db.insert_coin(&NewCoin::new("BONK").migrated_at(future)).await.unwrap();

        let next = db.insert_coin(&NewCoin::new("BONK")).await.unwrap();
        assert!(next.migration_date >= future);
    }

    #[tokio::test]
    async fn test_recent_coins_newest_first() {
        let db = memory_db().await;
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        for (i, symbol) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
            db.insert_coin(&NewCoin::new(*symbol).migrated_at(base + Duration::minutes(i as i64)))
                .await
                .unwrap();
        }

        let recent = db.recent_coins(5).await.unwrap();
        let symbols: Vec<&str> = recent.iter().map(|c| c.coin_symbol.as_str()).collect();
        assert_eq!(symbols, vec!["F", "E", "D", "C", "B"]);
    }

    #[tokio::test]
    async fn test_newest_insert_is_first_in_recent() {
        let db = memory_db().await;
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        db.insert_coin(&NewCoin::new("OLD").migrated_at(base)).await.unwrap();
        let newest = db.insert_coin(&NewCoin::new("NEW")).await.unwrap();

        let recent = db.recent_coins(5).await.unwrap();
        assert_eq!(recent[0], newest);
    }

    #[tokio::test]
    async fn test_insert_post_for_existing_coin() {
        let db = memory_db().await;
        let coin = db.insert_coin(&NewCoin::new("PEPE")).await.unwrap();

        let stored = db.insert_post(&post(coin.id, "to the moon", Some(0.6))).await.unwrap();
        assert!(stored.id > 0);
        assert_eq!(stored.coin_id, coin.id);
        assert_eq!(stored.content, "to the moon");
        assert_eq!(stored.sentiment, Some(0.6));

        let posts = db.posts_for_coin(coin.id).await.unwrap();
        assert_eq!(posts, vec![stored]);
    }

    #[tokio::test]
    async fn test_insert_post_unknown_coin_is_reference_error() {
        let db = memory_db().await;
        let err = db.insert_post(&post(999, "ghost", Some(0.1))).await.unwrap_err();
        assert!(matches!(err, BotError::Reference(999)));
        assert_eq!(db.count_posts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_refresh_sentiment_averages_posts() {
        let db = memory_db().await;
        let coin = db.insert_coin(&NewCoin::new("PEPE")).await.unwrap();
        db.insert_post(&post(coin.id, "a", Some(0.5))).await.unwrap();
        db.insert_post(&post(coin.id, "b", Some(-0.1))).await.unwrap();
        db.insert_post(&post(coin.id, "c", None)).await.unwrap();

        let score = db.refresh_sentiment(coin.id).await.unwrap().unwrap();
        assert!((score - 0.2).abs() < 1e-9);

        let stored = db.get_coin(coin.id).await.unwrap().unwrap();
        assert_eq!(stored.sentiment_score, Some(score));
    }

    #[tokio::test]
    async fn test_refresh_sentiment_without_posts_keeps_score() {
        let db = memory_db().await;
        let coin = db.insert_coin(&NewCoin::new("PEPE").with_sentiment(0.3)).await.unwrap();
        assert_eq!(db.refresh_sentiment(coin.id).await.unwrap(), Some(0.3));
    }

    #[tokio::test]
    async fn test_refresh_sentiment_unknown_coin() {
        let db = memory_db().await;
        let err = db.refresh_sentiment(42).await.unwrap_err();
        assert!(matches!(err, BotError::Reference(42)));
    }

    fn draft(content: &str, sentiment: f64) -> PostDraft {
        PostDraft {
            content: content.to_string(),
            sentiment: Some(sentiment),
            created_at: Utc::now(),
        }
    }

    async fn reject_posts_containing(db: &Database, word: &str) {
        sqlx::query(&format!(
            "CREATE TRIGGER reject_{word} BEFORE INSERT ON tweets \
             WHEN NEW.content LIKE '%{word}%' \
             BEGIN SELECT RAISE(ABORT, 'post rejected'); END"
        ))
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_record_migration_writes_coin_posts_and_aggregate() {
        let db = memory_db().await;
        let (coin, posts) = db
            .record_migration(
                &NewCoin::new("PEPE").with_market_cap(69_000.0),
                &[draft("great gem", 0.7), draft("meh", 0.1)],
            )
            .await
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.coin_id == coin.id));
        assert!((coin.sentiment_score.unwrap() - 0.4).abs() < 1e-9);

        let stored = db.get_coin(coin.id).await.unwrap().unwrap();
        assert_eq!(stored, coin);
        assert_eq!(db.posts_for_coin(coin.id).await.unwrap(), posts);
    }

    #[tokio::test]
    async fn test_record_migration_without_posts_keeps_score_unset() {
        let db = memory_db().await;
        let (coin, posts) = db.record_migration(&NewCoin::new("QUIET"), &[]).await.unwrap();
        assert!(posts.is_empty());
        assert!(coin.sentiment_score.is_none());
    }

    #[tokio::test]
    async fn test_record_migration_rolls_back_when_a_post_fails() {
        let db = memory_db().await;
        reject_posts_containing(&db, "rug").await;

        let result = db
            .record_migration(
                &NewCoin::new("PEPE"),
                &[draft("great gem", 0.8), draft("scam rug", -0.9)],
            )
            .await;

        assert!(matches!(result, Err(BotError::Database(_))));
        assert!(db.recent_coins(5).await.unwrap().is_empty());
        assert_eq!(db.count_posts().await.unwrap(), 0);

        // The store stays usable after the rollback
        let (coin, _) = db
            .record_migration(&NewCoin::new("PEPE"), &[draft("great gem", 0.8)])
            .await
            .unwrap();
        assert_eq!(coin.sentiment_score, Some(0.8));
    }

    #[tokio::test]
    async fn test_record_migration_rejects_older_date_without_writing() {
        let db = memory_db().await;
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        db.insert_coin(&NewCoin::new("BONK").migrated_at(t0)).await.unwrap();

        let err = db
            .record_migration(
                &NewCoin::new("BONK").migrated_at(t0 - Duration::hours(1)),
                &[draft("late", 0.2)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::InvalidRecord(_)));
        assert_eq!(db.recent_coins(5).await.unwrap().len(), 1);
        assert_eq!(db.count_posts().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_coin_rejected_with_posts() {
        let db = memory_db().await;
        let coin = db.insert_coin(&NewCoin::new("PEPE")).await.unwrap();
        db.insert_post(&post(coin.id, "gm", Some(0.0))).await.unwrap();

        let err = db.delete_coin(coin.id).await.unwrap_err();
        assert!(matches!(err, BotError::CoinInUse { posts: 1, .. }));
        assert!(db.get_coin(coin.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_coin_without_posts() {
        let db = memory_db().await;
        let coin = db.insert_coin(&NewCoin::new("PEPE")).await.unwrap();

        assert!(db.delete_coin(coin.id).await.unwrap());
        assert!(!db.delete_coin(coin.id).await.unwrap());
        assert!(db.get_coin(coin.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced_at_sql_level() {
        let db = memory_db().await;
        let result = sqlx::query(
            "INSERT INTO tweets (coin_id, content, sentiment, created_at) VALUES (7, 'x', 0.0, '2024-01-01T00:00:00+00:00')",
        )
        .execute(db.pool())
        .await;
        assert!(result.is_err());
    }
}
