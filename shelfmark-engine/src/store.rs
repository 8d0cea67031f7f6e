//! Rating store adapter
//!
//! Typed, failure-safe access to the persistent key-value store. All
//! operations are asynchronous and single-attempt: the caller decides what
//! a failed operation means. Every operation first verifies the pool
//! handle is still open and fails with [`Error::StoreUnavailable`]
//! otherwise, without attempting a partial write.

use shelfmark_common::{Error, Rating, Result};
use sqlx::SqlitePool;
use tracing::warn;

/// Key of an author rating record
pub fn author_key(normalized: &str) -> String {
    format!("author:{normalized}")
}

/// Key of an item → author association record
pub fn author_link_key(asin: &str) -> String {
    format!("asin_author:{asin}")
}

/// Typed adapter over the flat `store` table
#[derive(Clone)]
pub struct RatingStore {
    pool: SqlitePool,
}

impl RatingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Guard executed before every operation: a closed pool means the
    /// backing store handle is gone and no I/O may be attempted.
    fn ensure_open(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(Error::StoreUnavailable);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        sqlx::query(
            "INSERT INTO store (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.ensure_open()?;
        sqlx::query("DELETE FROM store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn parse_rating(key: &str, value: Option<String>) -> Option<Rating> {
        let value = value?;
        let rating = Rating::parse_lossy(&value);
        if rating.is_none() {
            warn!(key, value = %value, "Ignoring unknown rating value in store");
        }
        rating
    }

    /// Current rating of an item; a missing key is unset
    pub async fn item_rating(&self, asin: &str) -> Result<Option<Rating>> {
        let value = self.get(asin).await?;
        Ok(Self::parse_rating(asin, value))
    }

    pub async fn set_item_rating(&self, asin: &str, rating: Rating) -> Result<()> {
        self.set(asin, rating.as_str()).await
    }

    pub async fn clear_item_rating(&self, asin: &str) -> Result<()> {
        self.remove(asin).await
    }

    /// Current rating of an author, by normalized name
    pub async fn author_rating(&self, normalized: &str) -> Result<Option<Rating>> {
        let key = author_key(normalized);
        let value = self.get(&key).await?;
        Ok(Self::parse_rating(&key, value))
    }

    pub async fn set_author_rating(&self, normalized: &str, rating: Rating) -> Result<()> {
        self.set(&author_key(normalized), rating.as_str()).await
    }

    pub async fn clear_author_rating(&self, normalized: &str) -> Result<()> {
        self.remove(&author_key(normalized)).await
    }

    /// Persisted author association of an item, if any
    pub async fn cached_author(&self, asin: &str) -> Result<Option<String>> {
        self.get(&author_link_key(asin)).await
    }

    /// Persist an item → author association for reload survival
    pub async fn set_cached_author(&self, asin: &str, name: &str) -> Result<()> {
        self.set(&author_link_key(asin), name).await
    }

    /// Load an item's rating and persisted author association in one pass
    pub async fn initial_state(&self, asin: &str) -> Result<(Option<Rating>, Option<String>)> {
        self.ensure_open()?;
        let link_key = author_link_key(asin);
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM store WHERE key IN (?, ?)")
                .bind(asin)
                .bind(&link_key)
                .fetch_all(&self.pool)
                .await?;

        let mut rating = None;
        let mut author = None;
        for (key, value) in rows {
            if key == asin {
                rating = Self::parse_rating(asin, Some(value));
            } else {
                author = Some(value);
            }
        }
        Ok((rating, author))
    }

    /// Free-text configuration value, if set; missing keys mean default
    pub async fn setting(&self, key: &str) -> Result<Option<String>> {
        self.get(key).await
    }
}
