use chrono::{DateTime, Utc};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing::info;

use crate::error::AppResult;
use crate::models::PasteRecord;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS pastebin (
    id VARCHAR(30) NOT NULL,
    hash CHAR(40) DEFAULT NULL,
    data TEXT,
    delkey CHAR(40) DEFAULT NULL,
    expiry DATETIME,
    language TEXT,
    PRIMARY KEY (id)
)";

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    /// Connect to a database by URL and create the paste table if needed.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let mut options = AnyPoolOptions::new();
        // every connection to an in-memory sqlite database sees its own empty database
        if url.contains(":memory:") {
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options.connect(url).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        info!("connected to database");

        Ok(Self { pool })
    }

    /// Whether a paste with this id exists, expired or not.
    pub async fn paste_exists(&self, id: &str) -> AppResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT id FROM pastebin WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut conn)
            .await?;
        Ok(row.is_some())
    }

    /// Get a paste by id.
    pub async fn get_paste(&self, id: &str) -> AppResult<Option<PasteRecord>> {
        let mut conn = self.pool.acquire().await?;
        let paste = sqlx::query_as::<_, PasteRecord>(
            "SELECT id, hash, data, delkey, expiry, language FROM pastebin WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut conn)
        .await?;
        Ok(paste)
    }

    /// Get any paste carrying this fingerprint.
    pub async fn find_by_hash(&self, hash: &str) -> AppResult<Option<PasteRecord>> {
        let mut conn = self.pool.acquire().await?;
        let paste = sqlx::query_as::<_, PasteRecord>(
            "SELECT id, hash, data, delkey, expiry, language FROM pastebin WHERE hash = ? LIMIT 1",
        )
        .bind(hash)
        .fetch_optional(&mut conn)
        .await?;
        Ok(paste)
    }

    /// Insert a paste. A taken id surfaces as [`crate::AppError::IdConflict`].
    pub async fn insert_paste(&self, paste: &PasteRecord) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            "INSERT INTO pastebin (id, hash, data, delkey, expiry, language) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&paste.id)
        .bind(&paste.hash)
        .bind(&paste.data)
        .bind(&paste.delkey)
        .bind(paste.expiry)
        .bind(&paste.language)
        .execute(&mut conn)
        .await?;
        Ok(())
    }

    /// Delete a paste by id. Returns whether a row was removed.
    pub async fn delete_paste(&self, id: &str) -> AppResult<bool> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("DELETE FROM pastebin WHERE id = ?")
            .bind(id)
            .execute(&mut conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Close all pooled connections. Later queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Delete every paste whose expiry is at or before `now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("DELETE FROM pastebin WHERE expiry <= ?")
            .bind(now)
            .execute(&mut conn)
            .await?;
        Ok(result.rows_affected())
    }
}
