use crate::{Error, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;

/// A previously fetched response body
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: String,
    pub headers: Vec<(String, String)>,
    /// Unix timestamp of when the entry was written
    pub created_at: i64,
}

/// SQLite-backed response cache keyed by (url, request-body hash).
///
/// Stale entries are treated as misses and recomputed by the caller; there
/// is no eviction policy beyond the optional purge.
#[derive(Clone)]
pub struct ResponseCache {
    pool: SqlitePool,
}

impl ResponseCache {
    /// Open (and create if needed) the cache database at the given path
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;
        Self::migrate(&pool).await?;

        Ok(Self { pool })
    }

    /// In-memory cache, for tests and cache-less operation.
    ///
    /// A pooled `:memory:` database is per-connection, so the pool is
    /// pinned to a single connection.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS response_cache (
                url        TEXT NOT NULL,
                body_hash  TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                headers    TEXT NOT NULL,
                body       TEXT NOT NULL,
                PRIMARY KEY (url, body_hash)
            )
            ",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Look up a response no older than `ttl_hours`
    pub async fn get(
        &self,
        url: &str,
        request_body: Option<&str>,
        ttl_hours: f64,
    ) -> Result<Option<CachedResponse>> {
        if ttl_hours <= 0.0 {
            return Ok(None);
        }

        let row: Option<(i64, String, String)> = sqlx::query_as(
            "SELECT created_at, headers, body FROM response_cache WHERE url = ? AND body_hash = ?",
        )
        .bind(url)
        .bind(body_hash(request_body))
        .fetch_optional(&self.pool)
        .await?;

        let Some((created_at, headers, body)) = row else {
            return Ok(None);
        };

        let age_secs = Utc::now().timestamp() - created_at;
        if age_secs as f64 > ttl_hours * 3600.0 {
            return Ok(None);
        }

        let headers = serde_json::from_str(&headers)
            .map_err(|e| Error::Cache(format!("corrupt cached headers: {e}")))?;

        Ok(Some(CachedResponse {
            body,
            headers,
            created_at,
        }))
    }

    /// Store a response, replacing any previous entry for the same key
    pub async fn set(
        &self,
        url: &str,
        request_body: Option<&str>,
        headers: &[(String, String)],
        body: &str,
    ) -> Result<()> {
        let headers = serde_json::to_string(headers)
            .map_err(|e| Error::Cache(format!("unencodable headers: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO response_cache (url, body_hash, created_at, headers, body)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (url, body_hash) DO UPDATE SET
                created_at = excluded.created_at,
                headers = excluded.headers,
                body = excluded.body
            ",
        )
        .bind(url)
        .bind(body_hash(request_body))
        .bind(Utc::now().timestamp())
        .bind(headers)
        .bind(body)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete entries older than `ttl_hours`
    pub async fn purge_older_than(&self, ttl_hours: f64) -> Result<u64> {
        let cutoff = Utc::now().timestamp() - (ttl_hours * 3600.0) as i64;
        let result = sqlx::query("DELETE FROM response_cache WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Number of cached entries
    pub async fn len(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM response_cache")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

/// FNV-1a digest of the request body. The hash only partitions cache rows
/// for the same URL by POST payload; it is not security-relevant.
fn body_hash(body: Option<&str>) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in body.unwrap_or("").as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{hash:016x}")
}
