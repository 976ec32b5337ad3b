//! PostgreSQL cache backend over the `price_cache` table

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;

use super::Cache;
use crate::error::{AppError, AppResult};

const MAX_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Cache rows shared by every server instance using the same database
#[derive(Clone)]
pub struct PgCache {
    db: PgPool,
}

impl PgCache {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Delete expired rows, returning how many were removed
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM price_cache WHERE expires_at <= NOW()")
            .execute(&self.db)
            .await
            .map_err(|e| AppError::CacheError(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Cache for PgCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value
            FROM price_cache
            WHERE key = $1 AND expires_at > NOW()
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::CacheError(e.to_string()))?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let ttl = ttl_seconds.min(MAX_TTL_SECONDS) as i64;
        let expires_at = Utc::now() + Duration::seconds(ttl);

        sqlx::query(
            r#"
            INSERT INTO price_cache (key, value, expires_at, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (key)
            DO UPDATE SET value = EXCLUDED.value,
                          expires_at = EXCLUDED.expires_at,
                          updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::CacheError(e.to_string()))?;

        Ok(())
    }
}
