//! Key/value cache used by the pricing pipeline
//!
//! Values are stored as JSON strings with a time-to-live. The in-memory
//! backend is the default; the PostgreSQL backend shares cached prices
//! between server instances.

mod memory;
mod postgres;

pub use memory::MemoryCache;
pub use postgres::PgCache;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a live entry; expired entries read as missing
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Store `value` under `key` for `ttl_seconds`
    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;
}

/// Typed helpers over any [`Cache`]
#[async_trait]
pub trait CacheExt: Cache {
    async fn get_json<T>(&self, key: &str) -> AppResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| AppError::CacheError(format!("Corrupt entry {}: {}", key, e))),
            None => Ok(None),
        }
    }

    async fn set_json<T>(&self, key: &str, value: &T, ttl_seconds: u64) -> AppResult<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::CacheError(format!("Failed to encode {}: {}", key, e)))?;
        self.set(key, raw, ttl_seconds).await
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}
