//! In-process cache backend

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Cache;
use crate::error::AppResult;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// HashMap-backed cache; entries expire lazily on read
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    /// Inserts the entry and sweeps every expired one
    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let now = Instant::now();
        let entry = Entry {
            value,
            expires_at: now + Duration::from_secs(ttl_seconds),
        };

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        let swept = before - entries.len();
        if swept > 0 {
            tracing::debug!(swept, "expired cache entries removed");
        }
        entries.insert(key.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheExt;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new();
        assert_ok!(cache.set("k", "v".to_string(), 60).await);
        assert_eq!(assert_ok!(cache.get("k").await), Some("v".to_string()));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = MemoryCache::new();
        cache.set("k", "v".to_string(), 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.entries.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let cache = MemoryCache::new();
        cache.set_json("nums", &vec![1, 2, 3], 60).await.unwrap();
        let nums: Option<Vec<i32>> = cache.get_json("nums").await.unwrap();
        assert_eq!(nums, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_corrupt_json_is_a_cache_error() {
        let cache = MemoryCache::new();
        cache.set("bad", "{not json".to_string(), 60).await.unwrap();
        let result: AppResult<Option<Vec<i32>>> = cache.get_json("bad").await;
        let err = assert_err!(result);
        assert!(matches!(err, crate::error::AppError::CacheError(_)));
    }

    #[tokio::test]
    async fn test_set_sweeps_expired_entries() {
        let cache = MemoryCache::new();
        assert_ok!(cache.set("base_price:cocoa:5.6:-0.2", "1".to_string(), 0).await);
        assert_ok!(cache.set("base_price:cocoa:6.0:-1.0", "2".to_string(), 0).await);
        assert_ok!(cache.set("base_price:coffee:global", "3".to_string(), 60).await);

        let entries = cache.entries.read().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("base_price:coffee:global"));
    }
}
