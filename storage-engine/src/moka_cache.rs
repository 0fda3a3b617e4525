use async_trait::async_trait;
use bytes::Bytes;
use graphite::ports::{CacheConnection, CacheConnector};
use moka::Expiry;
use moka::future::Cache;
use shared::config::CacheEndpoint;
use shared::{Error, Result, TtlSecs};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone)]
struct StoredEntry {
    value: Bytes,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, StoredEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Moka-based in-process cache service
/// Every connection opened from one connector shares the same store, the way
/// clients of one Redis instance do
#[derive(Clone)]
pub struct MokaConnector {
    cache: Cache<String, StoredEntry>,
}

impl MokaConnector {
    /// Create a new in-process store. Entries leave only when their TTL runs out.
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .name("graphite-memory")
                .expire_after(PerEntryTtl)
                .build(),
        }
    }
}

impl Default for MokaConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheConnector for MokaConnector {
    async fn connect(&self, endpoint: &CacheEndpoint) -> Result<Arc<dyn CacheConnection>> {
        debug!("In-memory cache standing in for {}", endpoint);
        Ok(Arc::new(MokaConnection {
            cache: self.cache.clone(),
        }))
    }
}

pub struct MokaConnection {
    cache: Cache<String, StoredEntry>,
}

#[async_trait]
impl CacheConnection for MokaConnection {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set_ex(&self, key: &str, value: Bytes, ttl: TtlSecs) -> Result<()> {
        // Same rule as SETEX
        if ttl.0 == 0 {
            return Err(Error::CacheCommand(
                "invalid expire time in 'setex' command".into(),
            ));
        }

        let entry = StoredEntry {
            value,
            ttl: ttl.as_duration(),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }
}

impl Debug for MokaConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaConnector")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}
