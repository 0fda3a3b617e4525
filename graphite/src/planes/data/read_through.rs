use crate::domain::FetchResult;
use crate::planes::control::CacheClientAdapter;
use crate::ports::DataSource;
use bytes::Bytes;
use shared::{Error, Result, TtlSecs};
use std::sync::Arc;
use tracing::{debug, warn};

/// Serves a resource through the cache when it can and from the source when
/// it must. The cache is an optimisation only: the single error `fetch` can
/// return is `Error::SourceFetch`.
///
/// Concurrent misses on one key are not coalesced. Each goes to the source and
/// each writes the cache; the last write wins.
pub struct ReadThroughHandler<S: ?Sized> {
    adapter: Arc<CacheClientAdapter>,
    source: Arc<S>,
    ttl: TtlSecs,
}

impl<S> ReadThroughHandler<S>
where
    S: DataSource + ?Sized,
{
    pub fn new(adapter: Arc<CacheClientAdapter>, source: Arc<S>, ttl: TtlSecs) -> Self {
        Self {
            adapter,
            source,
            ttl,
        }
    }

    pub fn adapter(&self) -> &Arc<CacheClientAdapter> {
        &self.adapter
    }

    pub async fn fetch(&self, key: &str) -> Result<FetchResult<S::Value>> {
        if let Some(value) = self.cached(key).await {
            debug!(key = %key, "served from cache");
            return Ok(FetchResult::from_cache(value));
        }

        let value = self
            .source
            .fetch(key)
            .await
            .map_err(Error::into_source_fetch)?;

        self.populate(key, &value).await;

        debug!(key = %key, "served from source");
        Ok(FetchResult::from_source(value))
    }

    async fn cached(&self, key: &str) -> Option<S::Value> {
        let handle = self.adapter.current_connection()?;
        let payload = self.adapter.read(&handle, key).await?;

        if payload.is_empty() {
            return None;
        }

        match serde_json::from_slice(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                let error = Error::CacheDeserialization(e.to_string());
                warn!(key = %key, error = %error, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    async fn populate(&self, key: &str, value: &S::Value) {
        // The read may have taken the connection down; ask again.
        let Some(handle) = self.adapter.current_connection() else {
            return;
        };

        match serde_json::to_vec(value) {
            Ok(payload) => {
                self.adapter
                    .write(&handle, key, Bytes::from(payload), self.ttl)
                    .await;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Could not serialize value for cache");
            }
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for ReadThroughHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughHandler")
            .field("adapter", &self.adapter)
            .field("ttl", &self.ttl)
            .finish()
    }
}
