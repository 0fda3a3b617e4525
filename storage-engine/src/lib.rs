pub mod moka_cache;
pub mod redis_store;

pub use moka_cache::MokaConnector;
pub use redis_store::RedisConnector;

use graphite::ports::{CacheConnector, ConnectorFactory};
use shared::config::{CacheBackend, CacheSettings};
use std::sync::Arc;
use tracing::info;

/// Picks the cache service connector named by `CACHE_BACKEND`
#[derive(Clone, Copy, Debug, Default)]
pub struct UnifiedConnectorFactory;

impl ConnectorFactory for UnifiedConnectorFactory {
    fn create_from_config(&self, settings: &CacheSettings) -> Arc<dyn CacheConnector> {
        match settings.backend {
            CacheBackend::Redis => Arc::new(RedisConnector::new()),
            CacheBackend::Memory => {
                info!("Using in-process memory store as the cache service");
                Arc::new(MokaConnector::new())
            }
        }
    }
}
