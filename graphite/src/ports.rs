#![deny(clippy::all)]

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::config::{CacheEndpoint, CacheSettings};
use shared::{Result, TtlSecs};
use std::sync::Arc;

// Ports are the pluggable extension points for the cache service and the
// authoritative data source

/// Port for building a connector from configuration
/// This allows different cache services to be plugged in
pub trait ConnectorFactory: Send + Sync + 'static {
    fn create_from_config(&self, settings: &CacheSettings) -> Arc<dyn CacheConnector>;
}

/// Port for opening the link to a cache service.
///
/// Implementations make exactly one attempt per call and must not reconnect
/// behind the caller's back.
#[async_trait]
pub trait CacheConnector: Send + Sync + 'static {
    async fn connect(&self, endpoint: &CacheEndpoint) -> Result<Arc<dyn CacheConnection>>;
}

/// Port for commands on an open cache link (e.g., Redis)
///
/// Errors should be `Error::CacheConnection` when the link itself is gone and
/// `Error::CacheCommand` otherwise.
#[async_trait]
pub trait CacheConnection: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;
    async fn set_ex(&self, key: &str, value: Bytes, ttl: TtlSecs) -> Result<()>;
}

/// Port for the authoritative producer of a resource.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    type Value: Serialize + DeserializeOwned + Send + Sync + 'static;

    async fn fetch(&self, key: &str) -> Result<Self::Value>;
}
