use graphite::catalog::ProductCatalog;
use graphite::domain::Product;
use graphite::planes::control::CacheClientAdapter;
use graphite::planes::data::ReadThroughHandler;
use graphite::ports::{ConnectorFactory, DataSource};
use shared::config::Config;
use std::sync::Arc;
use storage_engine::UnifiedConnectorFactory;

/// Anything that can produce the product list.
pub type ProductSource = dyn DataSource<Value = Vec<Product>>;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheClientAdapter>,
    pub products: Arc<ReadThroughHandler<ProductSource>>,
}

impl AppState {
    /// Wire handlers around an adapter the caller has already initialized.
    pub fn new(cache: Arc<CacheClientAdapter>, source: Arc<ProductSource>) -> Self {
        let ttl = cache.settings().ttl;
        let products = Arc::new(ReadThroughHandler::new(cache.clone(), source, ttl));

        Self { cache, products }
    }

    /// Build the cache adapter from configuration, make its one connection
    /// attempt, and front the demo catalog with it. A cache that cannot be
    /// reached is logged and skipped; startup continues either way.
    pub async fn from_config(config: &Config) -> Self {
        let connector = UnifiedConnectorFactory.create_from_config(&config.cache);
        let cache = Arc::new(CacheClientAdapter::new(config.cache.clone(), connector));
        cache.initialize().await;

        tracing::info!("Cache adapter state after startup: {:?}", cache.state());

        Self::new(cache, Arc::new(ProductCatalog::demo(config.source_delay)))
    }
}
