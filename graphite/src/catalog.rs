use crate::domain::Product;
use crate::ports::DataSource;
use async_trait::async_trait;
use shared::{Error, Result};
use std::time::Duration;
use tracing::debug;

/// Cache key for the full product list.
pub const PRODUCTS_ALL_KEY: &str = "products:all";

/// Stand-in for a slow product database: a fixed delay, then a static list.
#[derive(Clone, Debug)]
pub struct ProductCatalog {
    delay: Duration,
    products: Vec<Product>,
}

impl ProductCatalog {
    pub fn new(delay: Duration, products: Vec<Product>) -> Self {
        Self { delay, products }
    }

    pub fn demo(delay: Duration) -> Self {
        Self::new(
            delay,
            vec![Product::new(1, "Laptop"), Product::new(2, "Phone")],
        )
    }
}

#[async_trait]
impl DataSource for ProductCatalog {
    type Value = Vec<Product>;

    async fn fetch(&self, key: &str) -> Result<Vec<Product>> {
        if key != PRODUCTS_ALL_KEY {
            return Err(Error::SourceFetch(format!("unknown resource '{key}'")));
        }

        debug!(key = %key, delay_ms = self.delay.as_millis() as u64, "querying product catalog");
        tokio::time::sleep(self.delay).await;

        Ok(self.products.clone())
    }
}
