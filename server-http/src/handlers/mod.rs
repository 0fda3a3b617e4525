pub mod cache;

pub use cache::health::health_check;
pub use cache::products::list_products;
