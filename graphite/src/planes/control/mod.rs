pub mod adapter;

pub use adapter::{CacheClientAdapter, CacheHandle};
