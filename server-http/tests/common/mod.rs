//! Test utilities for driving the HTTP API against a scriptable cache service.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use graphite::catalog::ProductCatalog;
use graphite::domain::Product;
use graphite::planes::control::CacheClientAdapter;
use graphite::ports::{CacheConnection, CacheConnector, DataSource};
use serde_json::Value;
use server_http::state::ProductSource;
use server_http::{build_router, AppState};
use shared::config::{CacheEndpoint, CacheSettings, Config};
use shared::{Error, Result, TtlSecs};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage_engine::MokaConnector;
use tower::ServiceExt;

/// In-memory cache service that can refuse connections or drop them later.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct ScriptedCache {
    store: MokaConnector,
    flags: Arc<Flags>,
}

#[derive(Default)]
struct Flags {
    refuse: AtomicBool,
    severed: AtomicBool,
    connects: AtomicUsize,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        let cache = Self::new();
        cache.flags.refuse.store(true, Ordering::SeqCst);
        cache
    }

    pub fn sever(&self) {
        self.flags.severed.store(true, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.flags.connects.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.flags.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.flags.sets.load(Ordering::SeqCst)
    }

    /// Write straight into the store, bypassing counters and failure flags.
    pub async fn seed(&self, key: &str, value: &[u8]) {
        let conn = self.store.connect(&test_endpoint()).await.unwrap();
        conn.set_ex(key, Bytes::copy_from_slice(value), TtlSecs(60))
            .await
            .unwrap();
    }

    /// Read straight from the store.
    pub async fn peek(&self, key: &str) -> Option<Bytes> {
        let conn = self.store.connect(&test_endpoint()).await.unwrap();
        conn.get(key).await.unwrap()
    }
}

#[async_trait]
impl CacheConnector for ScriptedCache {
    async fn connect(&self, endpoint: &CacheEndpoint) -> Result<Arc<dyn CacheConnection>> {
        self.flags.connects.fetch_add(1, Ordering::SeqCst);
        if self.flags.refuse.load(Ordering::SeqCst) {
            return Err(Error::CacheConnection(format!(
                "connection refused: {endpoint}"
            )));
        }

        let inner = self.store.connect(endpoint).await?;
        Ok(Arc::new(ScriptedConnection {
            inner,
            flags: self.flags.clone(),
        }))
    }
}

struct ScriptedConnection {
    inner: Arc<dyn CacheConnection>,
    flags: Arc<Flags>,
}

impl ScriptedConnection {
    fn check(&self) -> Result<()> {
        if self.flags.severed.load(Ordering::SeqCst) {
            return Err(Error::CacheConnection("socket closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheConnection for ScriptedConnection {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.flags.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: Bytes, ttl: TtlSecs) -> Result<()> {
        self.flags.sets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.set_ex(key, value, ttl).await
    }
}

/// A product source that is always down.
#[allow(dead_code)]
pub struct BrokenSource;

#[async_trait]
impl DataSource for BrokenSource {
    type Value = Vec<Product>;

    async fn fetch(&self, _key: &str) -> Result<Vec<Product>> {
        Err(Error::Internal("connection to products database lost".into()))
    }
}

pub fn test_endpoint() -> CacheEndpoint {
    CacheEndpoint::new("cache.test", 6379)
}

#[allow(dead_code)]
pub fn enabled_settings() -> CacheSettings {
    let mut settings = CacheSettings::enabled(test_endpoint());
    settings.connect_timeout = Duration::from_millis(200);
    settings.op_timeout = Duration::from_millis(200);
    settings
}

/// A test server wrapper with all dependencies.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub cache: ScriptedCache,
}

#[allow(dead_code)]
impl TestServer {
    /// Caching on, backed by a healthy in-memory service.
    pub async fn new() -> Self {
        Self::with(enabled_settings(), ScriptedCache::new(), demo_source()).await
    }

    pub async fn with(
        settings: CacheSettings,
        cache: ScriptedCache,
        source: Arc<ProductSource>,
    ) -> Self {
        let adapter = Arc::new(CacheClientAdapter::new(settings, Arc::new(cache.clone())));
        adapter.initialize().await;

        let state = AppState::new(adapter, source);
        let config = Config::from_lookup(|_| None);
        let router = build_router(state.clone(), &config);

        Self {
            router,
            state,
            cache,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}

pub fn demo_source() -> Arc<ProductSource> {
    Arc::new(ProductCatalog::demo(Duration::ZERO))
}
