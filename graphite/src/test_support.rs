use crate::ports::{CacheConnection, CacheConnector};
use async_trait::async_trait;
use bytes::Bytes;
use shared::config::{CacheEndpoint, CacheSettings};
use shared::{Error, Result, TtlSecs};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn enabled_settings() -> CacheSettings {
    CacheSettings::enabled(CacheEndpoint::new("cache.test", 6379))
}

/// Scriptable stand-in for an external cache service. Entries never expire.
#[derive(Clone, Default)]
pub struct FakeCacheService {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<String, (Bytes, TtlSecs)>>,
    refuse: AtomicBool,
    severed: AtomicBool,
    command_errors: AtomicBool,
    latency: Mutex<Duration>,
    connects: AtomicUsize,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl FakeCacheService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse_connections(&self) {
        self.inner.refuse.store(true, Ordering::SeqCst);
    }

    pub fn accept_connections(&self) {
        self.inner.refuse.store(false, Ordering::SeqCst);
    }

    /// Drop every open connection; later commands fail at the transport level.
    pub fn sever(&self) {
        self.inner.severed.store(true, Ordering::SeqCst);
    }

    pub fn fail_commands(&self) {
        self.inner.command_errors.store(true, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.inner.latency.lock().unwrap() = latency;
    }

    pub fn insert(&self, key: &str, value: &[u8]) {
        self.inner.entries.lock().unwrap().insert(
            key.to_string(),
            (Bytes::copy_from_slice(value), TtlSecs(60)),
        );
    }

    pub fn value_of(&self, key: &str) -> Option<Bytes> {
        self.inner
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone())
    }

    pub fn ttl_of(&self, key: &str) -> Option<TtlSecs> {
        self.inner
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, ttl)| *ttl)
    }

    pub fn connect_calls(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.inner.gets.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.inner.sets.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let latency = *self.inner.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn check(&self) -> Result<()> {
        if self.inner.severed.load(Ordering::SeqCst) {
            return Err(Error::CacheConnection("connection reset by peer".into()));
        }
        if self.inner.command_errors.load(Ordering::SeqCst) {
            return Err(Error::CacheCommand("WRONGTYPE".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheConnector for FakeCacheService {
    async fn connect(&self, endpoint: &CacheEndpoint) -> Result<Arc<dyn CacheConnection>> {
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.inner.refuse.load(Ordering::SeqCst) {
            return Err(Error::CacheConnection(format!(
                "connection refused: {endpoint}"
            )));
        }
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl CacheConnection for FakeCacheService {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.inner.gets.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.check()?;
        Ok(self.value_of(key))
    }

    async fn set_ex(&self, key: &str, value: Bytes, ttl: TtlSecs) -> Result<()> {
        self.inner.sets.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.check()?;
        self.inner
            .entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, ttl));
        Ok(())
    }
}
