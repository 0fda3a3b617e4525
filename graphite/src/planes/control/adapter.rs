use crate::domain::ConnectionState;
use crate::ports::{CacheConnection, CacheConnector};
use bytes::Bytes;
use shared::config::CacheSettings;
use shared::{Error, TtlSecs};
use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns the one connection this process makes to the cache service.
///
/// Nothing here returns a cache error to the caller. Failures are logged at
/// warn level and turn into "unavailable", "miss" or a silent no-op. The
/// connection is single-shot: once it fails the adapter stays `Failed` until
/// the process restarts.
pub struct CacheClientAdapter {
    settings: CacheSettings,
    connector: Arc<dyn CacheConnector>,
    state: AtomicU8,
    connection: OnceLock<Arc<dyn CacheConnection>>,
}

/// A usable connection, handed out only while the adapter is `Ready`.
#[derive(Clone)]
pub struct CacheHandle {
    connection: Arc<dyn CacheConnection>,
}

impl CacheClientAdapter {
    pub fn new(settings: CacheSettings, connector: Arc<dyn CacheConnector>) -> Self {
        Self {
            settings,
            connector,
            state: AtomicU8::new(ConnectionState::Unconfigured as u8),
            connection: OnceLock::new(),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::Acquire))
    }

    /// Make the single connection attempt, or do nothing if caching is off.
    ///
    /// Never fails: an unreachable cache leaves the adapter `Failed` and the
    /// caller's startup carries on.
    pub async fn initialize(&self) {
        if !self.settings.enabled {
            if self.transition(ConnectionState::Unconfigured, ConnectionState::Disabled) {
                info!("Cache disabled by configuration, serving from source only");
            }
            return;
        }

        if !self.transition(ConnectionState::Unconfigured, ConnectionState::Connecting) {
            warn!(
                "Cache adapter already initialized (state: {:?}), ignoring",
                self.state()
            );
            return;
        }

        let endpoint = &self.settings.endpoint;
        info!("Connecting to cache at {}", endpoint);

        let attempt = tokio::time::timeout(
            self.settings.connect_timeout,
            self.connector.connect(endpoint),
        )
        .await;

        match attempt {
            Ok(Ok(connection)) => {
                if self.connection.set(connection).is_err() {
                    // Unreachable through `initialize`, which runs once.
                    self.mark_failed("connection was already set");
                    return;
                }
                if self.transition(ConnectionState::Connecting, ConnectionState::Ready) {
                    info!("Cache connection to {} is ready", endpoint);
                }
            }
            Ok(Err(e)) => {
                self.mark_failed(&e);
            }
            Err(_) => {
                self.mark_failed(&Error::CacheTimeout(self.settings.connect_timeout));
            }
        }
    }

    /// A handle to the live connection, or `None` when the cache is disabled,
    /// never connected, or has failed. `None` means skip caching for this
    /// operation.
    pub fn current_connection(&self) -> Option<CacheHandle> {
        if !self.settings.enabled || !self.state().is_ready() {
            return None;
        }

        self.connection.get().map(|connection| CacheHandle {
            connection: Arc::clone(connection),
        })
    }

    /// Look `key` up. Any failure reads as a miss.
    pub async fn read(&self, handle: &CacheHandle, key: &str) -> Option<Bytes> {
        match self.bounded(handle.connection.get(key)).await {
            Ok(Some(value)) => {
                debug!(key = %key, bytes = value.len(), "cache get hit");
                Some(value)
            }
            Ok(None) => {
                debug!(key = %key, "cache get miss");
                None
            }
            Err(e) => {
                self.on_failure("get", key, &e);
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl`. Failures are logged and dropped;
    /// the caller has no way to observe them.
    pub async fn write(&self, handle: &CacheHandle, key: &str, value: Bytes, ttl: TtlSecs) {
        let size = value.len();
        match self.bounded(handle.connection.set_ex(key, value, ttl)).await {
            Ok(()) => {
                debug!(key = %key, bytes = size, ttl_secs = ttl.0, "cache set");
            }
            Err(e) => {
                self.on_failure("set", key, &e);
            }
        }
    }

    async fn bounded<T>(&self, op: impl Future<Output = shared::Result<T>>) -> shared::Result<T> {
        let limit: Duration = self.settings.op_timeout;
        match tokio::time::timeout(limit, op).await {
            Ok(result) => result,
            Err(_) => Err(Error::CacheTimeout(limit)),
        }
    }

    fn on_failure(&self, op: &str, key: &str, error: &Error) {
        warn!(key = %key, error = %error, "Cache {} failed, continuing without cache", op);

        if error.is_connection_level() {
            self.mark_failed(error);
        }
    }

    /// `Connecting` or `Ready` to `Failed`. Terminal states are left alone.
    fn mark_failed<R: std::fmt::Display + ?Sized>(&self, reason: &R) {
        let result = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                match ConnectionState::from(current) {
                    ConnectionState::Connecting | ConnectionState::Ready => {
                        Some(ConnectionState::Failed as u8)
                    }
                    _ => None,
                }
            });

        if let Ok(previous) = result {
            warn!(
                "Cache at {} unavailable ({}), was {:?}; caching stays off until restart",
                self.settings.endpoint,
                reason,
                ConnectionState::from(previous)
            );
        }
    }

    fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Debug for CacheClientAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClientAdapter")
            .field("endpoint", &self.settings.endpoint)
            .field("enabled", &self.settings.enabled)
            .field("state", &self.state())
            .finish()
    }
}

impl Debug for CacheHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHandle").finish_non_exhaustive()
    }
}
