use crate::TtlSecs;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Which kind of cache service the adapter talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory, // in-process store, for local runs without a cache service
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(format!("unknown cache backend '{other}'")),
        }
    }
}

/// Host and port of the cache service. Fixed for the life of the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEndpoint {
    pub host: String,
    pub port: u16,
}

impl CacheEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

impl fmt::Display for CacheEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Debug)]
pub struct CacheSettings {
    pub enabled: bool,
    pub backend: CacheBackend,
    pub endpoint: CacheEndpoint,
    pub ttl: TtlSecs,
    pub connect_timeout: Duration,
    pub op_timeout: Duration,
}

impl CacheSettings {
    pub const DEFAULT_HOST: &str = "localhost";
    pub const DEFAULT_PORT: u16 = 6379;
    pub const DEFAULT_TTL: TtlSecs = TtlSecs(60);
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);
    pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_millis(500);

    /// Settings with caching switched off; no cache I/O will ever happen.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::enabled(CacheEndpoint::new(Self::DEFAULT_HOST, Self::DEFAULT_PORT))
        }
    }

    pub fn enabled(endpoint: CacheEndpoint) -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::Redis,
            endpoint,
            ttl: Self::DEFAULT_TTL,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            op_timeout: Self::DEFAULT_OP_TIMEOUT,
        }
    }
}

pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub source_delay: Duration,
    pub cache: CacheSettings,
}

impl Config {
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 5000;
    const DEFAULT_SOURCE_DELAY_MS: u64 = 2000;

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("CACHE_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let endpoint = CacheEndpoint::new(
            lookup("CACHE_HOST").unwrap_or_else(|| CacheSettings::DEFAULT_HOST.to_string()),
            parse_or(&lookup, "CACHE_PORT", CacheSettings::DEFAULT_PORT),
        );

        let cache = CacheSettings {
            enabled,
            backend: parse_or(&lookup, "CACHE_BACKEND", CacheBackend::Redis),
            endpoint,
            ttl: TtlSecs(parse_nonzero(
                &lookup,
                "CACHE_TTL_SECS",
                CacheSettings::DEFAULT_TTL.0,
            )),
            connect_timeout: Duration::from_millis(parse_nonzero(
                &lookup,
                "CACHE_CONNECT_TIMEOUT_MS",
                CacheSettings::DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            )),
            op_timeout: Duration::from_millis(parse_nonzero(
                &lookup,
                "CACHE_OP_TIMEOUT_MS",
                CacheSettings::DEFAULT_OP_TIMEOUT.as_millis() as u64,
            )),
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "PORT", Self::DEFAULT_PORT),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            source_delay: Duration::from_millis(parse_or(
                &lookup,
                "SOURCE_DELAY_MS",
                Self::DEFAULT_SOURCE_DELAY_MS,
            )),
            cache,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using the default", name, raw);
            default
        }),
        None => default,
    }
}

/// Like `parse_or`, but zero also falls back. A zero TTL is rejected by
/// SETEX and a zero timeout expires before any cache call can finish.
fn parse_nonzero<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, name, default) {
        0 => {
            warn!("{} must be greater than zero, using the default {}", name, default);
            default
        }
        value => value,
    }
}
