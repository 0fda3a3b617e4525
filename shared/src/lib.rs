// shared/src/lib.rs

use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Transport-level failure: refused, reset, dropped or unreachable.
    #[error("cache connection error: {0}")]
    CacheConnection(String),
    /// The cache answered, but rejected or garbled the command.
    #[error("cache command error: {0}")]
    CacheCommand(String),
    #[error("cache operation timed out after {0:?}")]
    CacheTimeout(Duration),
    #[error("cached payload could not be decoded: {0}")]
    CacheDeserialization(String),
    #[error("source fetch failed: {0}")]
    SourceFetch(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    /// True when the link to the cache service itself is gone, as opposed to a
    /// single command going wrong.
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Error::CacheConnection(_))
    }

    /// Collapse any error into the source-fetch kind, keeping the message.
    pub fn into_source_fetch(self) -> Self {
        match self {
            Error::SourceFetch(msg) => Error::SourceFetch(msg),
            other => Error::SourceFetch(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Time-to-live in whole seconds, the unit the cache service expires keys in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtlSecs(pub u64);

impl TtlSecs {
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

pub mod config;
