use serde::{Deserialize, Serialize};

/// Lifecycle of the single link to the cache service.
///
/// `Disabled` and `Failed` are terminal for the process. There is no way back
/// from `Failed` to `Ready`; a new connection needs a restart.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Unconfigured = 0,
    Disabled = 1,
    Connecting = 2,
    Ready = 3,
    Failed = 4,
}

impl ConnectionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }
}

impl From<u8> for ConnectionState {
    fn from(value: u8) -> Self {
        match value {
            1 => ConnectionState::Disabled,
            2 => ConnectionState::Connecting,
            3 => ConnectionState::Ready,
            4 => ConnectionState::Failed,
            _ => ConnectionState::Unconfigured,
        }
    }
}

/// Which layer produced a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cache,
    Source,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FetchResult<V> {
    pub value: V,
    pub provenance: Provenance,
}

impl<V> FetchResult<V> {
    pub fn from_cache(value: V) -> Self {
        Self {
            value,
            provenance: Provenance::Cache,
        }
    }

    pub fn from_source(value: V) -> Self {
        Self {
            value,
            provenance: Provenance::Source,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
}

impl Product {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
