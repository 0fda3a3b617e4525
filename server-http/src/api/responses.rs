use chrono::{DateTime, Utc};
use graphite::domain::{ConnectionState, FetchResult, Provenance};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub cache: ConnectionState,
    pub timestamp: DateTime<Utc>,
}

/// Where a response body came from, as the HTTP API names it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Db,
}

impl From<Provenance> for ResponseSource {
    fn from(provenance: Provenance) -> Self {
        match provenance {
            Provenance::Cache => ResponseSource::Cache,
            Provenance::Source => ResponseSource::Db,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse<T> {
    pub source: ResponseSource,
    pub data: T,
}

impl<T> From<FetchResult<T>> for ProductsResponse<T> {
    fn from(result: FetchResult<T>) -> Self {
        Self {
            source: result.provenance.into(),
            data: result.value,
        }
    }
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
