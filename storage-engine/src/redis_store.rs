use async_trait::async_trait;
use bytes::Bytes;
use graphite::ports::{CacheConnection, CacheConnector};
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use shared::config::CacheEndpoint;
use shared::{Error, Result, TtlSecs};
use std::sync::Arc;
use tracing::debug;

/// Opens a single multiplexed connection to a Redis server.
///
/// A multiplexed connection does not reconnect on its own, so once the socket
/// drops every later command fails with `Error::CacheConnection`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RedisConnector;

impl RedisConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheConnector for RedisConnector {
    async fn connect(&self, endpoint: &CacheEndpoint) -> Result<Arc<dyn CacheConnection>> {
        let client = redis::Client::open(endpoint.url()).map_err(classify)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(classify)?;

        debug!("Opened Redis connection to {}", endpoint);
        Ok(Arc::new(RedisConnection { conn }))
    }
}

pub struct RedisConnection {
    conn: MultiplexedConnection,
}

#[async_trait]
impl CacheConnection for RedisConnection {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut conn = self.conn.clone();
        let value = conn
            .get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(classify)?;
        Ok(value.map(Bytes::from))
    }

    async fn set_ex(&self, key: &str, value: Bytes, ttl: TtlSecs) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, &value[..], ttl.0)
            .await
            .map_err(classify)
    }
}

/// Sort a Redis failure into "the link is gone" or "this command failed".
pub fn classify(err: redis::RedisError) -> Error {
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        Error::CacheConnection(err.to_string())
    } else {
        Error::CacheCommand(err.to_string())
    }
}
