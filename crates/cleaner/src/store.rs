//! Ticket store access.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("unexpected PING reply: {0}")]
    UnexpectedPong(String),
}

/// The subset of store operations the cleaner needs.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Members of the ticket index set.
    async fn ticket_keys(&self, set_key: &str) -> Result<Vec<String>, StoreError>;

    /// Raw record stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove `keys` from the index set, then delete the records.
    async fn remove(&self, set_key: &str, keys: &[String]) -> Result<(), StoreError>;
}

/// Redis-backed ticket store over a multiplexed connection.
pub struct RedisTicketStore {
    conn: MultiplexedConnection,
}

impl RedisTicketStore {
    /// Connect to `addr`, given either as `host:port` or as a full
    /// `redis://` URL.
    pub async fn connect(addr: &str) -> Result<Self, StoreError> {
        let url = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("redis://{}", addr)
        };
        debug!("Connecting to {}", url);

        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl TicketStore for RedisTicketStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        if reply != "PONG" {
            return Err(StoreError::UnexpectedPong(reply));
        }
        Ok(())
    }

    async fn ticket_keys(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.smembers(set_key).await?;
        Ok(keys)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn remove(&self, set_key: &str, keys: &[String]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.srem(set_key, keys).await?;
        let _: () = conn.del(keys).await?;
        Ok(())
    }
}
