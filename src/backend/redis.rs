use super::KvBackend;
use crate::config::StoreConfig;
use crate::error::{BackendError, ConfigError};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::collections::HashSet;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 100;

/// Backend talking to a Redis server through the `redis` crate.
///
/// The connection is opened lazily on the first command and then shared:
/// a multiplexed connection is cheap to clone and pipelines concurrent calls.
pub struct RedisBackend {
    client: Client,
    conn: OnceCell<MultiplexedConnection>,
}

impl RedisBackend {
    /// Build a client from `config`. Performs no I/O.
    pub fn new(config: &StoreConfig) -> Result<Self, ConfigError> {
        let url = config.connection_url()?;
        let client = Client::open(url.as_str()).map_err(ConfigError::Client)?;

        info!(
            host = %config.host,
            port = config.port,
            db = config.db,
            tls = config.ssl,
            "Created redis client"
        );

        Ok(Self::from_client(client))
    }

    /// Wrap a client built by the caller.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            conn: OnceCell::new(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn connection(&self) -> Result<MultiplexedConnection, BackendError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                debug!("Opening multiplexed redis connection");
                self.client.get_multiplexed_async_connection().await
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let mut conn = self.connection().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<u64, BackendError> {
        let mut conn = self.connection().await?;
        let count: u64 = conn.exists(key).await?;
        Ok(count)
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, BackendError> {
        let mut conn = self.connection().await?;
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            // SCAN may hand back the same key more than once
            for key in batch {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(pattern, count = keys.len(), "Scanned keys");
        Ok(keys)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
