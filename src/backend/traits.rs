use crate::error::BackendError;
use async_trait::async_trait;

/// Trait for the key-value backend a store talks to.
///
/// Mirrors the handful of commands the store needs from a Redis-like server.
/// Implementations own their own connection handling and concurrency.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Fetch the raw value stored under `key`. `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Number of entries for `key` (0 or 1). Must not touch expiry metadata.
    async fn exists(&self, key: &str) -> Result<u64, BackendError>;

    /// All keys matching a Redis glob `pattern`, each listed once.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, BackendError>;

    /// Short backend name used in logs and metrics.
    fn name(&self) -> &'static str;
}
