//! JSON key-value store on top of a Redis-like backend.

use crate::backend::{KvBackend, RedisBackend};
use crate::config::{ConfigOverrides, Environment, ProcessEnv, StoreConfig};
use crate::encode;
use crate::error::{BackendError, StoreError};
use crate::metrics::{Metrics, Timer};
use crate::value::StoredValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Field of a reconstruction descriptor asking for a rebuild from the environment.
pub const RECREATE_FROM_ENV: &str = "recreate_from_env";

/// Pattern handed to the backend to list every key.
const MATCH_ALL: &str = "*";

/// A store that keeps JSON values in Redis.
///
/// Values are written as JSON text. Reads parse JSON and hand back entries
/// that are not JSON unchanged, so values written by other systems stay
/// readable. The store adds no locking, retries or timeouts of its own.
pub struct RedisStore {
    backend: Arc<dyn KvBackend>,
    config: StoreConfig,
}

impl RedisStore {
    /// Create a store with its own Redis client built from `config`.
    ///
    /// No connection is made here; the first operation opens it.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let backend = RedisBackend::new(&config)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Create a store on a backend handle supplied by the caller.
    ///
    /// `config` is only recorded; it plays no part in building `backend`.
    pub fn with_backend(config: StoreConfig, backend: Arc<dyn KvBackend>) -> Self {
        debug!(backend = backend.name(), "Store bound to backend");
        Self { backend, config }
    }

    /// Create a store from the `REDIS_*` process environment, with `overrides` applied last.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, StoreError> {
        Self::from_env_with(&ProcessEnv, overrides)
    }

    /// Same as [`RedisStore::from_env`], reading variables from `env`.
    pub fn from_env_with(
        env: &dyn Environment,
        overrides: ConfigOverrides,
    ) -> Result<Self, StoreError> {
        let mut config = StoreConfig::from_env_with(env)?;
        config.apply(overrides);
        info!(host = %config.host, port = config.port, db = config.db, "Building store from environment");
        Self::new(config)
    }

    /// Rebuild a store from a descriptor made by [`RedisStore::to_reconstruction_info`]
    /// or from a flat mapping of config fields.
    pub fn recreate(info: &Map<String, Value>) -> Result<Self, StoreError> {
        Self::recreate_with(info, &ProcessEnv)
    }

    /// Same as [`RedisStore::recreate`], reading variables from `env` when asked to.
    ///
    /// Only the JSON boolean `true` under `recreate_from_env` selects the
    /// environment. Any other value, `1` or `"true"` included, is read as an
    /// explicit field and ends up in the config's `extra` options.
    pub fn recreate_with(
        info: &Map<String, Value>,
        env: &dyn Environment,
    ) -> Result<Self, StoreError> {
        if info.get(RECREATE_FROM_ENV).and_then(Value::as_bool) == Some(true) {
            debug!("Recreating store from environment");
            return Self::from_env_with(env, ConfigOverrides::default());
        }

        let config = StoreConfig::from_map(info)?;
        Self::new(config)
    }

    /// Descriptor to rebuild an equivalent store later.
    ///
    /// Always asks for a rebuild from the environment so credentials never end
    /// up in persisted or logged state.
    pub fn to_reconstruction_info(&self) -> Map<String, Value> {
        let mut info = Map::new();
        info.insert(RECREATE_FROM_ENV.to_string(), Value::Bool(true));
        info
    }

    /// Configuration the store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    /// Read the value under `key`. `None` if the key does not exist.
    pub async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let timer = Timer::new();
        let raw = self.observe("get", self.backend.get(key)).await?;
        Metrics::get().record_operation("get", self.backend.name(), timer.elapsed_seconds());

        let value = raw.map(|raw| StoredValue::decode(raw, self.config.decode_responses));
        if let Some(value) = &value {
            if value.is_raw() {
                debug!(key, "Value is not JSON, returning it unchanged");
            }
        }
        Ok(value)
    }

    /// Read the value under `key` into `T`.
    ///
    /// Legacy text entries are offered to `T` as a JSON string; raw binary
    /// entries cannot be read this way.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(value) = self.get(key).await? else {
            return Ok(None);
        };

        let Some(json) = value.into_json() else {
            warn!(key, "Binary value cannot be read as JSON");
            return Err(StoreError::Serialization(
                <serde_json::Error as serde::de::Error>::custom(format!(
                    "value under {:?} is binary, not JSON",
                    key
                )),
            ));
        };

        serde_json::from_value(json)
            .map(Some)
            .map_err(StoreError::Serialization)
    }

    /// Write `value` as JSON under `key`, replacing any previous value.
    ///
    /// Encoding happens before the backend is touched; a value that cannot be
    /// encoded (non-string map keys, NaN or infinite floats) leaves the store
    /// unchanged.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = encode::to_json_text(value).map_err(|e| {
            Metrics::get().record_error("set", self.backend.name(), "serialization");
            StoreError::Serialization(e)
        })?;

        let timer = Timer::new();
        self.observe("set", self.backend.set(key, &encoded)).await?;
        Metrics::get().record_operation("set", self.backend.name(), timer.elapsed_seconds());

        debug!(key, bytes = encoded.len(), "Stored value");
        Ok(())
    }

    /// Whether the backend holds an entry for `key`.
    pub async fn has(&self, key: &str) -> Result<bool, StoreError> {
        let timer = Timer::new();
        let count = self.observe("has", self.backend.exists(key)).await?;
        Metrics::get().record_operation("has", self.backend.name(), timer.elapsed_seconds());
        Ok(count > 0)
    }

    /// Every key currently visible, with its decoded value.
    ///
    /// Costs one scan plus one read per key and is not a snapshot: keys written
    /// during the scan may be missed, and keys removed before their read are
    /// left out.
    pub async fn items(&self) -> Result<HashMap<String, StoredValue>, StoreError> {
        let timer = Timer::new();
        let keys = self.observe("items", self.backend.scan_keys(MATCH_ALL)).await?;
        Metrics::get().record_scan(self.backend.name(), keys.len() as u64);

        let mut items = HashMap::with_capacity(keys.len());
        for key in keys {
            match self.get(&key).await? {
                Some(value) => {
                    items.insert(key, value);
                }
                None => debug!(key = %key, "Key disappeared during scan"),
            }
        }

        Metrics::get().record_operation("items", self.backend.name(), timer.elapsed_seconds());
        Ok(items)
    }

    async fn observe<T>(
        &self,
        operation: &str,
        call: impl std::future::Future<Output = Result<T, BackendError>>,
    ) -> Result<T, StoreError> {
        call.await.map_err(|e| {
            Metrics::get().record_error(operation, self.backend.name(), "backend");
            warn!(operation, backend = self.backend.name(), error = %e, "Backend call failed");
            StoreError::Backend(e)
        })
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}
