pub mod backend;
pub mod cli;
pub mod config;
pub mod encode;
pub mod error;
pub mod metrics;
pub mod store;
pub mod telemetry;
pub mod value;

pub use backend::{KvBackend, MemoryBackend, RedisBackend};
pub use config::{CertRequirement, ConfigOverrides, Environment, ProcessEnv, StoreConfig};
pub use error::{BackendError, ConfigError, StoreError};
pub use store::{RedisStore, RECREATE_FROM_ENV};
pub use value::StoredValue;
