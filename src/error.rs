//! Error types for the Redis-backed store.

use thiserror::Error;

/// Top-level application error type used by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors returned by [`RedisStore`](crate::RedisStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The value could not be encoded to (or decoded from) JSON.
    /// Raised before any backend call on writes.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid integer {value:?} for {var}: {source}")]
    InvalidInteger {
        var: String,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid connection url: {0}")]
    Url(#[from] url::ParseError),

    #[error("cannot build redis client: {0}")]
    Client(#[source] redis::RedisError),

    #[error("file error: {0}")]
    FileError(#[from] std::io::Error),
}

/// Errors raised by a [`KvBackend`](crate::backend::KvBackend).
///
/// Client errors are passed through untouched so their diagnostics survive.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("backend operation failed: {0}")]
    OperationFailed(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_wraps_layers() {
        let err = AppError::from(ConfigError::Validation("host must not be empty".to_string()));
        assert_eq!(
            err.to_string(),
            "configuration error: validation failed: host must not be empty"
        );

        let err = AppError::from(StoreError::from(BackendError::OperationFailed(
            "boom".to_string(),
        )));
        assert_eq!(err.to_string(), "store error: backend operation failed: boom");
    }

    #[test]
    fn test_file_errors_surface_as_config_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = AppError::from(ConfigError::from(io));
        assert!(matches!(err, AppError::Config(ConfigError::FileError(_))));
    }
}
