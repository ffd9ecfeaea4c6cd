use async_trait::async_trait;
use std::time::Duration;

/// Cache trait - abstraction over key/value backends (Redis, in-memory).
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a value from the cache. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value in the cache with optional TTL. Always overwrites.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Errors raised by shared stores (cache and counter backends).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl StoreError {
    /// Whether the backing store could not be reached at all, as opposed to
    /// rejecting the request or being misconfigured.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Timeout)
    }
}
