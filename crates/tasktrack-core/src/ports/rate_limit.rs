//! Rate limiting port.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::StoreError;
use crate::domain::Decision;

/// Rate limiter trait - admits or rejects a call for a client key.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Charge one request to `key` and decide whether it may proceed.
    ///
    /// Every call consumes one unit, rejected calls included.
    async fn admit(
        &self,
        key: &str,
        token: &CancellationToken,
    ) -> Result<RateLimitResult, RateLimitError>;
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub decision: Decision,
    /// Counter value observed by this call; `None` when the store failed and
    /// the decision came from the failure policy.
    pub count: Option<u64>,
    pub limit: u64,
    pub remaining: u64,
    pub window: Duration,
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Invalid client key: {0}")]
    InvalidKey(String),

    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Rate limit check cancelled")]
    Cancelled,
}
