//! Counter-backed rate limiter.
//!
//! Each client key owns a counter whose TTL starts at its first request, so
//! windows slide per key rather than aligning to wall-clock minutes.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{ClientKey, Decision};
use crate::ports::{CounterStore, RateLimitError, RateLimitResult, RateLimiter, StoreError};

use super::cancellable;

/// What to do when the counter store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFailurePolicy {
    /// Surface the store error to the caller.
    #[default]
    Propagate,
    /// Treat the request as rejected.
    FailClosed,
    /// Treat the request as allowed.
    FailOpen,
}

impl FromStr for StoreFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "fail-closed" | "fail_closed" | "closed" => Ok(Self::FailClosed),
            "fail-open" | "fail_open" | "open" => Ok(Self::FailOpen),
            other => Err(format!("unknown store failure policy: {other}")),
        }
    }
}

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window. A count equal to this is still admitted.
    pub max_requests: u64,
    /// Window duration, measured from a key's first request.
    pub window: Duration,
    pub failure_policy: StoreFailurePolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            failure_policy: StoreFailurePolicy::Propagate,
        }
    }
}

/// Rate limiter that charges every call against a shared counter store.
pub struct CounterRateLimiter {
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
}

impl CounterRateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn decide(&self, count: u64) -> RateLimitResult {
        let decision = if count <= self.config.max_requests {
            Decision::Allowed
        } else {
            Decision::Rejected
        };

        RateLimitResult {
            decision,
            count: Some(count),
            limit: self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(count),
            window: self.config.window,
        }
    }

    fn on_store_failure(
        &self,
        key: &ClientKey,
        err: StoreError,
    ) -> Result<RateLimitResult, RateLimitError> {
        let decision = match self.config.failure_policy {
            StoreFailurePolicy::Propagate => {
                tracing::error!(client = %key, error = %err, "Counter store failed");
                return Err(RateLimitError::StoreUnavailable(err));
            }
            StoreFailurePolicy::FailClosed => Decision::Rejected,
            StoreFailurePolicy::FailOpen => Decision::Allowed,
        };

        tracing::warn!(
            client = %key,
            error = %err,
            policy = ?self.config.failure_policy,
            "Counter store failed, applying failure policy"
        );

        Ok(RateLimitResult {
            decision,
            count: None,
            limit: self.config.max_requests,
            remaining: 0,
            window: self.config.window,
        })
    }
}

#[async_trait]
impl RateLimiter for CounterRateLimiter {
    async fn admit(
        &self,
        key: &str,
        token: &CancellationToken,
    ) -> Result<RateLimitResult, RateLimitError> {
        let key = ClientKey::new(key).map_err(|e| RateLimitError::InvalidKey(e.to_string()))?;

        let outcome = cancellable(token, self.store.increment(key.as_str(), self.config.window))
            .await
            .ok_or(RateLimitError::Cancelled)?;

        match outcome {
            Ok(count) => {
                let result = self.decide(count);
                tracing::debug!(client = %key, count, allowed = result.is_allowed(), "Admission checked");
                Ok(result)
            }
            Err(err) => self.on_store_failure(&key, err),
        }
    }
}
