//! Counter store port - atomic increment with expiry.

use async_trait::async_trait;
use std::time::Duration;

use super::StoreError;

/// Shared counter store.
///
/// `increment` creates the counter at 0 with a TTL of `window` when it does
/// not exist (never overwriting a concurrently created one), then increments
/// it by one and returns the post-increment value. Both steps act as a single
/// unit: concurrent callers on the same key observe distinct, gap-free values.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError>;
}
