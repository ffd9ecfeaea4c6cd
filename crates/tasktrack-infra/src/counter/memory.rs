//! In-memory counter store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use tasktrack_core::ports::{CounterStore, StoreError};

/// Expired entries are swept once the map grows past this many keys.
const SWEEP_THRESHOLD: usize = 10_000;

struct Counter {
    count: u64,
    expires_at: Instant,
}

/// Per-process counter store.
///
/// Create-if-absent and increment happen under one lock, giving each key a
/// total order of returned values. Limits are not shared across instances.
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<String, Counter>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live counters.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let counters = self.counters.lock().await;
        counters.values().filter(|c| c.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let now = Instant::now();
        let mut counters = self.counters.lock().await;

        if counters.len() >= SWEEP_THRESHOLD {
            counters.retain(|_, c| c.expires_at > now);
        }

        let counter = counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: now + window,
        });
        if counter.expires_at <= now {
            counter.count = 0;
            counter.expires_at = now + window;
        }

        counter.count += 1;
        Ok(counter.count)
    }
}
