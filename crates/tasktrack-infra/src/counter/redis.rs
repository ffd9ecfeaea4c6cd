//! Redis counter store using an atomic create-if-absent + increment script.

use std::time::Duration;

use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;

use tasktrack_core::ports::{CounterStore, StoreError};

use crate::cache::RedisConfig;

/// Redis counter store configuration.
#[derive(Debug, Clone)]
pub struct RedisCounterConfig {
    /// Redis connection config
    pub redis: RedisConfig,
    /// Key prefix for counter keys
    pub key_prefix: String,
}

impl Default for RedisCounterConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            key_prefix: "rate-limit".to_string(),
        }
    }
}

impl RedisCounterConfig {
    pub fn from_env() -> Self {
        Self {
            redis: RedisConfig::from_env(),
            key_prefix: std::env::var("RATE_LIMIT_KEY_PREFIX")
                .unwrap_or_else(|_| "rate-limit".to_string()),
        }
    }
}

/// Redis-backed counter store.
///
/// The script seeds the key with 0 and a millisecond TTL only when it is
/// absent (`SET NX PX`), then `INCR`s it. Redis runs scripts atomically, so
/// concurrent first requests never observe duplicate or skipped values.
pub struct RedisCounterStore {
    conn: ConnectionManager,
    config: RedisCounterConfig,
    script: Script,
}

impl RedisCounterStore {
    pub async fn new(config: RedisCounterConfig) -> Result<Self, StoreError> {
        let conn = config.redis.connect().await?;

        let script = Script::new(
            r#"
            redis.call('SET', KEYS[1], 0, 'PX', ARGV[1], 'NX')
            return redis.call('INCR', KEYS[1])
            "#,
        );

        tracing::info!(url = %config.redis.url, "Connected to Redis counter store");

        Ok(Self {
            conn,
            config,
            script,
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, StoreError> {
        Self::new(RedisCounterConfig::from_env()).await
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let redis_key = self.make_key(key);
        let mut conn = self.conn.clone();
        let window_ms = window.as_millis().max(1) as u64;

        let mut invocation = self.script.key(&redis_key);
        invocation.arg(window_ms);

        let count: i64 = self
            .config
            .redis
            .run(invocation.invoke_async(&mut conn))
            .await?;

        tracing::trace!(key = %redis_key, count, "Counter incremented");

        u64::try_from(count)
            .map_err(|_| StoreError::Operation(format!("counter went negative: {count}")))
    }
}
