//! Application state - shared across all handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tasktrack_core::ports::{Cache, CommentRepository, CounterStore, RateLimiter, StoreError};
use tasktrack_core::services::{CommentReadService, CommentWriteService, CounterRateLimiter};
use tasktrack_infra::{
    DatabaseConfig, InMemoryCache, InMemoryCommentRepository, InMemoryCounterStore,
    KeyValueCommentCache,
};

#[cfg(feature = "postgres")]
use tasktrack_infra::{DatabaseConnections, PostgresCommentRepository};
#[cfg(feature = "redis")]
use tasktrack_infra::{RedisCache, RedisCounterConfig, RedisCounterStore};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub comment_reader: Arc<CommentReadService>,
    pub comment_writer: Arc<CommentWriteService>,
    /// Cancelled when the server shuts down; request tokens are children.
    pub shutdown: CancellationToken,
    pub client_ip_header: String,
    pub request_timeout: std::time::Duration,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, StoreError> {
        let (counter, cache) = Self::shared_stores(config).await?;
        let repo = Self::comment_repository(config.database.as_ref()).await;

        tracing::info!("Application state initialized");

        Ok(Self::from_parts(counter, cache, repo, config))
    }

    /// Wire services over already-built adapters.
    pub fn from_parts(
        counter: Arc<dyn CounterStore>,
        cache: Arc<dyn Cache>,
        repo: Arc<dyn CommentRepository>,
        config: &AppConfig,
    ) -> Self {
        let comment_cache = Arc::new(KeyValueCommentCache::with_prefix(
            cache,
            config.comment_cache_key_prefix.clone(),
        ));

        Self {
            rate_limiter: Arc::new(CounterRateLimiter::new(counter, config.rate_limit.clone())),
            comment_reader: Arc::new(CommentReadService::new(
                comment_cache.clone(),
                repo.clone(),
                &config.comment_cache,
            )),
            comment_writer: Arc::new(CommentWriteService::new(
                repo,
                comment_cache,
                &config.comment_cache,
            )),
            shutdown: CancellationToken::new(),
            client_ip_header: config.client_ip_header.clone(),
            request_timeout: config.request_timeout,
        }
    }

    /// Token for one request; cancelled on shutdown.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    fn in_memory_stores() -> (Arc<dyn CounterStore>, Arc<dyn Cache>) {
        (
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(InMemoryCache::new()),
        )
    }

    #[cfg(feature = "redis")]
    async fn shared_stores(
        config: &AppConfig,
    ) -> Result<(Arc<dyn CounterStore>, Arc<dyn Cache>), StoreError> {
        let Some(redis) = config.redis.as_ref() else {
            tracing::warn!("REDIS_URL not set. Rate limits and cache are per-process.");
            return Ok(Self::in_memory_stores());
        };

        let connected = async {
            let counter = RedisCounterStore::new(RedisCounterConfig {
                redis: redis.clone(),
                key_prefix: config.rate_limit_key_prefix.clone(),
            })
            .await?;
            let cache = RedisCache::new(redis.clone()).await?;
            Ok::<_, StoreError>((counter, cache))
        }
        .await;

        match connected {
            Ok((counter, cache)) => Ok((Arc::new(counter), Arc::new(cache))),
            Err(e) if redis.fallback_to_memory && e.is_unavailable() => {
                tracing::error!(
                    "Failed to connect to Redis: {}. Using in-memory fallback.",
                    e
                );
                Ok(Self::in_memory_stores())
            }
            Err(e) => Err(e),
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn shared_stores(
        _config: &AppConfig,
    ) -> Result<(Arc<dyn CounterStore>, Arc<dyn Cache>), StoreError> {
        tracing::info!("Running without redis feature - using in-memory stores");
        Ok(Self::in_memory_stores())
    }

    #[cfg(feature = "postgres")]
    async fn comment_repository(db_config: Option<&DatabaseConfig>) -> Arc<dyn CommentRepository> {
        let Some(config) = db_config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Arc::new(InMemoryCommentRepository::new());
        };

        match DatabaseConnections::init(config).await {
            Ok(connections) => Arc::new(PostgresCommentRepository::new(connections.main)),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Arc::new(InMemoryCommentRepository::new())
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn comment_repository(_db_config: Option<&DatabaseConfig>) -> Arc<dyn CommentRepository> {
        tracing::info!("Running without postgres feature - using in-memory repository");
        Arc::new(InMemoryCommentRepository::new())
    }
}

#[cfg(all(test, feature = "redis"))]
mod tests {
    use super::*;
    use std::time::Duration;

    use tasktrack_infra::RedisConfig;

    fn config_with_redis(url: &str) -> AppConfig {
        AppConfig {
            database: None,
            redis: Some(RedisConfig {
                url: url.to_string(),
                connect_timeout: Duration::from_millis(200),
                operation_timeout: Duration::from_millis(200),
                fallback_to_memory: true,
            }),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_memory() {
        let state = AppState::new(&config_with_redis("redis://127.0.0.1:1"))
            .await
            .unwrap();

        let result = state
            .rate_limiter
            .admit("10.0.0.1", &state.request_token())
            .await
            .unwrap();
        assert_eq!(result.count, Some(1));
    }

    #[tokio::test]
    async fn test_misconfigured_redis_fails_startup() {
        let err = AppState::new(&config_with_redis("not a redis url"))
            .await
            .err()
            .unwrap();
        assert!(!err.is_unavailable());
    }
}
