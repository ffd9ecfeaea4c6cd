//! Application configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use tasktrack_core::services::{CommentCacheConfig, RateLimitConfig, StoreFailurePolicy};
use tasktrack_infra::DatabaseConfig;

#[cfg(feature = "redis")]
use tasktrack_infra::RedisConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "redis")]
    pub redis: Option<RedisConfig>,
    pub rate_limit: RateLimitConfig,
    pub rate_limit_key_prefix: String,
    /// Request header carrying the caller identity used for throttling.
    pub client_ip_header: String,
    pub comment_cache: CommentCacheConfig,
    pub comment_cache_key_prefix: String,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            #[cfg(feature = "redis")]
            redis: None,
            rate_limit: RateLimitConfig::default(),
            rate_limit_key_prefix: "rate-limit".to_string(),
            client_ip_header: "x-r256-user-ip".to_string(),
            comment_cache: CommentCacheConfig::default(),
            comment_cache_key_prefix: "comment_tasks".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let failure_policy = match env::var("RATE_LIMIT_FAILURE_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Ignoring RATE_LIMIT_FAILURE_POLICY");
                StoreFailurePolicy::default()
            }),
            Err(_) => StoreFailurePolicy::default(),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            database: DatabaseConfig::from_env(),
            #[cfg(feature = "redis")]
            redis: env::var("REDIS_URL").ok().map(|_| RedisConfig::from_env()),
            rate_limit: RateLimitConfig {
                max_requests: parse_var("RATE_LIMIT_MAX_REQUESTS")
                    .unwrap_or(defaults.rate_limit.max_requests),
                window: parse_var("RATE_LIMIT_WINDOW_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.rate_limit.window),
                failure_policy,
            },
            rate_limit_key_prefix: env::var("RATE_LIMIT_KEY_PREFIX")
                .unwrap_or(defaults.rate_limit_key_prefix),
            client_ip_header: env::var("CLIENT_IP_HEADER")
                .map(|h| h.to_ascii_lowercase())
                .unwrap_or(defaults.client_ip_header),
            comment_cache: CommentCacheConfig {
                ttl: parse_var("COMMENT_CACHE_TTL_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.comment_cache.ttl),
                invalidate_on_write: env::var("COMMENT_CACHE_INVALIDATE_ON_WRITE")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(defaults.comment_cache.invalidate_on_write),
            },
            comment_cache_key_prefix: env::var("COMMENT_CACHE_KEY_PREFIX")
                .unwrap_or(defaults.comment_cache_key_prefix),
            request_timeout: parse_var("REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}
