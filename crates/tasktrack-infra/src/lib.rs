//! # Tasktrack Infrastructure
//!
//! Concrete implementations of the ports defined in `tasktrack-core`.
//! This crate contains the counter store, cache, and durable storage
//! integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL comment storage via SeaORM
//! - `redis` - Redis support for the counter store and cache

pub mod cache;
pub mod counter;
pub mod database;

// Re-exports - In-Memory
pub use cache::{InMemoryCache, KeyValueCommentCache};
pub use counter::InMemoryCounterStore;
pub use database::{DatabaseConfig, InMemoryCommentRepository};

#[cfg(feature = "postgres")]
pub use database::{DatabaseConnections, PostgresCommentRepository};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
#[cfg(feature = "redis")]
pub use counter::{RedisCounterConfig, RedisCounterStore};

#[cfg(test)]
mod tests;
