//! Cache implementations - Redis and in-memory fallback, plus the typed
//! comment cache layered over either.

mod comments;
mod memory;

pub use comments::KeyValueCommentCache;
pub use memory::InMemoryCache;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisCache, RedisConfig};
