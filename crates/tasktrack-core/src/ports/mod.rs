//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod cache;
mod comment_cache;
mod counter;
mod rate_limit;
mod repository;

pub use cache::{Cache, StoreError};
pub use comment_cache::CommentCache;
pub use counter::CounterStore;
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::CommentRepository;
