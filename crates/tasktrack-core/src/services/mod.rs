//! Application services built on top of the ports.

mod comment_read;
mod comment_write;
mod rate_limiter;

#[cfg(test)]
pub(crate) mod fakes;

pub use comment_read::{CommentCacheConfig, CommentReadService};
pub use comment_write::CommentWriteService;
pub use rate_limiter::{CounterRateLimiter, RateLimitConfig, StoreFailurePolicy};

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Run `fut` until it completes or `token` is cancelled, whichever is first.
///
/// Returns `None` on cancellation; the dropped future never resumes.
pub(crate) async fn cancellable<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}
