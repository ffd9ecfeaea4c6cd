//! Cache-aside read path for task comments.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::domain::{CommentQuery, CommentSummary, TaskId};
use crate::error::DomainError;
use crate::ports::{CommentCache, CommentRepository};

use super::cancellable;

/// Comment cache configuration.
#[derive(Debug, Clone)]
pub struct CommentCacheConfig {
    /// Lifetime of a populated view; also the staleness bound for writes.
    pub ttl: Duration,
    /// Drop a task's cached view after a successful write.
    pub invalidate_on_write: bool,
}

impl Default for CommentCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            invalidate_on_write: false,
        }
    }
}

/// Serves a task's comments from the cache, rebuilding the view from
/// durable storage on a miss.
///
/// Concurrent misses for one task may each hit storage and overwrite the
/// cache with equivalent data.
pub struct CommentReadService {
    cache: Arc<dyn CommentCache>,
    repo: Arc<dyn CommentRepository>,
    ttl: Duration,
}

impl CommentReadService {
    pub fn new(
        cache: Arc<dyn CommentCache>,
        repo: Arc<dyn CommentRepository>,
        config: &CommentCacheConfig,
    ) -> Self {
        Self {
            cache,
            repo,
            ttl: config.ttl,
        }
    }

    /// Comments of `task_id`, most recent first.
    ///
    /// A cached view (even an empty one) is returned verbatim. Cache failures
    /// degrade to a miss; storage failures and cancellation are errors.
    pub async fn get_comments(
        &self,
        task_id: TaskId,
        token: &CancellationToken,
    ) -> Result<Vec<CommentSummary>, DomainError> {
        let cached = cancellable(token, self.cache.get(task_id))
            .await
            .ok_or(DomainError::Cancelled)?;

        match cached {
            Ok(Some(comments)) => {
                tracing::debug!(task_id = %task_id, count = comments.len(), "Comment cache hit");
                return Ok(comments);
            }
            Ok(None) => tracing::debug!(task_id = %task_id, "Comment cache miss"),
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "Comment cache read failed, using storage")
            }
        }

        let query = CommentQuery {
            task_id,
            include_deleted: false,
        };
        let records = cancellable(token, self.repo.query(query))
            .await
            .ok_or(DomainError::Cancelled)??;

        let comments: Vec<CommentSummary> = records.into_iter().map(Into::into).collect();

        match cancellable(token, self.cache.set(task_id, &comments, self.ttl)).await {
            None => return Err(DomainError::Cancelled),
            Some(Err(e)) => {
                tracing::warn!(task_id = %task_id, error = %e, "Failed to populate comment cache")
            }
            Some(Ok(())) => {
                tracing::debug!(task_id = %task_id, count = comments.len(), "Comment cache populated")
            }
        }

        Ok(comments)
    }
}
