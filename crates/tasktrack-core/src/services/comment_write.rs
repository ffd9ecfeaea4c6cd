//! Comment write path.
//!
//! Writes go straight to durable storage. Cached views only catch up when
//! their TTL expires, unless `invalidate_on_write` is enabled.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::domain::{NewComment, TaskId};
use crate::error::{DomainError, RepoError};
use crate::ports::{CommentCache, CommentRepository};

use super::{CommentCacheConfig, cancellable};

pub struct CommentWriteService {
    repo: Arc<dyn CommentRepository>,
    cache: Arc<dyn CommentCache>,
    invalidate_on_write: bool,
}

impl CommentWriteService {
    pub fn new(
        repo: Arc<dyn CommentRepository>,
        cache: Arc<dyn CommentCache>,
        config: &CommentCacheConfig,
    ) -> Self {
        Self {
            repo,
            cache,
            invalidate_on_write: config.invalidate_on_write,
        }
    }

    pub async fn add(
        &self,
        task_id: TaskId,
        author_id: i64,
        message: &str,
        token: &CancellationToken,
    ) -> Result<i64, DomainError> {
        let message = validate_message(message)?;
        let comment = NewComment::new(task_id, author_id, message);

        let id = cancellable(token, self.repo.add(comment))
            .await
            .ok_or(DomainError::Cancelled)??;

        tracing::info!(task_id = %task_id, comment_id = id, "Comment added");
        self.after_write(task_id, token).await;
        Ok(id)
    }

    pub async fn update(
        &self,
        comment_id: i64,
        message: &str,
        token: &CancellationToken,
    ) -> Result<(), DomainError> {
        let message = validate_message(message)?;

        let task_id = cancellable(token, self.repo.update(comment_id, message, Utc::now()))
            .await
            .ok_or(DomainError::Cancelled)?
            .map_err(|e| not_found_as_domain(e, comment_id))?;

        tracing::info!(task_id = %task_id, comment_id, "Comment updated");
        self.after_write(task_id, token).await;
        Ok(())
    }

    /// Soft-delete a comment.
    pub async fn delete(&self, comment_id: i64, token: &CancellationToken) -> Result<(), DomainError> {
        let task_id = cancellable(token, self.repo.set_deleted(comment_id, Utc::now()))
            .await
            .ok_or(DomainError::Cancelled)?
            .map_err(|e| not_found_as_domain(e, comment_id))?;

        tracing::info!(task_id = %task_id, comment_id, "Comment deleted");
        self.after_write(task_id, token).await;
        Ok(())
    }

    /// Best-effort cache invalidation; failures only cost staleness.
    async fn after_write(&self, task_id: TaskId, token: &CancellationToken) {
        if !self.invalidate_on_write {
            return;
        }
        match cancellable(token, self.cache.invalidate(task_id)).await {
            Some(Ok(())) => tracing::debug!(task_id = %task_id, "Comment cache invalidated"),
            Some(Err(e)) => {
                tracing::warn!(task_id = %task_id, error = %e, "Comment cache invalidation failed")
            }
            None => tracing::warn!(task_id = %task_id, "Comment cache invalidation cancelled"),
        }
    }
}

fn validate_message(message: &str) -> Result<&str, DomainError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidArgument(
            "comment message must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn not_found_as_domain(err: RepoError, comment_id: i64) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::NotFound {
            entity_type: "comment",
            id: comment_id,
        },
        other => DomainError::Repository(other),
    }
}
