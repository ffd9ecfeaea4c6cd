use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CommentQuery, NewComment, TaskComment, TaskId};
use crate::error::RepoError;

/// Durable comment storage.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment and return its storage-assigned id.
    async fn add(&self, comment: NewComment) -> Result<i64, RepoError>;

    /// Replace the message of a comment and stamp `modified_at`.
    /// Returns the owning task.
    async fn update(
        &self,
        id: i64,
        message: &str,
        modified_at: DateTime<Utc>,
    ) -> Result<TaskId, RepoError>;

    /// Stamp the soft-delete marker on a comment. Returns the owning task.
    async fn set_deleted(&self, id: i64, deleted_at: DateTime<Utc>) -> Result<TaskId, RepoError>;

    /// Comments of a task, most recent first (ties broken by id, descending).
    async fn query(&self, query: CommentQuery) -> Result<Vec<TaskComment>, RepoError>;
}
