//! Comment cache port.

use async_trait::async_trait;
use std::time::Duration;

use super::StoreError;
use crate::domain::{CommentSummary, TaskId};

/// Cached per-task comment views.
///
/// An empty vector is a valid cached value (known absence) and is distinct
/// from `None` (nothing cached or expired).
#[async_trait]
pub trait CommentCache: Send + Sync {
    async fn get(&self, task_id: TaskId) -> Result<Option<Vec<CommentSummary>>, StoreError>;

    /// Overwrite the cached view for a task.
    async fn set(
        &self,
        task_id: TaskId,
        comments: &[CommentSummary],
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Drop the cached view for a task.
    async fn invalidate(&self, task_id: TaskId) -> Result<(), StoreError>;
}
