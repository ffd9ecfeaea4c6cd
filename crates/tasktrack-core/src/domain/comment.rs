use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TaskId;

/// Comment record as kept in durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskComment {
    pub id: i64,
    pub task_id: TaskId,
    pub author_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TaskComment {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A comment to be inserted. The id is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub task_id: TaskId,
    pub author_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn new(task_id: TaskId, author_id: i64, message: impl Into<String>) -> Self {
        Self {
            task_id,
            author_id,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Filter for reading comments of a task.
#[derive(Debug, Clone, Copy)]
pub struct CommentQuery {
    pub task_id: TaskId,
    pub include_deleted: bool,
}

/// Read-side view of a comment; this is what the comment cache stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    pub task_id: TaskId,
    pub text: String,
    pub is_deleted: bool,
    pub observed_at: DateTime<Utc>,
}

impl From<TaskComment> for CommentSummary {
    fn from(record: TaskComment) -> Self {
        Self {
            task_id: record.task_id,
            is_deleted: record.is_deleted(),
            text: record.message,
            observed_at: record.created_at,
        }
    }
}
