//! In-memory comment repository - used when no database is configured.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tasktrack_core::domain::{CommentQuery, NewComment, TaskComment, TaskId};
use tasktrack_core::error::RepoError;
use tasktrack_core::ports::CommentRepository;

/// Comment storage backed by a vector. Data is lost on restart.
pub struct InMemoryCommentRepository {
    rows: RwLock<Vec<TaskComment>>,
    next_id: AtomicI64,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    async fn modify(
        &self,
        id: i64,
        apply: impl FnOnce(&mut TaskComment) + Send,
    ) -> Result<TaskId, RepoError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepoError::NotFound)?;
        apply(row);
        Ok(row.task_id)
    }
}

impl Default for InMemoryCommentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn add(&self, comment: NewComment) -> Result<i64, RepoError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.write().await.push(TaskComment {
            id,
            task_id: comment.task_id,
            author_id: comment.author_id,
            message: comment.message,
            created_at: comment.created_at,
            modified_at: None,
            deleted_at: None,
        });
        Ok(id)
    }

    async fn update(
        &self,
        id: i64,
        message: &str,
        modified_at: DateTime<Utc>,
    ) -> Result<TaskId, RepoError> {
        self.modify(id, |row| {
            row.message = message.to_owned();
            row.modified_at = Some(modified_at);
        })
        .await
    }

    async fn set_deleted(&self, id: i64, deleted_at: DateTime<Utc>) -> Result<TaskId, RepoError> {
        self.modify(id, |row| row.deleted_at = Some(deleted_at)).await
    }

    async fn query(&self, query: CommentQuery) -> Result<Vec<TaskComment>, RepoError> {
        let mut result: Vec<TaskComment> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| c.task_id == query.task_id)
            .filter(|c| query.include_deleted || !c.is_deleted())
            .cloned()
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task(id: i64) -> TaskId {
        TaskId::new(id).unwrap()
    }

    #[tokio::test]
    async fn test_add_assigns_increasing_ids() {
        let repo = InMemoryCommentRepository::new();
        let a = repo.add(NewComment::new(task(1), 1, "a")).await.unwrap();
        let b = repo.add(NewComment::new(task(1), 1, "b")).await.unwrap();
        assert!(a > 0);
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_query_filters_task_and_orders_newest_first() {
        let repo = InMemoryCommentRepository::new();
        let now = Utc::now();
        for (task_id, minutes, text) in [(1, 2, "mid"), (2, 9, "other task"), (1, 5, "new"), (1, 0, "old")] {
            let mut comment = NewComment::new(task(task_id), 1, text);
            comment.created_at = now + Duration::minutes(minutes);
            repo.add(comment).await.unwrap();
        }

        let rows = repo
            .query(CommentQuery {
                task_id: task(1),
                include_deleted: false,
            })
            .await
            .unwrap();

        let texts: Vec<&str> = rows.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(texts, ["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_update_and_soft_delete() {
        let repo = InMemoryCommentRepository::new();
        let id = repo.add(NewComment::new(task(3), 1, "draft")).await.unwrap();

        let owner = repo.update(id, "final", Utc::now()).await.unwrap();
        assert_eq!(owner, task(3));

        repo.set_deleted(id, Utc::now()).await.unwrap();

        let visible = repo
            .query(CommentQuery {
                task_id: task(3),
                include_deleted: false,
            })
            .await
            .unwrap();
        assert!(visible.is_empty());

        let all = repo
            .query(CommentQuery {
                task_id: task(3),
                include_deleted: true,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].message, "final");
        assert!(all[0].modified_at.is_some());
        assert!(all[0].is_deleted());
    }

    #[tokio::test]
    async fn test_missing_comment() {
        let repo = InMemoryCommentRepository::new();
        assert!(matches!(
            repo.set_deleted(12, Utc::now()).await,
            Err(RepoError::NotFound)
        ));
    }
}
