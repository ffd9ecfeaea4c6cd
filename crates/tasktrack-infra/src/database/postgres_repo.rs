//! PostgreSQL comment repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, IntoActiveModel, NotSet,
    QueryFilter, QueryOrder, Set,
};

use tasktrack_core::domain::{CommentQuery, NewComment, TaskComment, TaskId};
use tasktrack_core::error::RepoError;
use tasktrack_core::ports::CommentRepository;

use super::entity::task_comment::{self, Entity as TaskCommentEntity};

/// PostgreSQL comment repository.
pub struct PostgresCommentRepository {
    pub(crate) db: DbConn,
}

impl PostgresCommentRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    async fn find(&self, id: i64) -> Result<task_comment::Model, RepoError> {
        TaskCommentEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_error)?
            .ok_or(RepoError::NotFound)
    }
}

fn query_error(e: DbErr) -> RepoError {
    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(e.to_string()),
        DbErr::RecordNotFound(_) => RepoError::NotFound,
        other => RepoError::Query(other.to_string()),
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn add(&self, comment: NewComment) -> Result<i64, RepoError> {
        let model = task_comment::ActiveModel {
            id: NotSet,
            task_id: Set(comment.task_id.get()),
            author_user_id: Set(comment.author_id),
            message: Set(comment.message),
            created_at: Set(comment.created_at.into()),
            modified_at: Set(None),
            deleted_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(query_error)?;

        Ok(model.id)
    }

    async fn update(
        &self,
        id: i64,
        message: &str,
        modified_at: DateTime<Utc>,
    ) -> Result<TaskId, RepoError> {
        let existing = self.find(id).await?;
        let task_id = existing.task_id;

        let mut active = existing.into_active_model();
        active.message = Set(message.to_owned());
        active.modified_at = Set(Some(modified_at.into()));
        active.update(&self.db).await.map_err(query_error)?;

        TaskId::new(task_id).map_err(|e| RepoError::Query(e.to_string()))
    }

    async fn set_deleted(&self, id: i64, deleted_at: DateTime<Utc>) -> Result<TaskId, RepoError> {
        let existing = self.find(id).await?;
        let task_id = existing.task_id;

        let mut active = existing.into_active_model();
        active.deleted_at = Set(Some(deleted_at.into()));
        active.update(&self.db).await.map_err(query_error)?;

        TaskId::new(task_id).map_err(|e| RepoError::Query(e.to_string()))
    }

    async fn query(&self, query: CommentQuery) -> Result<Vec<TaskComment>, RepoError> {
        tracing::debug!(
            task_id = %query.task_id,
            include_deleted = query.include_deleted,
            "Querying task comments"
        );

        let mut select =
            TaskCommentEntity::find().filter(task_comment::Column::TaskId.eq(query.task_id.get()));
        if !query.include_deleted {
            select = select.filter(task_comment::Column::DeletedAt.is_null());
        }

        select
            .order_by_desc(task_comment::Column::CreatedAt)
            .order_by_desc(task_comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_error)?
            .into_iter()
            .map(TaskComment::try_from)
            .collect()
    }
}
