//! Task comment entity for SeaORM.

use sea_orm::entity::prelude::*;

use tasktrack_core::domain::{TaskComment, TaskId};
use tasktrack_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "task_comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub task_id: i64,
    pub author_user_id: i64,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub created_at: DateTimeWithTimeZone,
    pub modified_at: Option<DateTimeWithTimeZone>,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to the domain record.
impl TryFrom<Model> for TaskComment {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let task_id = TaskId::new(model.task_id).map_err(|e| RepoError::Query(e.to_string()))?;
        Ok(Self {
            id: model.id,
            task_id,
            author_id: model.author_user_id,
            message: model.message,
            created_at: model.created_at.into(),
            modified_at: model.modified_at.map(Into::into),
            deleted_at: model.deleted_at.map(Into::into),
        })
    }
}
