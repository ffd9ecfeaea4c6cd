use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const TASK_CREATED_INDEX: &str = "idx_task_comments_task_id_created_at";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TaskComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskComments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TaskComments::TaskId).big_integer().not_null())
                    .col(
                        ColumnDef::new(TaskComments::AuthorUserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TaskComments::Message).text().not_null())
                    .col(
                        ColumnDef::new(TaskComments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TaskComments::ModifiedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TaskComments::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves the most-recent-first listing per task
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(TASK_CREATED_INDEX)
                    .table(TaskComments::Table)
                    .col(TaskComments::TaskId)
                    .col((TaskComments::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TaskComments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TaskComments {
    Table,
    Id,
    TaskId,
    AuthorUserId,
    Message,
    CreatedAt,
    ModifiedAt,
    DeletedAt,
}
