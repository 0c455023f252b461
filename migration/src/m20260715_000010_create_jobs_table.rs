use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Job::Jobs)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Job::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Job::SnippetId).uuid().not_null())
                    .col(ColumnDef::new(Job::Kind).string().not_null())
                    .col(ColumnDef::new(Job::Status).string().not_null().default("pending"))
                    .col(ColumnDef::new(Job::Error).string())
                    .col(ColumnDef::new(Job::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Job::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_snippet")
                            .from(Job::Jobs, Job::SnippetId)
                            .to(Snippet::Snippets, Snippet::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Job::Jobs).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Job {
    Jobs,
    Id,
    SnippetId,
    Kind,
    Status,
    Error,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Snippet {
    Snippets,
    Id,
}
