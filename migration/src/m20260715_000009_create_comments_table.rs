use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comment::Comments)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comment::UserId).integer().not_null())
                    .col(ColumnDef::new(Comment::SnippetId).uuid().not_null())
                    .col(ColumnDef::new(Comment::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Comment::Content).text().not_null())
                    .col(ColumnDef::new(Comment::IpAddress).string())
                    .col(ColumnDef::new(Comment::IsDisplayed).boolean().not_null().default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_user")
                            .from(Comment::Comments, Comment::UserId)
                            .to(User::Users, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_snippet")
                            .from(Comment::Comments, Comment::SnippetId)
                            .to(Snippet::Snippets, Snippet::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Comments).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Comment {
    Comments,
    Id,
    UserId,
    SnippetId,
    CreatedAt,
    Content,
    IpAddress,
    IsDisplayed,
}

#[derive(DeriveIden)]
enum User {
    Users,
    Id,
}

#[derive(DeriveIden)]
enum Snippet {
    Snippets,
    Id,
}
