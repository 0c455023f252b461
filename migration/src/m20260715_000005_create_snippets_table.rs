use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Snippet::Snippets)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Snippet::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Snippet::SongId).uuid().not_null())
                    .col(ColumnDef::new(Snippet::Title).string().not_null())
                    .col(
                        ColumnDef::new(Snippet::State)
                            .string()
                            .not_null()
                            .default("processing"),
                    )
                    .col(ColumnDef::new(Snippet::ProcessingError).string())
                    .col(ColumnDef::new(Snippet::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Snippet::Image).string().not_null())
                    .col(ColumnDef::new(Snippet::UploadedAudio).string())
                    .col(ColumnDef::new(Snippet::AudioMp3).string())
                    .col(ColumnDef::new(Snippet::AnalysisData).json())
                    .col(
                        ColumnDef::new(Snippet::VisualEffect)
                            .string()
                            .not_null()
                            .default("pulsate"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_snippet_song")
                            .from(Snippet::Snippets, Snippet::SongId)
                            .to(Song::Songs, Song::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Snippet::Snippets).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Snippet {
    Snippets,
    Id,
    SongId,
    Title,
    State,
    ProcessingError,
    CreatedAt,
    Image,
    UploadedAudio,
    AudioMp3,
    AnalysisData,
    VisualEffect,
}

#[derive(DeriveIden)]
enum Song {
    Songs,
    Id,
}
