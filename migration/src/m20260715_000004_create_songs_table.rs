use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Song::Songs)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Song::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Song::ArtistId).integer().not_null())
                    .col(ColumnDef::new(Song::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Song::CompleteAudio).string())
                    .col(ColumnDef::new(Song::CompletedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_song_artist")
                            .from(Song::Songs, Song::ArtistId)
                            .to(Artist::Artists, Artist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Song::Songs).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Song {
    Songs,
    Id,
    ArtistId,
    CreatedAt,
    CompleteAudio,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Artist {
    Artists,
    Id,
}
