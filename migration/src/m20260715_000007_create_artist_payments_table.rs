use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ArtistPayment::ArtistPayments)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArtistPayment::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ArtistPayment::ArtistId).integer().not_null())
                    .col(ColumnDef::new(ArtistPayment::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(ArtistPayment::Paid).boolean().not_null().default(false))
                    .col(ColumnDef::new(ArtistPayment::PaidAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artist_payment_artist")
                            .from(ArtistPayment::ArtistPayments, ArtistPayment::ArtistId)
                            .to(Artist::Artists, Artist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ArtistPayment::ArtistPayments).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ArtistPayment {
    ArtistPayments,
    Id,
    ArtistId,
    CreatedAt,
    Paid,
    PaidAt,
}

#[derive(DeriveIden)]
enum Artist {
    Artists,
    Id,
}
