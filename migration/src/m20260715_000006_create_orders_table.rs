use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Order::Orders)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Order::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Order::SongId).uuid().not_null())
                    .col(ColumnDef::new(Order::PurchaserId).integer().not_null())
                    .col(ColumnDef::new(Order::Price).big_integer().not_null())
                    .col(ColumnDef::new(Order::Refunded).boolean().not_null().default(false))
                    .col(ColumnDef::new(Order::Delivered).boolean().not_null().default(false))
                    .col(ColumnDef::new(Order::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Order::StripeTransactionId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_song")
                            .from(Order::Orders, Order::SongId)
                            .to(Song::Songs, Song::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_purchaser")
                            .from(Order::Orders, Order::PurchaserId)
                            .to(User::Users, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Order::Orders).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Order {
    Orders,
    Id,
    SongId,
    PurchaserId,
    Price,
    Refunded,
    Delivered,
    CreatedAt,
    StripeTransactionId,
}

#[derive(DeriveIden)]
enum Song {
    Songs,
    Id,
}

#[derive(DeriveIden)]
enum User {
    Users,
    Id,
}
