use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ArtistPaymentOrder::ArtistPaymentOrders)
                    .if_not_exists()
                    .col(ColumnDef::new(ArtistPaymentOrder::PaymentId).uuid().not_null())
                    .col(ColumnDef::new(ArtistPaymentOrder::OrderId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(ArtistPaymentOrder::PaymentId)
                            .col(ArtistPaymentOrder::OrderId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artist_payment_order_payment")
                            .from(
                                ArtistPaymentOrder::ArtistPaymentOrders,
                                ArtistPaymentOrder::PaymentId,
                            )
                            .to(ArtistPayment::ArtistPayments, ArtistPayment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_artist_payment_order_order")
                            .from(
                                ArtistPaymentOrder::ArtistPaymentOrders,
                                ArtistPaymentOrder::OrderId,
                            )
                            .to(Order::Orders, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(ArtistPaymentOrder::ArtistPaymentOrders)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ArtistPaymentOrder {
    ArtistPaymentOrders,
    PaymentId,
    OrderId,
}

#[derive(DeriveIden)]
enum ArtistPayment {
    ArtistPayments,
    Id,
}

#[derive(DeriveIden)]
enum Order {
    Orders,
    Id,
}
