use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A payout batch owed to an artist. Order membership is fixed at creation
/// through `artist_payment_orders`; the total is always derived from the
/// member orders, never stored.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "artist_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub artist_id: i32,
    pub created_at: DateTime,
    pub paid: bool,
    pub paid_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::artist::Entity",
        from = "Column::ArtistId",
        to = "super::artist::Column::Id",
        on_delete = "Cascade"
    )]
    Artist,
}

impl Related<super::artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artist.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        super::artist_payment_order::Relation::Order.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::artist_payment_order::Relation::ArtistPayment.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
