use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pre-order for a song. Fact record: referenced by song and purchaser but
/// owned by neither.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub song_id: Uuid,
    pub purchaser_id: i32,
    /// Purchase price in cents.
    pub price: i64,
    pub refunded: bool,
    pub delivered: bool,
    pub created_at: DateTime,
    pub stripe_transaction_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::song::Entity",
        from = "Column::SongId",
        to = "super::song::Column::Id",
        on_delete = "Cascade"
    )]
    Song,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::PurchaserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Purchaser,
}

impl Related<super::song::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Song.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchaser.def()
    }
}

impl Related<super::artist_payment::Entity> for Entity {
    fn to() -> RelationDef {
        super::artist_payment_order::Relation::ArtistPayment.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::artist_payment_order::Relation::Order.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
