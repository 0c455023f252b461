use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The complete work behind one or more snippets. In this phase each song
/// has exactly one snippet; they are split so more can be added later.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "songs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub artist_id: i32,
    pub created_at: DateTime,
    /// Blob key of the final audio file, set when the artist completes the song.
    pub complete_audio: Option<String>,
    pub completed_at: Option<DateTime>,
}

impl Model {
    /// A song is complete exactly when the finished audio has been uploaded.
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
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
    #[sea_orm(has_many = "super::snippet::Entity")]
    Snippet,
    #[sea_orm(has_many = "super::order::Entity")]
    Order,
}

impl Related<super::artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artist.def()
    }
}

impl Related<super::snippet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Snippet.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
