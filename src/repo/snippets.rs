use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select,
};
use uuid::Uuid;

use crate::entities::snippet::{self, SnippetState};
use crate::entities::{artist, song};
use crate::middleware::auth::AuthUser;

/// Published snippets plus, for an authenticated viewer, everything owned by
/// that viewer regardless of state. Other artists' unpublished snippets are
/// never included.
fn visible_query(viewer: Option<&AuthUser>) -> Select<snippet::Entity> {
    let mut cond = Condition::any().add(snippet::Column::State.eq(SnippetState::Published));
    if let Some(user) = viewer {
        cond = cond.add(artist::Column::UserId.eq(user.id));
    }

    snippet::Entity::find()
        .join(JoinType::InnerJoin, snippet::Relation::Song.def())
        .join(JoinType::InnerJoin, song::Relation::Artist.def())
        .filter(cond)
}

pub async fn visible_to(
    db: &DatabaseConnection,
    viewer: Option<&AuthUser>,
) -> Result<Vec<snippet::Model>, DbErr> {
    visible_query(viewer)
        .order_by_desc(snippet::Column::CreatedAt)
        .all(db)
        .await
}

/// The artist-page listing: one artist's snippets, visibility rules applied.
pub async fn visible_for_artist(
    db: &DatabaseConnection,
    viewer: Option<&AuthUser>,
    artist_id: i32,
) -> Result<Vec<snippet::Model>, DbErr> {
    visible_query(viewer)
        .filter(song::Column::ArtistId.eq(artist_id))
        .order_by_desc(snippet::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn find_visible(
    db: &DatabaseConnection,
    viewer: Option<&AuthUser>,
    snippet_id: Uuid,
) -> Result<Option<snippet::Model>, DbErr> {
    visible_query(viewer)
        .filter(snippet::Column::Id.eq(snippet_id))
        .one(db)
        .await
}

/// User id of the artist owning the given song, for editability and
/// permission checks.
pub async fn owner_user_id(db: &DatabaseConnection, song_id: Uuid) -> Result<Option<i32>, DbErr> {
    let Some(song) = song::Entity::find_by_id(song_id).one(db).await? else {
        return Ok(None);
    };
    let owner = artist::Entity::find_by_id(song.artist_id).one(db).await?;
    Ok(owner.map(|a| a.user_id))
}
