use std::collections::HashSet;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::entities::{artist_payment_order, order, song};

/// Orders key off the song, not the snippet: in this phase a song has
/// exactly one snippet.
pub async fn count_for_song(db: &DatabaseConnection, song_id: Uuid) -> Result<u64, DbErr> {
    order::Entity::find()
        .filter(order::Column::SongId.eq(song_id))
        .count(db)
        .await
}

/// Orders on the artist's songs that have not been refunded and are not yet
/// attached to any payout batch. Delivery status is deliberately not part of
/// the filter.
pub async fn unpaid_for_artist(
    db: &DatabaseConnection,
    artist_id: i32,
) -> Result<Vec<order::Model>, DbErr> {
    let candidates = order::Entity::find()
        .join(JoinType::InnerJoin, order::Relation::Song.def())
        .filter(song::Column::ArtistId.eq(artist_id))
        .filter(order::Column::Refunded.eq(false))
        .all(db)
        .await?;

    let attached: HashSet<Uuid> = artist_payment_order::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.order_id)
        .collect();

    Ok(candidates
        .into_iter()
        .filter(|candidate| !attached.contains(&candidate.id))
        .collect())
}
