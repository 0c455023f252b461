use axum::{
    extract::{Path, State},
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{artist, user};
use crate::error::AppError;
use crate::middleware::auth::MaybeUser;
use crate::repo;
use crate::routes::home::SnippetSummary;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct ArtistPageResponse {
    pub username: String,
    pub snippets: Vec<SnippetSummary>,
}

#[utoipa::path(
    get,
    path = "/artists/{username}",
    tag = "Browse",
    params(("username" = String, Path, description = "Artist's username")),
    responses(
        (status = 200, description = "Artist page", body = ArtistPageResponse),
        (status = 404, description = "No such artist")
    )
)]
pub async fn artist_page(
    State(state): State<AppState>,
    Path(username): Path<String>,
    MaybeUser(viewer): MaybeUser,
) -> Result<Json<ArtistPageResponse>, AppError> {
    let account = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No artist named {}", username)))?;

    let artist_row = artist::Entity::find()
        .filter(artist::Column::UserId.eq(account.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No artist named {}", username)))?;

    let snippets =
        repo::snippets::visible_for_artist(&state.db, viewer.as_ref(), artist_row.id).await?;

    tracing::info!(
        "Browse | GET /artists/{} | count={} | res=200",
        username,
        snippets.len()
    );

    Ok(Json(ArtistPageResponse {
        username: account.username,
        snippets: snippets
            .into_iter()
            .map(|model| SnippetSummary::from_model(model, state.store.as_ref()))
            .collect(),
    }))
}
