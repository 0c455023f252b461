use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::snippet::{self, SnippetState, VisualEffect};
use crate::error::AppError;
use crate::middleware::auth::MaybeUser;
use crate::repo;
use crate::services::storage::BlobStore;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct SnippetSummary {
    pub id: Uuid,
    pub title: String,
    pub state: SnippetState,
    pub image_url: String,
    /// Streamable rendition; absent while the snippet is still processing.
    pub audio_url: Option<String>,
    pub visual_effect: VisualEffect,
    pub created_at: chrono::NaiveDateTime,
}

impl SnippetSummary {
    pub fn from_model(model: snippet::Model, store: &dyn BlobStore) -> Self {
        Self {
            image_url: store.public_url(&model.image),
            audio_url: model.audio_mp3.as_deref().map(|key| store.public_url(key)),
            id: model.id,
            title: model.title,
            state: model.state,
            visual_effect: model.visual_effect,
            created_at: model.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Browse",
    responses(
        (status = 200, description = "Snippets visible to the viewer", body = Vec<SnippetSummary>)
    )
)]
pub async fn frontpage(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
) -> Result<Json<Vec<SnippetSummary>>, AppError> {
    let snippets = repo::snippets::visible_to(&state.db, viewer.as_ref()).await?;

    tracing::info!(
        "Browse | GET / | viewer={} | count={} | res=200",
        viewer.as_ref().map(|u| u.username.as_str()).unwrap_or("anonymous"),
        snippets.len()
    );

    let summaries = snippets
        .into_iter()
        .map(|model| SnippetSummary::from_model(model, state.store.as_ref()))
        .collect();

    Ok(Json(summaries))
}
