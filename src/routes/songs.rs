use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::repo;
use crate::services::lifecycle;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct CompleteSongResponse {
    pub song_id: Uuid,
    /// Orders delivered by this completion.
    pub delivered: u64,
}

#[utoipa::path(
    post,
    path = "/songs/{id}/complete",
    tag = "Songs",
    params(("id" = Uuid, Path, description = "Song id")),
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Complete audio stored, eligible orders delivered", body = CompleteSongResponse),
        (status = 400, description = "No audio field in the upload"),
        (status = 403, description = "Not the owning artist"),
        (status = 404, description = "Song not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn complete_song(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(song_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<CompleteSongResponse>, AppError> {
    let owner = repo::snippets::owner_user_id(&state.db, song_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Song not found".to_string()))?;

    if owner != auth_user.id {
        return Err(AppError::Forbidden(
            "Only the owning artist can complete a song".to_string(),
        ));
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() == Some("audio") {
            let filename = field.file_name().unwrap_or("unknown").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(|_| {
                AppError::InternalServerError("Failed to read file bytes".to_string())
            })?;

            let ext = std::path::Path::new(&filename)
                .extension()
                .and_then(std::ffi::OsStr::to_str)
                .unwrap_or("bin");
            let audio_key = format!("songs/complete/{}.{}", Uuid::new_v4(), ext);

            state
                .store
                .put(&audio_key, data.to_vec(), &content_type)
                .await?;

            let delivered = lifecycle::complete_song(&state.db, song_id, audio_key).await?;

            tracing::info!(
                "Songs | POST /songs/{}/complete | user={} | delivered={} | res=200",
                song_id,
                auth_user.username,
                delivered
            );

            return Ok(Json(CompleteSongResponse { song_id, delivered }));
        }
    }

    Err(AppError::BadRequest("No audio field found".to_string()))
}
