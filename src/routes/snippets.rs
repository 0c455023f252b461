use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Multipart, Path, State},
    http::HeaderMap,
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::get_config;
use crate::entities::snippet::{self, SnippetState, VisualEffect};
use crate::entities::{artist, comment, song, user};
use crate::error::AppError;
use crate::middleware::auth::{AuthUser, MaybeUser};
use crate::repo;
use crate::routes::client_ip;
use crate::services::lifecycle;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub username: String,
    pub content: String,
    pub created_at: chrono::NaiveDateTime,
    pub is_displayed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct SnippetDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub state: SnippetState,
    pub image_url: String,
    pub audio_url: Option<String>,
    pub visual_effect: VisualEffect,
    /// Pre-order price in cents; site-wide, not per snippet.
    pub price: i64,
    pub order_count: u64,
    /// Whether the complete song behind this snippet has been uploaded.
    pub is_complete: bool,
    pub editable: bool,
    pub beats: Vec<f64>,
    pub comments: Vec<CommentResponse>,
    pub created_at: chrono::NaiveDateTime,
}

fn get_extension(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin")
        .to_string()
}

#[utoipa::path(
    get,
    path = "/snippets/{id}",
    tag = "Browse",
    params(("id" = Uuid, Path, description = "Snippet id")),
    responses(
        (status = 200, description = "Snippet detail", body = SnippetDetailResponse),
        (status = 404, description = "Snippet not found or not visible to this viewer")
    )
)]
pub async fn get_snippet(
    State(state): State<AppState>,
    Path(snippet_id): Path<Uuid>,
    MaybeUser(viewer): MaybeUser,
) -> Result<Json<SnippetDetailResponse>, AppError> {
    let snippet_model = repo::snippets::find_visible(&state.db, viewer.as_ref(), snippet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Snippet not found".to_string()))?;

    let song_model = song::Entity::find_by_id(snippet_model.song_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::InternalServerError("Snippet has no song".to_string()))?;

    let owner_user_id = repo::snippets::owner_user_id(&state.db, snippet_model.song_id).await?;
    let editable = match (&viewer, owner_user_id) {
        (Some(user), Some(owner)) => user.id == owner,
        _ => false,
    };

    let order_count = repo::orders::count_for_song(&state.db, snippet_model.song_id).await?;

    let all_comments = repo::comments::for_snippet(&state.db, snippet_model.id).await?;
    let visible: Vec<&comment::Model> = all_comments
        .iter()
        .filter(|c| repo::comments::visible_to(c, viewer.as_ref()))
        .collect();

    // One username lookup per distinct author.
    let author_ids: Vec<i32> = visible.iter().map(|c| c.user_id).collect();
    let authors: std::collections::HashMap<i32, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let comments = visible
        .into_iter()
        .map(|c| CommentResponse {
            id: c.id,
            username: authors.get(&c.user_id).cloned().unwrap_or_default(),
            content: c.content.clone(),
            created_at: c.created_at,
            is_displayed: c.is_displayed,
        })
        .collect();

    tracing::info!("Browse | GET /snippets/{} | res=200", snippet_id);

    Ok(Json(SnippetDetailResponse {
        image_url: state.store.public_url(&snippet_model.image),
        audio_url: snippet_model
            .audio_mp3
            .as_deref()
            .map(|key| state.store.public_url(key)),
        beats: snippet_model.beat_locations(),
        price: get_config().song_price_cents,
        order_count,
        is_complete: song_model.is_complete(),
        editable,
        comments,
        id: snippet_model.id,
        title: snippet_model.title,
        state: snippet_model.state,
        visual_effect: snippet_model.visual_effect,
        created_at: snippet_model.created_at,
    }))
}

#[derive(Serialize, ToSchema)]
pub struct UploadSnippetResponse {
    pub id: Uuid,
    pub song_id: Uuid,
    pub state: SnippetState,
}

#[utoipa::path(
    post,
    path = "/snippets",
    tag = "Snippets",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Snippet created, processing scheduled", body = UploadSnippetResponse),
        (status = 400, description = "Missing title, image or audio field")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_snippet(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadSnippetResponse>, AppError> {
    let mut title: Option<String> = None;
    let mut visual_effect = VisualEffect::Pulsate;
    let mut image: Option<(String, Vec<u8>, String)> = None;
    let mut audio: Option<(String, Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Invalid multipart data".to_string()))?
    {
        let field_name = field.name().map(|s| s.to_string());
        match field_name.as_deref() {
            Some("title") => {
                title = Some(field.text().await.map_err(|_| {
                    AppError::BadRequest("Invalid title field".to_string())
                })?);
            }
            Some("visual_effect") => {
                let value = field.text().await.map_err(|_| {
                    AppError::BadRequest("Invalid visual_effect field".to_string())
                })?;
                visual_effect = match value.as_str() {
                    "none" => VisualEffect::None,
                    _ => VisualEffect::Pulsate,
                };
            }
            Some(name @ ("image" | "audio")) => {
                let is_image = name == "image";
                let filename = field.file_name().unwrap_or("unknown").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|_| {
                    AppError::InternalServerError("Failed to read file bytes".to_string())
                })?;
                let payload = (get_extension(&filename), data.to_vec(), content_type);
                if is_image {
                    image = Some(payload);
                } else {
                    audio = Some(payload);
                }
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| AppError::BadRequest("No title field found".to_string()))?;
    let (image_ext, image_data, image_type) =
        image.ok_or_else(|| AppError::BadRequest("No image field found".to_string()))?;
    let (audio_ext, audio_data, audio_type) =
        audio.ok_or_else(|| AppError::BadRequest("No audio field found".to_string()))?;

    let image_key = format!("snippets/images/{}.{}", Uuid::new_v4(), image_ext);
    let audio_key = format!("snippets/audio/uploaded/{}.{}", Uuid::new_v4(), audio_ext);

    state.store.put(&image_key, image_data, &image_type).await?;
    state.store.put(&audio_key, audio_data, &audio_type).await?;

    let now = chrono::Utc::now().naive_utc();

    // One artist row per user account, created on first upload.
    let artist_row = match artist::Entity::find()
        .filter(artist::Column::UserId.eq(auth_user.id))
        .one(&state.db)
        .await?
    {
        Some(existing) => existing,
        None => {
            artist::ActiveModel {
                user_id: Set(auth_user.id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&state.db)
            .await?
        }
    };

    let song_model = song::ActiveModel {
        id: Set(Uuid::new_v4()),
        artist_id: Set(artist_row.id),
        created_at: Set(now),
        complete_audio: Set(None),
        completed_at: Set(None),
    }
    .insert(&state.db)
    .await?;

    let snippet_model = snippet::ActiveModel {
        id: Set(Uuid::new_v4()),
        song_id: Set(song_model.id),
        title: Set(title),
        state: Set(SnippetState::Processing),
        processing_error: Set(None),
        created_at: Set(now),
        image: Set(image_key),
        uploaded_audio: Set(Some(audio_key)),
        audio_mp3: Set(None),
        analysis_data: Set(None),
        visual_effect: Set(visual_effect),
    }
    .insert(&state.db)
    .await?;

    lifecycle::process_uploaded_audio(state.dispatcher.as_ref(), snippet_model.id).await?;

    tracing::info!(
        "Snippets | POST /snippets | user={} | snippet={} | res=200",
        auth_user.username,
        snippet_model.id
    );

    Ok(Json(UploadSnippetResponse {
        id: snippet_model.id,
        song_id: snippet_model.song_id,
        state: snippet_model.state,
    }))
}

#[derive(Serialize, ToSchema)]
pub struct PublishResponse {
    pub id: Uuid,
    pub state: SnippetState,
}

#[utoipa::path(
    post,
    path = "/snippets/{id}/publish",
    tag = "Snippets",
    params(("id" = Uuid, Path, description = "Snippet id")),
    responses(
        (status = 200, description = "Snippet published", body = PublishResponse),
        (status = 403, description = "Not the owning artist"),
        (status = 404, description = "Snippet not found"),
        (status = 409, description = "Snippet is not ready")
    ),
    security(("bearer_auth" = []))
)]
pub async fn publish_snippet(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(snippet_id): Path<Uuid>,
) -> Result<Json<PublishResponse>, AppError> {
    let snippet_model = snippet::Entity::find_by_id(snippet_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Snippet not found".to_string()))?;

    let owner = repo::snippets::owner_user_id(&state.db, snippet_model.song_id).await?;
    if owner != Some(auth_user.id) {
        return Err(AppError::Forbidden(
            "Only the owning artist can publish a snippet".to_string(),
        ));
    }

    lifecycle::publish(&state.db, &snippet_model).await?;

    tracing::info!(
        "Snippets | POST /snippets/{}/publish | user={} | res=200",
        snippet_id,
        auth_user.username
    );

    Ok(Json(PublishResponse {
        id: snippet_id,
        state: SnippetState::Published,
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[utoipa::path(
    post,
    path = "/snippets/{id}/comments",
    tag = "Snippets",
    params(("id" = Uuid, Path, description = "Snippet id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment recorded", body = CommentResponse),
        (status = 404, description = "Snippet not found or not visible")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(snippet_id): Path<Uuid>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<CommentResponse>, AppError> {
    let snippet_model = repo::snippets::find_visible(&state.db, Some(&auth_user), snippet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Snippet not found".to_string()))?;

    if payload.content.trim().is_empty() {
        return Err(AppError::BadRequest("Comment is empty".to_string()));
    }

    let saved = comment::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(auth_user.id),
        snippet_id: Set(snippet_model.id),
        created_at: Set(chrono::Utc::now().naive_utc()),
        content: Set(payload.content),
        ip_address: Set(client_ip(&headers, addr)),
        is_displayed: Set(true),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        "Snippets | POST /snippets/{}/comments | user={} | res=200",
        snippet_id,
        auth_user.username
    );

    Ok(Json(CommentResponse {
        id: saved.id,
        username: auth_user.username,
        content: saved.content,
        created_at: saved.created_at,
        is_displayed: saved.is_displayed,
    }))
}
