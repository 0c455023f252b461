use axum::{
    extract::{Path, State},
    Extension, Json,
};
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::get_config;
use crate::entities::order;
use crate::entities::snippet::SnippetState;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::repo;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Charge id obtained from the payment provider on the client side.
    pub stripe_transaction_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub song_id: Uuid,
    pub price: i64,
    pub refunded: bool,
    pub delivered: bool,
    pub created_at: chrono::NaiveDateTime,
}

#[utoipa::path(
    post,
    path = "/snippets/{id}/order",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Snippet id")),
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order recorded", body = OrderResponse),
        (status = 404, description = "Snippet not found or not visible"),
        (status = 409, description = "Snippet is not published yet")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(snippet_id): Path<Uuid>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let snippet_model = repo::snippets::find_visible(&state.db, Some(&auth_user), snippet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Snippet not found".to_string()))?;

    if snippet_model.state != SnippetState::Published {
        return Err(AppError::Conflict(
            "Only published snippets can be ordered".to_string(),
        ));
    }

    if payload.stripe_transaction_id.is_empty() {
        return Err(AppError::BadRequest("Missing transaction id".to_string()));
    }

    let saved = order::ActiveModel {
        id: Set(Uuid::new_v4()),
        song_id: Set(snippet_model.song_id),
        purchaser_id: Set(auth_user.id),
        price: Set(get_config().song_price_cents),
        refunded: Set(false),
        delivered: Set(false),
        created_at: Set(chrono::Utc::now().naive_utc()),
        stripe_transaction_id: Set(payload.stripe_transaction_id),
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        "Orders | POST /snippets/{}/order | user={} | order={} | res=200",
        snippet_id,
        auth_user.username,
        saved.id
    );

    Ok(Json(OrderResponse {
        id: saved.id,
        song_id: saved.song_id,
        price: saved.price,
        refunded: saved.refunded,
        delivered: saved.delivered,
        created_at: saved.created_at,
    }))
}
