//! The administrative surface: a fixed set of list/filter/bulk-action
//! endpoints per entity, mirroring what moderators and staff need to run the
//! marketplace day to day.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::job::{self, JobKind, JobStatus};
use crate::entities::snippet::{self, SnippetState};
use crate::entities::{artist_payment, comment, order, song, user};
use crate::error::AppError;
use crate::pagination::{PaginatedResponse, Pagination};
use crate::services::refunds::BatchRefundResult;
use crate::services::{lifecycle, payouts};
use crate::state::AppState;

// ---- Songs ----

#[derive(Deserialize)]
pub struct SongFilter {
    /// true: only completed songs; false: only incomplete ones.
    pub completed: Option<bool>,
    pub state: Option<SnippetState>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct SnippetAdminInfo {
    pub id: Uuid,
    pub title: String,
    pub state: SnippetState,
    pub processing_error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SongAdminResponse {
    pub id: Uuid,
    pub artist_id: i32,
    pub created_at: chrono::NaiveDateTime,
    pub completed: bool,
    pub completed_at: Option<chrono::NaiveDateTime>,
    pub snippet: Option<SnippetAdminInfo>,
}

#[utoipa::path(
    get,
    path = "/admin/songs",
    tag = "Admin",
    params(
        ("completed" = Option<bool>, Query, description = "Filter on completion"),
        ("state" = Option<SnippetState>, Query, description = "Filter on snippet state"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Songs with their snippet", body = PaginatedResponse<SongAdminResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_songs(
    State(state): State<AppState>,
    Query(filter): Query<SongFilter>,
) -> Result<Json<PaginatedResponse<SongAdminResponse>>, AppError> {
    let page = filter.pagination.page();
    let limit = filter.pagination.limit();

    let mut query = song::Entity::find().order_by_desc(song::Column::CreatedAt);

    match filter.completed {
        Some(true) => query = query.filter(song::Column::CompletedAt.is_not_null()),
        Some(false) => query = query.filter(song::Column::CompletedAt.is_null()),
        None => {}
    }

    let paginator = query.paginate(&state.db, limit);
    let total_items = paginator.num_items().await?;
    let songs = paginator.fetch_page(page.saturating_sub(1)).await?;

    let song_ids: Vec<Uuid> = songs.iter().map(|s| s.id).collect();
    let mut snippets_by_song: HashMap<Uuid, snippet::Model> = snippet::Entity::find()
        .filter(snippet::Column::SongId.is_in(song_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| (s.song_id, s))
        .collect();

    let data: Vec<SongAdminResponse> = songs
        .into_iter()
        .map(|song_model| {
            let snippet_info = snippets_by_song.remove(&song_model.id).map(|s| SnippetAdminInfo {
                id: s.id,
                title: s.title,
                state: s.state,
                processing_error: s.processing_error,
            });
            SongAdminResponse {
                completed: song_model.is_complete(),
                id: song_model.id,
                artist_id: song_model.artist_id,
                created_at: song_model.created_at,
                completed_at: song_model.completed_at,
                snippet: snippet_info,
            }
        })
        // The snippet-state filter runs over the materialized page.
        .filter(|row| match &filter.state {
            Some(wanted) => row.snippet.as_ref().is_some_and(|s| &s.state == wanted),
            None => true,
        })
        .collect();

    tracing::info!("Admin | GET /admin/songs | count={} | res=200", data.len());

    Ok(Json(PaginatedResponse::new(data, total_items, page, limit)))
}

#[derive(Deserialize, ToSchema)]
pub struct RetryProcessingRequest {
    pub song_ids: Vec<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct RetryProcessingResponse {
    /// Snippets actually reset and re-enqueued; snippets of the given songs
    /// that were not in the error state are skipped.
    pub retried: usize,
}

#[utoipa::path(
    post,
    path = "/admin/songs/retry-processing",
    tag = "Admin",
    request_body = RetryProcessingRequest,
    responses(
        (status = 200, description = "Failed snippets re-enqueued", body = RetryProcessingResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn retry_processing(
    State(state): State<AppState>,
    Json(payload): Json<RetryProcessingRequest>,
) -> Result<Json<RetryProcessingResponse>, AppError> {
    let retried =
        lifecycle::retry_processing(&state.db, state.dispatcher.as_ref(), &payload.song_ids)
            .await
            .map_err(AppError::from)?;

    tracing::info!(
        "Admin | POST /admin/songs/retry-processing | songs={} | retried={} | res=200",
        payload.song_ids.len(),
        retried
    );

    Ok(Json(RetryProcessingResponse { retried }))
}

// ---- Orders ----

#[derive(Deserialize)]
pub struct OrderFilter {
    pub refunded: Option<bool>,
    pub delivered: Option<bool>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct OrderAdminResponse {
    pub id: Uuid,
    pub song_id: Uuid,
    pub purchaser_id: i32,
    pub price: i64,
    pub refunded: bool,
    pub delivered: bool,
    pub created_at: chrono::NaiveDateTime,
    pub stripe_transaction_id: String,
}

impl From<order::Model> for OrderAdminResponse {
    fn from(model: order::Model) -> Self {
        Self {
            id: model.id,
            song_id: model.song_id,
            purchaser_id: model.purchaser_id,
            price: model.price,
            refunded: model.refunded,
            delivered: model.delivered,
            created_at: model.created_at,
            stripe_transaction_id: model.stripe_transaction_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/admin/orders",
    tag = "Admin",
    params(
        ("refunded" = Option<bool>, Query, description = "Filter on refunded"),
        ("delivered" = Option<bool>, Query, description = "Filter on delivered"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Orders, newest first", body = PaginatedResponse<OrderAdminResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<PaginatedResponse<OrderAdminResponse>>, AppError> {
    let page = filter.pagination.page();
    let limit = filter.pagination.limit();

    let mut query = order::Entity::find().order_by_desc(order::Column::CreatedAt);
    if let Some(refunded) = filter.refunded {
        query = query.filter(order::Column::Refunded.eq(refunded));
    }
    if let Some(delivered) = filter.delivered {
        query = query.filter(order::Column::Delivered.eq(delivered));
    }

    let paginator = query.paginate(&state.db, limit);
    let total_items = paginator.num_items().await?;
    let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

    let data: Vec<OrderAdminResponse> = orders.into_iter().map(OrderAdminResponse::from).collect();

    tracing::info!("Admin | GET /admin/orders | count={} | res=200", total_items);

    Ok(Json(PaginatedResponse::new(data, total_items, page, limit)))
}

#[derive(Deserialize, ToSchema)]
pub struct RefundOrdersRequest {
    pub order_ids: Vec<Uuid>,
}

#[utoipa::path(
    post,
    path = "/admin/orders/refund",
    tag = "Admin",
    request_body = RefundOrdersRequest,
    responses(
        (status = 200, description = "Per-order refund results", body = BatchRefundResult)
    ),
    security(("bearer_auth" = []))
)]
pub async fn refund_orders(
    State(state): State<AppState>,
    Json(payload): Json<RefundOrdersRequest>,
) -> Result<Json<BatchRefundResult>, AppError> {
    let result = state.refunds.refund_batch(&payload.order_ids).await;

    tracing::info!(
        "Admin | POST /admin/orders/refund | requested={} | refunded={} | skipped={} | failed={} | res=200",
        payload.order_ids.len(),
        result.refunded,
        result.skipped,
        result.failed.len()
    );

    Ok(Json(result))
}

// ---- Payments ----

#[derive(Deserialize)]
pub struct PaymentFilter {
    pub paid: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentAdminResponse {
    pub id: Uuid,
    pub artist_id: i32,
    pub created_at: chrono::NaiveDateTime,
    pub paid: bool,
    pub paid_at: Option<chrono::NaiveDateTime>,
    pub order_count: usize,
    /// Derived from the member orders, never stored.
    pub total_amount: f64,
    pub total_display: String,
}

fn payment_response(
    payment: artist_payment::Model,
    orders: Vec<order::Model>,
) -> PaymentAdminResponse {
    PaymentAdminResponse {
        order_count: orders.len(),
        total_amount: payouts::total_amount(&orders),
        total_display: payouts::format_amount(payouts::total_cents(&orders)),
        id: payment.id,
        artist_id: payment.artist_id,
        created_at: payment.created_at,
        paid: payment.paid,
        paid_at: payment.paid_at,
    }
}

#[utoipa::path(
    get,
    path = "/admin/payments",
    tag = "Admin",
    params(("paid" = Option<bool>, Query, description = "Filter on paid")),
    responses(
        (status = 200, description = "Payout batches with derived totals", body = Vec<PaymentAdminResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_payments(
    State(state): State<AppState>,
    Query(filter): Query<PaymentFilter>,
) -> Result<Json<Vec<PaymentAdminResponse>>, AppError> {
    let mut query = artist_payment::Entity::find().order_by_desc(artist_payment::Column::CreatedAt);
    if let Some(paid) = filter.paid {
        query = query.filter(artist_payment::Column::Paid.eq(paid));
    }

    let payments = query
        .find_with_related(order::Entity)
        .all(&state.db)
        .await?;

    let data: Vec<PaymentAdminResponse> = payments
        .into_iter()
        .map(|(payment, orders)| payment_response(payment, orders))
        .collect();

    tracing::info!("Admin | GET /admin/payments | count={} | res=200", data.len());

    Ok(Json(data))
}

#[utoipa::path(
    post,
    path = "/admin/artists/{id}/payments",
    tag = "Admin",
    params(("id" = i32, Path, description = "Artist id")),
    responses(
        (status = 200, description = "Payout batch created", body = PaymentAdminResponse),
        (status = 400, description = "Artist has no unpaid orders")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_artist_payment(
    State(state): State<AppState>,
    Path(artist_id): Path<i32>,
) -> Result<Json<PaymentAdminResponse>, AppError> {
    let Some((payment, orders)) = payouts::create_payment(&state.db, artist_id).await? else {
        return Err(AppError::BadRequest(
            "Artist has no unpaid orders".to_string(),
        ));
    };

    tracing::info!(
        "Admin | POST /admin/artists/{}/payments | payment={} | res=200",
        artist_id,
        payment.id
    );

    Ok(Json(payment_response(payment, orders)))
}

#[derive(Serialize, ToSchema)]
pub struct MarkPaidResponse {
    pub id: Uuid,
    /// False when the payment was already marked paid.
    pub changed: bool,
}

#[utoipa::path(
    post,
    path = "/admin/payments/{id}/mark-paid",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment marked paid", body = MarkPaidResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_payment_paid(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<MarkPaidResponse>, AppError> {
    let changed = payouts::mark_paid(&state.db, payment_id).await?;

    tracing::info!(
        "Admin | POST /admin/payments/{}/mark-paid | changed={} | res=200",
        payment_id,
        changed
    );

    Ok(Json(MarkPaidResponse {
        id: payment_id,
        changed,
    }))
}

// ---- Comments ----

#[derive(Deserialize)]
pub struct CommentFilter {
    pub displayed: Option<bool>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct CommentAdminResponse {
    pub id: Uuid,
    pub user_id: i32,
    pub username: String,
    pub snippet_id: Uuid,
    pub content: String,
    pub ip_address: Option<String>,
    pub is_displayed: bool,
    pub created_at: chrono::NaiveDateTime,
}

#[utoipa::path(
    get,
    path = "/admin/comments",
    tag = "Admin",
    params(
        ("displayed" = Option<bool>, Query, description = "Filter on display flag"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Comments, newest first", body = PaginatedResponse<CommentAdminResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(filter): Query<CommentFilter>,
) -> Result<Json<PaginatedResponse<CommentAdminResponse>>, AppError> {
    let page = filter.pagination.page();
    let limit = filter.pagination.limit();

    let mut query = comment::Entity::find().order_by_desc(comment::Column::CreatedAt);
    if let Some(displayed) = filter.displayed {
        query = query.filter(comment::Column::IsDisplayed.eq(displayed));
    }

    let paginator = query.paginate(&state.db, limit);
    let total_items = paginator.num_items().await?;
    let comments = paginator.fetch_page(page.saturating_sub(1)).await?;

    let author_ids: Vec<i32> = comments.iter().map(|c| c.user_id).collect();
    let authors: HashMap<i32, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let data: Vec<CommentAdminResponse> = comments
        .into_iter()
        .map(|c| CommentAdminResponse {
            username: authors.get(&c.user_id).cloned().unwrap_or_default(),
            id: c.id,
            user_id: c.user_id,
            snippet_id: c.snippet_id,
            content: c.content,
            ip_address: c.ip_address,
            is_displayed: c.is_displayed,
            created_at: c.created_at,
        })
        .collect();

    tracing::info!("Admin | GET /admin/comments | count={} | res=200", total_items);

    Ok(Json(PaginatedResponse::new(data, total_items, page, limit)))
}

#[derive(Deserialize, ToSchema)]
pub struct SetCommentDisplayRequest {
    pub is_displayed: bool,
}

#[utoipa::path(
    patch,
    path = "/admin/comments/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Comment id")),
    request_body = SetCommentDisplayRequest,
    responses(
        (status = 200, description = "Display flag updated"),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_comment_display(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<SetCommentDisplayRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let existing = comment::Entity::find_by_id(comment_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    let mut active: comment::ActiveModel = existing.into();
    active.is_displayed = Set(payload.is_displayed);
    let updated = active.update(&state.db).await?;

    tracing::info!(
        "Admin | PATCH /admin/comments/{} | is_displayed={} | res=200",
        comment_id,
        updated.is_displayed
    );

    Ok(Json(serde_json::json!({
        "id": updated.id,
        "is_displayed": updated.is_displayed,
    })))
}

// ---- Jobs ----

#[derive(Deserialize)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub kind: Option<JobKind>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct JobAdminResponse {
    pub id: Uuid,
    pub snippet_id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub error: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[utoipa::path(
    get,
    path = "/admin/jobs",
    tag = "Admin",
    params(
        ("status" = Option<JobStatus>, Query, description = "Filter on status"),
        ("kind" = Option<JobKind>, Query, description = "Filter on kind"),
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Processing jobs, newest first", body = PaginatedResponse<JobAdminResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Result<Json<PaginatedResponse<JobAdminResponse>>, AppError> {
    let page = filter.pagination.page();
    let limit = filter.pagination.limit();

    let mut query = job::Entity::find().order_by_desc(job::Column::CreatedAt);
    if let Some(status) = filter.status {
        query = query.filter(job::Column::Status.eq(status));
    }
    if let Some(kind) = filter.kind {
        query = query.filter(job::Column::Kind.eq(kind));
    }

    let paginator = query.paginate(&state.db, limit);
    let total_items = paginator.num_items().await?;
    let jobs = paginator.fetch_page(page.saturating_sub(1)).await?;

    let data: Vec<JobAdminResponse> = jobs
        .into_iter()
        .map(|j| JobAdminResponse {
            id: j.id,
            snippet_id: j.snippet_id,
            kind: j.kind,
            status: j.status,
            error: j.error,
            created_at: j.created_at,
            updated_at: j.updated_at,
        })
        .collect();

    tracing::info!("Admin | GET /admin/jobs | count={} | res=200", total_items);

    Ok(Json(PaginatedResponse::new(data, total_items, page, limit)))
}
