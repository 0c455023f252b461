pub mod admin;
pub mod artists;
pub mod auth;
pub mod home;
pub mod orders;
pub mod snippets;
pub mod songs;

use std::net::SocketAddr;

use axum::{
    http::HeaderMap,
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::auth::auth_middleware;
use crate::middleware::role::require_admin;
use crate::state::AppState;

// Define the OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Browse endpoints
        home::frontpage,
        snippets::get_snippet,
        artists::artist_page,
        // Authentication endpoints
        auth::register,
        auth::login,
        auth::refresh,
        auth::logout,
        auth::me,
        // Artist endpoints
        snippets::upload_snippet,
        snippets::publish_snippet,
        snippets::create_comment,
        orders::create_order,
        songs::complete_song,
        // Admin endpoints
        admin::list_songs,
        admin::retry_processing,
        admin::list_orders,
        admin::refund_orders,
        admin::list_payments,
        admin::create_artist_payment,
        admin::mark_payment_paid,
        admin::list_comments,
        admin::set_comment_display,
        admin::list_jobs,
    ),
    components(
        schemas(
            home::SnippetSummary,
            snippets::SnippetDetailResponse,
            snippets::UploadSnippetResponse,
            snippets::PublishResponse,
            snippets::CommentResponse,
            snippets::CreateCommentRequest,
            artists::ArtistPageResponse,
            orders::CreateOrderRequest,
            orders::OrderResponse,
            songs::CompleteSongResponse,
            auth::RegisterRequest,
            auth::UserResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RefreshRequest,
            auth::RefreshResponse,
            auth::LogoutRequest,
            auth::LogoutResponse,
            admin::SongAdminResponse,
            admin::SnippetAdminInfo,
            admin::RetryProcessingRequest,
            admin::RetryProcessingResponse,
            admin::OrderAdminResponse,
            admin::RefundOrdersRequest,
            admin::PaymentAdminResponse,
            admin::MarkPaidResponse,
            admin::CommentAdminResponse,
            admin::SetCommentDisplayRequest,
            admin::JobAdminResponse,
            crate::entities::user::Role,
            crate::entities::snippet::SnippetState,
            crate::entities::snippet::VisualEffect,
            crate::entities::job::JobKind,
            crate::entities::job::JobStatus,
            crate::services::refunds::BatchRefundResult,
        )
    ),
    tags(
        (name = "Browse", description = "Public browsing of snippets and artist pages"),
        (name = "Authentication", description = "Login, registration and token handling"),
        (name = "Snippets", description = "Snippet upload, publication and comments"),
        (name = "Orders", description = "Pre-ordering songs"),
        (name = "Songs", description = "Completing songs and delivering orders"),
        (name = "Admin", description = "Administrative lists, filters and bulk actions")
    ),
    info(
        title = "Presong API",
        version = "0.1.0",
        description = "A marketplace where artists publish song snippets and listeners pre-order the completed songs",
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

// Add security scheme for JWT Bearer tokens
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}

/// First hop of X-Forwarded-For when present, the socket peer otherwise.
pub fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> Option<String> {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    Some(addr.ip().to_string())
}

pub fn create_routes(state: AppState) -> Router {
    // Swagger UI (stateless)
    let swagger_router: Router = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into();

    // Routes that require a logged-in user
    let authed_routes = Router::new()
        .route("/snippets", post(snippets::upload_snippet))
        .route("/snippets/{id}/publish", post(snippets::publish_snippet))
        .route("/snippets/{id}/comments", post(snippets::create_comment))
        .route("/snippets/{id}/order", post(orders::create_order))
        .route("/songs/{id}/complete", post(songs::complete_song))
        .route("/auth/me", get(auth::me))
        .layer(middleware::from_fn(auth_middleware));

    // Admin-only routes
    let admin_routes = Router::new()
        .route("/admin/songs", get(admin::list_songs))
        .route("/admin/songs/retry-processing", post(admin::retry_processing))
        .route("/admin/orders", get(admin::list_orders))
        .route("/admin/orders/refund", post(admin::refund_orders))
        .route("/admin/payments", get(admin::list_payments))
        .route("/admin/payments/{id}/mark-paid", post(admin::mark_payment_paid))
        .route("/admin/artists/{id}/payments", post(admin::create_artist_payment))
        .route("/admin/comments", get(admin::list_comments))
        .route("/admin/comments/{id}", patch(admin::set_comment_display))
        .route("/admin/jobs", get(admin::list_jobs))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn(auth_middleware));

    // Public routes (anonymous viewers welcome) and merge all together
    let app_routes = Router::new()
        .route("/", get(home::frontpage))
        .route("/snippets/{id}", get(snippets::get_snippet))
        .route("/artists/{username}", get(artists::artist_page))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .merge(authed_routes)
        .merge(admin_routes)
        .with_state(state);

    Router::new()
        .merge(swagger_router)
        .merge(app_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.10:4321".parse().unwrap()
    }

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, peer()), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn client_ip_falls_back_to_peer_address() {
        assert_eq!(client_ip(&HeaderMap::new(), peer()), Some("192.0.2.10".to_string()));
    }
}
