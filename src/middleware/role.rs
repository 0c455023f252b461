use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::entities::user::Role;
use crate::middleware::auth::AuthUser;

pub async fn require_admin(req: Request, next: Next) -> Result<Response, StatusCode> {
    let auth_user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if auth_user.role != Role::Admin {
        tracing::warn!("Access denied: user '{}' is not an admin", auth_user.username);
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
