use axum::{
    extract::Request,
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::get_config;
use crate::entities::user;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: user::Role,
}

#[derive(Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: i32,
    pub exp: usize,
    pub role: user::Role,
}

fn decode_user(token: &str) -> Option<AuthUser> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_config().jwt_secret.as_ref()),
        &Validation::default(),
    )
    .ok()?;

    Some(AuthUser {
        id: token_data.claims.uid,
        username: token_data.claims.sub,
        role: token_data.claims.role,
    })
}

pub async fn auth_middleware(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let auth_user = decode_user(token).ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}

/// Identity for endpoints that serve both anonymous and logged-in viewers
/// (frontpage, snippet detail, artist page). Never rejects; an invalid or
/// absent token just means an anonymous viewer.
pub struct MaybeUser(pub Option<AuthUser>);

impl<S> axum::extract::FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .and_then(decode_user);

        Ok(MaybeUser(user))
    }
}
