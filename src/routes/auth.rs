use axum::{extract::State, Extension, Json};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::get_config;
use crate::entities::refresh_token::{self, Entity as RefreshToken};
use crate::entities::user::{self, Entity as User, Role};
use crate::entities::artist;
use crate::error::AppError;
use crate::middleware::auth::{AuthUser, Claims};
use crate::state::AppState;

const ACCESS_TOKEN_TTL_SECS: usize = 900; // 15 minutes

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    username: String,
    password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    id: i32,
    username: String,
    role: Role,
    created_at: chrono::NaiveDateTime,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
    expires_in: usize,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RefreshRequest {
    refresh_token: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RefreshResponse {
    access_token: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LogoutRequest {
    refresh_token: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LogoutResponse {
    message: String,
}

fn issue_access_token(account: &user::Model) -> Result<String, AppError> {
    let expiration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|_| AppError::InternalServerError("Clock went backwards".to_string()))?
        .as_secs() as usize
        + ACCESS_TOKEN_TTL_SECS;

    let claims = Claims {
        sub: account.username.clone(),
        uid: account.id,
        exp: expiration,
        role: account.role.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_config().jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encode error: {}", e)))
}

fn generate_refresh_token() -> String {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill(&mut random_bytes);
    general_purpose::STANDARD.encode(random_bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 409, description = "Username is taken")
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let taken = User::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&state.db)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("Username is taken".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(format!("Hash error: {}", e)))?
        .to_string();

    let now = chrono::Utc::now().naive_utc();

    let account = user::ActiveModel {
        username: Set(payload.username),
        password: Set(password_hash),
        role: Set(Role::User),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    // Every account gets its artist row up front; one per user.
    artist::ActiveModel {
        user_id: Set(account.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!("Auth | POST /auth/register | user={} | res=200", account.username);

    Ok(Json(UserResponse {
        id: account.id,
        username: account.username,
        role: account.role,
        created_at: account.created_at,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let account = User::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let parsed_hash = PasswordHash::new(&account.password)
        .map_err(|e| AppError::InternalServerError(format!("Hash parse error: {}", e)))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let access_token = issue_access_token(&account)?;

    let refresh_token_str = generate_refresh_token();
    let refresh_expires_at = chrono::Utc::now().naive_utc() + chrono::Duration::days(1);

    refresh_token::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(account.id),
        token_hash: Set(hash_token(&refresh_token_str)),
        expires_at: Set(refresh_expires_at),
        created_at: Set(chrono::Utc::now().naive_utc()),
        revoked: Set(false),
    }
    .insert(&state.db)
    .await?;

    tracing::info!("Auth | POST /auth/login | user={} | res=200", account.username);

    Ok(Json(LoginResponse {
        access_token,
        refresh_token: refresh_token_str,
        expires_in: ACCESS_TOKEN_TTL_SECS,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = RefreshResponse),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let token = RefreshToken::find()
        .filter(refresh_token::Column::TokenHash.eq(hash_token(&payload.refresh_token)))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if token.revoked {
        return Err(AppError::Unauthorized(
            "User logged out. Please re-login.".to_string(),
        ));
    }

    if token.expires_at < chrono::Utc::now().naive_utc() {
        return Err(AppError::Unauthorized(
            "Refresh token expired. Please re-login.".to_string(),
        ));
    }

    let account = User::find_by_id(token.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found. Please re-login.".to_string()))?;

    let access_token = issue_access_token(&account)?;

    Ok(Json(RefreshResponse { access_token }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 404, description = "Refresh token not found")
    ),
    tag = "Authentication"
)]
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<LogoutResponse>, AppError> {
    let token = RefreshToken::find()
        .filter(refresh_token::Column::TokenHash.eq(hash_token(&payload.refresh_token)))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Refresh token not found".to_string()))?;

    let mut active_token: refresh_token::ActiveModel = token.into();
    active_token.revoked = Set(true);
    active_token.update(&state.db).await?;

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let account = User::find_by_id(auth_user.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        id: account.id,
        username: account.username,
        role: account.role,
        created_at: account.created_at,
    }))
}
