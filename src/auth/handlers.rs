use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::auth::{jwt, middleware::AuthUser, password};
use crate::domain::TaskdeckError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub nickname: String,
    pub email: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPassword {
    pub id: String,
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
}

async fn issue_tokens(
    pool: &sqlx::SqlitePool,
    user_id: &str,
) -> Result<(String, String), TaskdeckError> {
    let signing_key = jwt::get_or_create_signing_key(pool)
        .await
        .map_err(|e| TaskdeckError::Internal(format!("Failed to load JWT signing key: {}", e)))?;
    let token = jwt::create_token(&signing_key, user_id)
        .map_err(|e| TaskdeckError::Internal(format!("Failed to create JWT token: {}", e)))?;

    let refresh_token = jwt::create_refresh_token();
    let refresh_token_hash = jwt::hash_refresh_token(&refresh_token);
    let now = chrono::Utc::now();

    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at, revoked) VALUES (?, ?, ?, ?, ?, 0)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(refresh_token_hash)
    .bind((now + chrono::Duration::days(30)).to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok((token, refresh_token))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), TaskdeckError> {
    let pool = state.require_db()?;

    let username = req.username.trim().to_string();
    if username.len() < 3 {
        return Err(TaskdeckError::BadRequest(
            "Username must be at least 3 characters".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(TaskdeckError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(&username)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Err(TaskdeckError::Conflict("Username already taken".into()));
    }

    let password_hash = password::hash_password(&req.password)?;
    let user_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let nickname = req.nickname.unwrap_or_else(|| username.clone());
    let email = req.email.unwrap_or_default();

    sqlx::query(
        "INSERT INTO users (id, username, nickname, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(&username)
    .bind(&nickname)
    .bind(&email)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    let (token, refresh_token) = issue_tokens(pool, &user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            refresh_token,
            user: UserResponse {
                id: user_id,
                username,
                nickname,
                email,
            },
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, TaskdeckError> {
    let pool = state.require_db()?;

    let user: UserWithPassword = sqlx::query_as(
        "SELECT id, username, nickname, email, password_hash FROM users WHERE username = ?",
    )
    .bind(req.username.trim())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| TaskdeckError::Unauthorized("Invalid username or password".into()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(TaskdeckError::Unauthorized(
            "Invalid username or password".into(),
        ));
    }

    let (token, refresh_token) = issue_tokens(pool, &user.id).await?;

    Ok(Json(AuthResponse {
        token,
        refresh_token,
        user: UserResponse {
            id: user.id,
            username: user.username,
            nickname: user.nickname,
            email: user.email,
        },
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, TaskdeckError> {
    let pool = state.require_db()?;

    let token_hash = jwt::hash_refresh_token(&req.refresh_token);
    let now = chrono::Utc::now().to_rfc3339();

    let row: Option<(String, String)> = sqlx::query_as(
        "SELECT id, user_id FROM refresh_tokens WHERE token_hash = ? AND revoked = 0 AND expires_at > ?",
    )
    .bind(&token_hash)
    .bind(&now)
    .fetch_optional(pool)
    .await?;

    let (token_id, user_id) =
        row.ok_or_else(|| TaskdeckError::Unauthorized("Invalid refresh token".into()))?;

    // Rotate: the presented token is single use.
    sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ?")
        .bind(&token_id)
        .execute(pool)
        .await?;

    let user: UserResponse =
        sqlx::query_as("SELECT id, username, nickname, email FROM users WHERE id = ?")
            .bind(&user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| TaskdeckError::Unauthorized("Unknown user".into()))?;

    let (token, refresh_token) = issue_tokens(pool, &user_id).await?;

    Ok(Json(AuthResponse {
        token,
        refresh_token,
        user,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, TaskdeckError> {
    let pool = state.require_db()?;

    let user: UserResponse =
        sqlx::query_as("SELECT id, username, nickname, email FROM users WHERE id = ?")
            .bind(&auth_user.user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| TaskdeckError::NotFound("User not found".into()))?;

    Ok(Json(user))
}
