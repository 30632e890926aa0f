#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::ServiceExt;
use uuid::Uuid;

use taskdeck_backend::api::dto::{CreateBoardRequest, CreateCardRequest};
use taskdeck_backend::api::{create_router, AppState};
use taskdeck_backend::auth::{jwt, password};
use taskdeck_backend::config::Config;
use taskdeck_backend::domain::Column;
use taskdeck_backend::services::{BoardService, CardService};

/// In-memory database. A single connection, otherwise each pooled
/// connection would see its own empty `:memory:` database.
pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn test_app(pool: SqlitePool) -> Router {
    let state = AppState::new(Some(pool), Arc::new(Config::default()));
    create_router(state)
}

pub async fn seed_user(pool: &SqlitePool, username: &str) -> (String, String) {
    let user_id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let password_hash = password::hash_password("test-password-123").expect("hash");

    sqlx::query(
        "INSERT INTO users (id, username, nickname, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, '', ?, ?, ?)",
    )
    .bind(&user_id)
    .bind(username)
    .bind(username)
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("Failed to seed user");

    let signing_key = jwt::get_or_create_signing_key(pool).await.expect("key");
    let token = jwt::create_token(&signing_key, &user_id).expect("token");

    (user_id, token)
}

/// Board with the default todo / in-progress / done columns.
pub async fn seed_board(pool: &SqlitePool, user_id: &str, title: &str) -> String {
    let board = BoardService::create_board(
        pool,
        user_id,
        CreateBoardRequest {
            title: title.into(),
            description: None,
            columns: None,
        },
    )
    .await
    .expect("Failed to create board");

    board.id
}

pub async fn seed_board_with_columns(
    pool: &SqlitePool,
    user_id: &str,
    title: &str,
    column_ids: &[&str],
) -> String {
    let columns = column_ids
        .iter()
        .map(|id| Column {
            id: (*id).into(),
            title: (*id).into(),
            color: "gray".into(),
            position: 0,
        })
        .collect();

    let board = BoardService::create_board(
        pool,
        user_id,
        CreateBoardRequest {
            title: title.into(),
            description: None,
            columns: Some(columns),
        },
    )
    .await
    .expect("Failed to create board");

    board.id
}

pub async fn seed_card(
    pool: &SqlitePool,
    user_id: &str,
    board_id: &str,
    column_id: &str,
    title: &str,
) -> String {
    let card = CardService::create_card(
        pool,
        user_id,
        CreateCardRequest {
            board_id: board_id.into(),
            column_id: column_id.into(),
            title: title.into(),
            description: None,
            priority: None,
            due_date: None,
        },
    )
    .await
    .expect("Failed to create card");

    card.id
}

/// Active cards of a partition as `(id, position)`, ordered by position.
pub async fn partition_cards(
    pool: &SqlitePool,
    board_id: &str,
    column_id: &str,
) -> Vec<(String, i64)> {
    sqlx::query_as(
        "SELECT id, position FROM cards WHERE board_id = ? AND column_id = ? AND is_archived = 0 ORDER BY position ASC",
    )
    .bind(board_id)
    .bind(column_id)
    .fetch_all(pool)
    .await
    .expect("Failed to fetch partition")
}

/// Positions in a partition must be exactly 0..N-1.
pub async fn assert_dense(pool: &SqlitePool, board_id: &str, column_id: &str) {
    let cards = partition_cards(pool, board_id, column_id).await;
    let positions: Vec<i64> = cards.iter().map(|(_, p)| *p).collect();
    let expected: Vec<i64> = (0..cards.len() as i64).collect();
    assert_eq!(
        positions, expected,
        "partition ({}, {}) is not dense: {:?}",
        board_id, column_id, cards
    );
}

pub async fn make_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<String>,
    token: Option<&str>,
) -> (StatusCode, String) {
    let mut request = Request::builder().uri(uri).method(method);

    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {}", token));
    }

    let request = request.body(Body::from(body.unwrap_or_default())).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    (status, body_str)
}
