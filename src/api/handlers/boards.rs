use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::api::dto::{
    BoardResponse, BoardSummary, CreateBoardRequest, UpdateBoardRequest, UpdateColumnsRequest,
};
use crate::api::AppState;
use crate::auth::middleware::AuthUser;
use crate::domain::{Board, TaskdeckError};
use crate::services::BoardService;

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<BoardSummary>>, TaskdeckError> {
    let pool = state.require_db()?;
    let boards = BoardService::list_boards(pool, &user.user_id).await?;
    Ok(Json(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<Board>), TaskdeckError> {
    let pool = state.require_db()?;
    let board = BoardService::create_board(pool, &user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<BoardResponse>, TaskdeckError> {
    let pool = state.require_db()?;
    let board = BoardService::get_board(pool, &user.user_id, &id).await?;
    Ok(Json(board))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBoardRequest>,
) -> Result<Json<Board>, TaskdeckError> {
    let pool = state.require_db()?;
    let board = BoardService::update_board(pool, &user.user_id, &id, req).await?;
    Ok(Json(board))
}

pub async fn update_columns(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateColumnsRequest>,
) -> Result<Json<Board>, TaskdeckError> {
    let pool = state.require_db()?;
    let board = BoardService::update_columns(pool, &user.user_id, &id, req).await?;
    Ok(Json(board))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, TaskdeckError> {
    let pool = state.require_db()?;
    BoardService::delete_board(pool, &user.user_id, &id).await?;
    Ok(Json(json!({ "message": "Board archived successfully" })))
}
