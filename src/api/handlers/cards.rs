use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::dto::{
    AddLabelRequest, CardResponse, CreateCardRequest, MoveCardRequest, UpdateCardRequest,
    UpdateTasksRequest,
};
use crate::api::AppState;
use crate::auth::middleware::AuthUser;
use crate::domain::TaskdeckError;
use crate::services::CardService;

#[derive(Debug, Deserialize)]
pub struct ListCardsQuery {
    pub board_id: Option<String>,
}

pub async fn create_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), TaskdeckError> {
    let pool = state.require_db()?;
    let card = CardService::create_card(pool, &user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn list_cards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListCardsQuery>,
) -> Result<Json<Vec<CardResponse>>, TaskdeckError> {
    let pool = state.require_db()?;
    let cards = CardService::list_cards(pool, &user.user_id, query.board_id.as_deref()).await?;
    Ok(Json(cards))
}

pub async fn get_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<CardResponse>, TaskdeckError> {
    let pool = state.require_db()?;
    let card = CardService::get_card(pool, &user.user_id, &id).await?;
    Ok(Json(card))
}

pub async fn update_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateCardRequest>,
) -> Result<Json<CardResponse>, TaskdeckError> {
    let pool = state.require_db()?;
    let card = CardService::update_card(pool, &user.user_id, &id, req).await?;
    Ok(Json(card))
}

pub async fn move_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<MoveCardRequest>,
) -> Result<Json<CardResponse>, TaskdeckError> {
    let pool = state.require_db()?;
    let card = CardService::move_card(pool, &user.user_id, &id, req).await?;
    Ok(Json(card))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, TaskdeckError> {
    let pool = state.require_db()?;
    CardService::delete_card(pool, &user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTasksRequest>,
) -> Result<Json<CardResponse>, TaskdeckError> {
    let pool = state.require_db()?;
    let card = CardService::update_tasks(pool, &user.user_id, &id, req).await?;
    Ok(Json(card))
}

pub async fn add_label(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<AddLabelRequest>,
) -> Result<Json<CardResponse>, TaskdeckError> {
    let pool = state.require_db()?;
    let card = CardService::add_label(pool, &user.user_id, &id, &req.label).await?;
    Ok(Json(card))
}

pub async fn remove_label(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((id, label)): Path<(String, String)>,
) -> Result<Json<CardResponse>, TaskdeckError> {
    let pool = state.require_db()?;
    let card = CardService::remove_label(pool, &user.user_id, &id, &label).await?;
    Ok(Json(card))
}
