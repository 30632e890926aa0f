use serde::{Deserialize, Serialize};

use crate::domain::Column;

use super::CardResponse;

#[derive(Debug, Deserialize)]
pub struct CreateBoardRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<Column>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBoardRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateColumnsRequest {
    pub columns: Vec<Column>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct BoardSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub card_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ColumnCards {
    #[serde(flatten)]
    pub column: Column,
    pub cards: Vec<CardResponse>,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub columns: Vec<ColumnCards>,
}
