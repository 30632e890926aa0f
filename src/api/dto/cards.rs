use serde::{Deserialize, Serialize};

use crate::domain::{Card, TaskItem, TaskdeckError};

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    pub board_id: String,
    pub column_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// An empty string clears the due date.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub is_starred: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct MoveCardRequest {
    /// Destination board; defaults to the card's current board.
    #[serde(default)]
    pub board_id: Option<String>,
    pub column_id: String,
    /// Desired slot in the destination column. Out-of-range values are
    /// clamped; omitted means append at the end.
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTasksRequest {
    pub tasks: Vec<TaskItem>,
}

#[derive(Debug, Deserialize)]
pub struct AddLabelRequest {
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct CardResponse {
    pub id: String,
    pub board_id: String,
    pub column_id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<String>,
    pub labels: Vec<String>,
    pub tasks: Vec<TaskItem>,
    pub position: i64,
    pub is_starred: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl CardResponse {
    pub fn from_card(card: Card) -> Result<Self, TaskdeckError> {
        let labels: Vec<String> = serde_json::from_str(&card.labels)?;
        let tasks: Vec<TaskItem> = serde_json::from_str(&card.tasks)?;

        Ok(Self {
            id: card.id,
            board_id: card.board_id,
            column_id: card.column_id,
            title: card.title,
            description: card.description,
            priority: card.priority,
            status: card.status,
            due_date: card.due_date,
            labels,
            tasks,
            position: card.position,
            is_starred: card.is_starred,
            created_at: card.created_at,
            updated_at: card.updated_at,
        })
    }
}
