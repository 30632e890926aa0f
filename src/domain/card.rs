use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A card row. `(board_id, column_id)` is the card's partition; `position`
/// values within an active partition are dense: 0..N-1 with no duplicates.
/// Everything else is payload the reordering logic never looks at.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: String,
    pub owner_id: String,
    pub board_id: String,
    pub column_id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<String>,
    pub labels: String,
    pub tasks: String,
    pub position: i64,
    pub is_starred: bool,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A checklist item embedded in a card's `tasks` JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}
