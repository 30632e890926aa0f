use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::TaskdeckError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Board {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    /// JSON-encoded `Vec<Column>`. A board always has at least one column.
    pub columns: String,
    pub is_archived: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    #[serde(default = "default_column_color")]
    pub color: String,
    #[serde(default)]
    pub position: i64,
}

fn default_column_color() -> String {
    "gray".into()
}

impl Board {
    pub fn parse_columns(&self) -> Result<Vec<Column>, TaskdeckError> {
        let columns: Vec<Column> = serde_json::from_str(&self.columns)?;
        Ok(columns)
    }

    pub fn has_column(&self, column_id: &str) -> Result<bool, TaskdeckError> {
        Ok(self.parse_columns()?.iter().any(|c| c.id == column_id))
    }
}

pub fn default_columns() -> Vec<Column> {
    vec![
        Column {
            id: "todo".into(),
            title: "To Do".into(),
            color: "gray".into(),
            position: 0,
        },
        Column {
            id: "in-progress".into(),
            title: "In Progress".into(),
            color: "blue".into(),
            position: 1,
        },
        Column {
            id: "done".into(),
            title: "Done".into(),
            color: "green".into(),
            position: 2,
        },
    ]
}
