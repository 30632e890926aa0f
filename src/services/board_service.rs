use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::api::dto::{
    BoardResponse, BoardSummary, CardResponse, ColumnCards, CreateBoardRequest,
    UpdateBoardRequest, UpdateColumnsRequest,
};
use crate::domain::{default_columns, Board, Card, Column, TaskdeckError};

/// Board registry: owns board/column definitions. Columns are embedded in
/// the board row as JSON and supply the valid partition set the card store
/// validates moves against.
pub struct BoardService;

impl BoardService {
    pub async fn list_boards(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Vec<BoardSummary>, TaskdeckError> {
        let summaries: Vec<BoardSummary> = sqlx::query_as(
            r#"
            SELECT
                b.id, b.title, b.description, b.created_at, b.updated_at,
                COALESCE((SELECT COUNT(*) FROM cards c WHERE c.board_id = b.id AND c.is_archived = 0), 0) as card_count
            FROM boards b
            WHERE b.owner_id = ? AND b.is_archived = 0
            ORDER BY b.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(summaries)
    }

    pub async fn create_board(
        pool: &SqlitePool,
        user_id: &str,
        req: CreateBoardRequest,
    ) -> Result<Board, TaskdeckError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let description = req.description.unwrap_or_default();

        let columns = match req.columns {
            Some(columns) if !columns.is_empty() => Self::normalize_columns(columns)?,
            _ => default_columns(),
        };

        sqlx::query(
            "INSERT INTO boards (id, owner_id, title, description, columns, is_archived, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.title)
        .bind(&description)
        .bind(serde_json::to_string(&columns)?)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::get_board_model(pool, user_id, &id).await
    }

    pub async fn get_board_model(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> Result<Board, TaskdeckError> {
        let board: Board = sqlx::query_as(
            "SELECT * FROM boards WHERE id = ? AND owner_id = ? AND is_archived = 0",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| TaskdeckError::NotFound(format!("Board not found: {}", id)))?;

        Ok(board)
    }

    /// Board with its cards grouped per column, columns in declared order,
    /// cards in position order within each column.
    pub async fn get_board(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> Result<BoardResponse, TaskdeckError> {
        let board = Self::get_board_model(pool, user_id, id).await?;
        let mut columns = board.parse_columns()?;
        columns.sort_by_key(|c| c.position);

        let cards: Vec<Card> = sqlx::query_as(
            "SELECT * FROM cards WHERE board_id = ? AND is_archived = 0 ORDER BY position ASC",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        let mut grouped: Vec<ColumnCards> = columns
            .into_iter()
            .map(|column| ColumnCards {
                column,
                cards: vec![],
            })
            .collect();

        for card in cards {
            let response = CardResponse::from_card(card)?;
            if let Some(group) = grouped.iter_mut().find(|g| g.column.id == response.column_id) {
                group.cards.push(response);
            }
        }

        Ok(BoardResponse {
            id: board.id,
            title: board.title,
            description: board.description,
            created_at: board.created_at,
            updated_at: board.updated_at,
            columns: grouped,
        })
    }

    pub async fn update_board(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        req: UpdateBoardRequest,
    ) -> Result<Board, TaskdeckError> {
        let existing = Self::get_board_model(pool, user_id, id).await?;

        let now = Utc::now().to_rfc3339();
        let title = req.title.unwrap_or(existing.title);
        let description = req.description.unwrap_or(existing.description);

        sqlx::query("UPDATE boards SET title = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&title)
            .bind(&description)
            .bind(&now)
            .bind(id)
            .execute(pool)
            .await?;

        Self::get_board_model(pool, user_id, id).await
    }

    /// Replace the board's column set. A column that still holds active
    /// cards may not be dropped; callers must move or delete its cards
    /// first, otherwise those cards would reference a partition that no
    /// longer exists. The occupancy checks and the columns write run in one
    /// transaction, so a card slipping into a doomed column concurrently
    /// surfaces as `Conflict` instead of an orphaned card.
    pub async fn update_columns(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        req: UpdateColumnsRequest,
    ) -> Result<Board, TaskdeckError> {
        if req.columns.is_empty() {
            return Err(TaskdeckError::InvalidTarget(
                "A board must have at least one column".into(),
            ));
        }
        let columns = Self::normalize_columns(req.columns)?;

        let mut tx = pool.begin().await?;

        let board: Board = sqlx::query_as(
            "SELECT * FROM boards WHERE id = ? AND owner_id = ? AND is_archived = 0",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| TaskdeckError::NotFound(format!("Board not found: {}", id)))?;

        for old in board.parse_columns()? {
            if columns.iter().any(|c| c.id == old.id) {
                continue;
            }
            let (size,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM cards WHERE board_id = ? AND column_id = ? AND is_archived = 0",
            )
            .bind(id)
            .bind(&old.id)
            .fetch_one(&mut *tx)
            .await?;
            if size > 0 {
                return Err(TaskdeckError::InvalidTarget(format!(
                    "Column {} still has {} cards and cannot be removed",
                    old.id, size
                )));
            }
        }

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE boards SET columns = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(&columns)?)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Self::get_board_model(pool, user_id, id).await
    }

    /// Archive a board and every card on it in one transaction
    /// (a half-archived board must never be observable).
    pub async fn delete_board(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> Result<(), TaskdeckError> {
        let now = Utc::now().to_rfc3339();

        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE boards SET is_archived = 1, updated_at = ? WHERE id = ? AND owner_id = ? AND is_archived = 0",
        )
        .bind(&now)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TaskdeckError::NotFound(format!("Board not found: {}", id)));
        }

        sqlx::query("UPDATE cards SET is_archived = 1, updated_at = ? WHERE board_id = ?")
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Reject duplicate column ids and re-assign dense column positions in
    /// the submitted order.
    fn normalize_columns(mut columns: Vec<Column>) -> Result<Vec<Column>, TaskdeckError> {
        for (i, column) in columns.iter().enumerate() {
            if column.id.trim().is_empty() {
                return Err(TaskdeckError::InvalidTarget(
                    "Column id must not be empty".into(),
                ));
            }
            if columns[..i].iter().any(|c| c.id == column.id) {
                return Err(TaskdeckError::InvalidTarget(format!(
                    "Duplicate column id: {}",
                    column.id
                )));
            }
        }

        for (i, column) in columns.iter_mut().enumerate() {
            column.position = i as i64;
        }

        Ok(columns)
    }
}
