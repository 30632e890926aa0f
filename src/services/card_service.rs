use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::api::dto::{
    CardResponse, CreateCardRequest, MoveCardRequest, UpdateCardRequest, UpdateTasksRequest,
};
use crate::domain::{Board, Card, CardStatus, Priority, TaskItem, TaskdeckError};

/// Ordered card store. Cards live in `(board_id, column_id)` partitions and
/// carry a dense position: the active cards of a partition always hold
/// positions 0..N-1 with no duplicates and no gaps. Every mutation runs in a
/// single transaction so a partial shift is never observable; a transaction
/// that loses a write race surfaces as `Conflict` and can be retried.
pub struct CardService;

impl CardService {
    // ── Card CRUD ──────────────────────────────────────────────

    pub async fn create_card(
        pool: &SqlitePool,
        user_id: &str,
        req: CreateCardRequest,
    ) -> Result<CardResponse, TaskdeckError> {
        let priority = req.priority.unwrap_or_else(|| "medium".into());
        priority
            .parse::<Priority>()
            .map_err(TaskdeckError::BadRequest)?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let description = req.description.unwrap_or_default();

        let mut tx = pool.begin().await?;

        Self::require_partition(&mut tx, user_id, &req.board_id, &req.column_id).await?;

        // Appending at the end: density makes the next free slot equal to
        // the partition's active card count.
        let position = Self::partition_size(&mut tx, &req.board_id, &req.column_id).await?;

        sqlx::query(
            "INSERT INTO cards (id, owner_id, board_id, column_id, title, description, priority, status, due_date, labels, tasks, position, is_starred, is_archived, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, 'not-started', ?, '[]', '[]', ?, 0, 0, ?, ?)"
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.board_id)
        .bind(&req.column_id)
        .bind(&req.title)
        .bind(&description)
        .bind(&priority)
        .bind(&req.due_date)
        .bind(position)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Self::get_card(pool, user_id, &id).await
    }

    pub async fn get_card(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> Result<CardResponse, TaskdeckError> {
        let card = Self::get_card_model(pool, user_id, id).await?;
        CardResponse::from_card(card)
    }

    pub async fn get_card_model(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> Result<Card, TaskdeckError> {
        let card: Card =
            sqlx::query_as("SELECT * FROM cards WHERE id = ? AND owner_id = ? AND is_archived = 0")
                .bind(id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| TaskdeckError::NotFound(format!("Card not found: {}", id)))?;

        Ok(card)
    }

    pub async fn list_cards(
        pool: &SqlitePool,
        user_id: &str,
        board_id: Option<&str>,
    ) -> Result<Vec<CardResponse>, TaskdeckError> {
        let cards: Vec<Card> = if let Some(board_id) = board_id {
            sqlx::query_as(
                "SELECT * FROM cards WHERE owner_id = ? AND board_id = ? AND is_archived = 0 ORDER BY column_id ASC, position ASC",
            )
            .bind(user_id)
            .bind(board_id)
            .fetch_all(pool)
            .await?
        } else {
            sqlx::query_as(
                "SELECT * FROM cards WHERE owner_id = ? AND is_archived = 0 ORDER BY board_id ASC, column_id ASC, position ASC",
            )
            .bind(user_id)
            .fetch_all(pool)
            .await?
        };

        cards.into_iter().map(CardResponse::from_card).collect()
    }

    pub async fn update_card(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        req: UpdateCardRequest,
    ) -> Result<CardResponse, TaskdeckError> {
        let existing = Self::get_card_model(pool, user_id, id).await?;

        let now = Utc::now().to_rfc3339();
        let title = req.title.unwrap_or(existing.title);
        let description = req.description.unwrap_or(existing.description);
        let priority = req.priority.unwrap_or(existing.priority);
        let status = req.status.unwrap_or(existing.status);
        let due_date = match &req.due_date {
            Some(s) if s.is_empty() => None,
            Some(s) => Some(s.clone()),
            None => existing.due_date,
        };
        let is_starred = req.is_starred.unwrap_or(existing.is_starred);

        priority
            .parse::<Priority>()
            .map_err(TaskdeckError::BadRequest)?;
        status
            .parse::<CardStatus>()
            .map_err(TaskdeckError::BadRequest)?;

        sqlx::query(
            "UPDATE cards SET title = ?, description = ?, priority = ?, status = ?, due_date = ?, is_starred = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&title)
        .bind(&description)
        .bind(&priority)
        .bind(&status)
        .bind(&due_date)
        .bind(is_starred)
        .bind(&now)
        .bind(id)
        .execute(pool)
        .await?;

        Self::get_card(pool, user_id, id).await
    }

    // ── Reordering ─────────────────────────────────────────────

    /// Move a card to `position` within the destination partition. The
    /// destination board defaults to the card's current board; the column may
    /// be the same or a different one. An out-of-range position is clamped to
    /// the nearest valid slot, and a missing one appends at the end.
    pub async fn move_card(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        req: MoveCardRequest,
    ) -> Result<CardResponse, TaskdeckError> {
        let now = Utc::now().to_rfc3339();

        let mut tx = pool.begin().await?;

        let card: Card =
            sqlx::query_as("SELECT * FROM cards WHERE id = ? AND owner_id = ? AND is_archived = 0")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| TaskdeckError::NotFound(format!("Card not found: {}", id)))?;

        let dest_board = req.board_id.unwrap_or_else(|| card.board_id.clone());
        let dest_column = req.column_id;

        // Reject an unknown destination before any sibling is shifted.
        Self::require_partition(&mut tx, user_id, &dest_board, &dest_column).await?;

        let same_partition = dest_board == card.board_id && dest_column == card.column_id;

        // Size of the destination with the moved card notionally removed;
        // this is also the largest valid target position (append-at-end).
        let mut dest_size = Self::partition_size(&mut tx, &dest_board, &dest_column).await?;
        if same_partition {
            dest_size -= 1;
        }

        let target = match req.position {
            Some(pos) => pos.clamp(0, dest_size),
            None => dest_size,
        };
        let old = card.position;

        if same_partition {
            if target == old {
                return Ok(CardResponse::from_card(card)?);
            }
            if target > old {
                // Siblings between the vacated slot and the target shift
                // toward the front.
                sqlx::query(
                    "UPDATE cards SET position = position - 1, updated_at = ? WHERE board_id = ? AND column_id = ? AND is_archived = 0 AND position > ? AND position <= ? AND id != ?",
                )
                .bind(&now)
                .bind(&dest_board)
                .bind(&dest_column)
                .bind(old)
                .bind(target)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query(
                    "UPDATE cards SET position = position + 1, updated_at = ? WHERE board_id = ? AND column_id = ? AND is_archived = 0 AND position >= ? AND position < ? AND id != ?",
                )
                .bind(&now)
                .bind(&dest_board)
                .bind(&dest_column)
                .bind(target)
                .bind(old)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            }
        } else {
            // Close the gap in the source partition.
            sqlx::query(
                "UPDATE cards SET position = position - 1, updated_at = ? WHERE board_id = ? AND column_id = ? AND is_archived = 0 AND position > ?",
            )
            .bind(&now)
            .bind(&card.board_id)
            .bind(&card.column_id)
            .bind(old)
            .execute(&mut *tx)
            .await?;

            // Open a slot in the destination.
            sqlx::query(
                "UPDATE cards SET position = position + 1, updated_at = ? WHERE board_id = ? AND column_id = ? AND is_archived = 0 AND position >= ?",
            )
            .bind(&now)
            .bind(&dest_board)
            .bind(&dest_column)
            .bind(target)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE cards SET board_id = ?, column_id = ?, position = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&dest_board)
        .bind(&dest_column)
        .bind(target)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Self::get_card(pool, user_id, id).await
    }

    /// Archive a card and close the gap it leaves, keeping the remaining
    /// positions dense.
    pub async fn delete_card(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
    ) -> Result<(), TaskdeckError> {
        let now = Utc::now().to_rfc3339();

        let mut tx = pool.begin().await?;

        let card: Card =
            sqlx::query_as("SELECT * FROM cards WHERE id = ? AND owner_id = ? AND is_archived = 0")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| TaskdeckError::NotFound(format!("Card not found: {}", id)))?;

        sqlx::query("UPDATE cards SET is_archived = 1, updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE cards SET position = position - 1, updated_at = ? WHERE board_id = ? AND column_id = ? AND is_archived = 0 AND position > ?",
        )
        .bind(&now)
        .bind(&card.board_id)
        .bind(&card.column_id)
        .bind(card.position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    // ── Labels & tasks ─────────────────────────────────────────

    pub async fn add_label(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        label: &str,
    ) -> Result<CardResponse, TaskdeckError> {
        let card = Self::get_card_model(pool, user_id, id).await?;

        let mut labels: Vec<String> = serde_json::from_str(&card.labels)?;
        if !labels.iter().any(|l| l == label) {
            labels.push(label.to_string());
            Self::save_labels(pool, id, &labels).await?;
        }

        Self::get_card(pool, user_id, id).await
    }

    pub async fn remove_label(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        label: &str,
    ) -> Result<CardResponse, TaskdeckError> {
        let card = Self::get_card_model(pool, user_id, id).await?;

        let mut labels: Vec<String> = serde_json::from_str(&card.labels)?;
        let before = labels.len();
        labels.retain(|l| l != label);
        if labels.len() != before {
            Self::save_labels(pool, id, &labels).await?;
        }

        Self::get_card(pool, user_id, id).await
    }

    pub async fn update_tasks(
        pool: &SqlitePool,
        user_id: &str,
        id: &str,
        req: UpdateTasksRequest,
    ) -> Result<CardResponse, TaskdeckError> {
        Self::get_card_model(pool, user_id, id).await?;

        let tasks: Vec<TaskItem> = req.tasks;
        let now = Utc::now().to_rfc3339();

        sqlx::query("UPDATE cards SET tasks = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(&tasks)?)
            .bind(&now)
            .bind(id)
            .execute(pool)
            .await?;

        Self::get_card(pool, user_id, id).await
    }

    // ── Helpers ────────────────────────────────────────────────

    async fn save_labels(
        pool: &SqlitePool,
        id: &str,
        labels: &[String],
    ) -> Result<(), TaskdeckError> {
        sqlx::query("UPDATE cards SET labels = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(labels)?)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Number of active cards in a partition.
    async fn partition_size(
        tx: &mut Transaction<'_, Sqlite>,
        board_id: &str,
        column_id: &str,
    ) -> Result<i64, TaskdeckError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM cards WHERE board_id = ? AND column_id = ? AND is_archived = 0",
        )
        .bind(board_id)
        .bind(column_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(count)
    }

    /// The destination partition must be a column of an active board owned
    /// by the caller.
    async fn require_partition(
        tx: &mut Transaction<'_, Sqlite>,
        user_id: &str,
        board_id: &str,
        column_id: &str,
    ) -> Result<(), TaskdeckError> {
        let board: Board = sqlx::query_as(
            "SELECT * FROM boards WHERE id = ? AND owner_id = ? AND is_archived = 0",
        )
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| TaskdeckError::InvalidTarget(format!("Board not found: {}", board_id)))?;

        if !board.has_column(column_id)? {
            return Err(TaskdeckError::InvalidTarget(format!(
                "Column not found on board {}: {}",
                board_id, column_id
            )));
        }

        Ok(())
    }
}
