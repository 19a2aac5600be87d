//! # PostgresStore
//!
//! Maps the relational schema in `migrations/` to the domain models. Every
//! unit of work wraps one sqlx transaction; dropping it rolls back.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::{Background, Board, Card, Checklist, ChecklistItem, Comment, List, User};
use domains::traits::{KanbanStore, UnitOfWork};
use domains::LogEntry;

fn db_err(e: sqlx::Error) -> AppError {
    AppError::internal(format!("database: {e}"))
}

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self { max_connections: 10, min_connections: 1, acquire_timeout: Duration::from_secs(5) }
    }
}

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(url)
            .await
            .map_err(db_err)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::internal(format!("migration: {e}")))
    }
}

#[async_trait]
impl KanbanStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await.map_err(db_err)?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(db_err)?;
        Ok(())
    }
}

struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

// --- Row mappers ---

const USER_COLUMNS: &str = "id, email, firstname, lastname, password_hash, created_at";
const BOARD_COLUMNS: &str = "id, user_id, title, background_id, created_at, updated_at, archived_at";
const LIST_COLUMNS: &str = "id, board_id, title, position, created_at, updated_at, archived_at";
const CARD_COLUMNS: &str = "id, list_id, title, description, position, created_at, updated_at, archived_at";
const COMMENT_COLUMNS: &str = "id, card_id, user_id, content, created_at, updated_at";
const CHECKLIST_COLUMNS: &str = "id, card_id, title, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, checklist_id, title, position, checked, created_at, updated_at";
const BACKGROUND_COLUMNS: &str = "id, user_id, data, color, created_at";
const LOG_COLUMNS: &str = "id, user_id, board_id, action, action_target_id, changes, created_at";

fn user_from_row(row: &PgRow) -> sqlx::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        firstname: row.try_get("firstname")?,
        lastname: row.try_get("lastname")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn board_from_row(row: &PgRow) -> sqlx::Result<Board> {
    Ok(Board {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        background_id: row.try_get("background_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        archived_at: row.try_get("archived_at")?,
    })
}

fn list_from_row(row: &PgRow) -> sqlx::Result<List> {
    Ok(List {
        id: row.try_get("id")?,
        board_id: row.try_get("board_id")?,
        title: row.try_get("title")?,
        position: row.try_get("position")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        archived_at: row.try_get("archived_at")?,
    })
}

fn card_from_row(row: &PgRow) -> sqlx::Result<Card> {
    Ok(Card {
        id: row.try_get("id")?,
        list_id: row.try_get("list_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        position: row.try_get("position")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        archived_at: row.try_get("archived_at")?,
    })
}

fn comment_from_row(row: &PgRow) -> sqlx::Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        card_id: row.try_get("card_id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn checklist_from_row(row: &PgRow) -> sqlx::Result<Checklist> {
    Ok(Checklist {
        id: row.try_get("id")?,
        card_id: row.try_get("card_id")?,
        title: row.try_get("title")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn item_from_row(row: &PgRow) -> sqlx::Result<ChecklistItem> {
    Ok(ChecklistItem {
        id: row.try_get("id")?,
        checklist_id: row.try_get("checklist_id")?,
        title: row.try_get("title")?,
        position: row.try_get("position")?,
        checked: row.try_get("checked")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn background_from_row(row: &PgRow) -> sqlx::Result<Background> {
    Ok(Background {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        data: row.try_get("data")?,
        color: row.try_get("color")?,
        created_at: row.try_get("created_at")?,
    })
}

fn log_from_row(row: &PgRow) -> sqlx::Result<LogEntry> {
    let action: String = row.try_get("action")?;
    Ok(LogEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        board_id: row.try_get("board_id")?,
        action: action.parse().map_err(|e: AppError| sqlx::Error::Decode(Box::new(e)))?,
        action_target_id: row.try_get("action_target_id")?,
        changes: row.try_get("changes")?,
        created_at: row.try_get("created_at")?,
    })
}

impl PgUnitOfWork {
    async fn fetch_one_opt<T>(
        &mut self,
        sql: &str,
        id: Uuid,
        map: fn(&PgRow) -> sqlx::Result<T>,
    ) -> Result<Option<T>> {
        let row = sqlx::query(sql).bind(id).fetch_optional(&mut *self.tx).await.map_err(db_err)?;
        row.as_ref().map(map).transpose().map_err(db_err)
    }

    async fn fetch_all_by<T>(&mut self, sql: &str, id: Uuid, map: fn(&PgRow) -> sqlx::Result<T>) -> Result<Vec<T>> {
        let rows = sqlx::query(sql).bind(id).fetch_all(&mut *self.tx).await.map_err(db_err)?;
        rows.iter().map(map).collect::<sqlx::Result<Vec<_>>>().map_err(db_err)
    }

    async fn delete_by_id(&mut self, table: &str, id: Uuid) -> Result<()> {
        sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_position(&mut self, table: &str, id: Uuid, position: i32) -> Result<()> {
        sqlx::query(&format!("UPDATE {table} SET position = $2 WHERE id = $1"))
            .bind(id)
            .bind(position)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_board(&mut self, id: Uuid) -> Result<Option<Board>> {
        let sql = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1 FOR UPDATE");
        self.fetch_one_opt(&sql, id, board_from_row).await
    }

    // User Operations

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.fetch_one_opt(&sql, id, user_from_row).await
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn insert_user(&mut self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, firstname, lastname, password_hash, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    // Board Operations

    async fn find_board(&mut self, id: Uuid) -> Result<Option<Board>> {
        let sql = format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1");
        self.fetch_one_opt(&sql, id, board_from_row).await
    }

    async fn boards_of_user(&mut self, user_id: Uuid, archived: bool) -> Result<Vec<Board>> {
        let sql = format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE user_id = $1 AND (archived_at IS NOT NULL) = $2 ORDER BY created_at, id"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(archived)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        rows.iter().map(board_from_row).collect::<sqlx::Result<Vec<_>>>().map_err(db_err)
    }

    async fn count_boards_with_background(&mut self, background_id: Uuid) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM boards WHERE background_id = $1")
            .bind(background_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn insert_board(&mut self, board: &Board) -> Result<()> {
        sqlx::query(
            "INSERT INTO boards (id, user_id, title, background_id, created_at, updated_at, archived_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(board.id)
        .bind(board.user_id)
        .bind(&board.title)
        .bind(board.background_id)
        .bind(board.created_at)
        .bind(board.updated_at)
        .bind(board.archived_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_board(&mut self, board: &Board) -> Result<()> {
        sqlx::query("UPDATE boards SET title = $2, background_id = $3, updated_at = $4, archived_at = $5 WHERE id = $1")
            .bind(board.id)
            .bind(&board.title)
            .bind(board.background_id)
            .bind(board.updated_at)
            .bind(board.archived_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_board(&mut self, id: Uuid) -> Result<()> {
        self.delete_by_id("boards", id).await
    }

    // List Operations

    async fn find_list(&mut self, id: Uuid) -> Result<Option<List>> {
        let sql = format!("SELECT {LIST_COLUMNS} FROM lists WHERE id = $1");
        self.fetch_one_opt(&sql, id, list_from_row).await
    }

    async fn lists_of_board(&mut self, board_id: Uuid) -> Result<Vec<List>> {
        let sql = format!("SELECT {LIST_COLUMNS} FROM lists WHERE board_id = $1 ORDER BY position, created_at");
        self.fetch_all_by(&sql, board_id, list_from_row).await
    }

    async fn insert_list(&mut self, list: &List) -> Result<()> {
        sqlx::query(
            "INSERT INTO lists (id, board_id, title, position, created_at, updated_at, archived_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(list.id)
        .bind(list.board_id)
        .bind(&list.title)
        .bind(list.position)
        .bind(list.created_at)
        .bind(list.updated_at)
        .bind(list.archived_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_list(&mut self, list: &List) -> Result<()> {
        sqlx::query("UPDATE lists SET title = $2, position = $3, updated_at = $4, archived_at = $5 WHERE id = $1")
            .bind(list.id)
            .bind(&list.title)
            .bind(list.position)
            .bind(list.updated_at)
            .bind(list.archived_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_list_position(&mut self, id: Uuid, position: i32) -> Result<()> {
        self.set_position("lists", id, position).await
    }

    async fn delete_list(&mut self, id: Uuid) -> Result<()> {
        self.delete_by_id("lists", id).await
    }

    // Card Operations

    async fn find_card(&mut self, id: Uuid) -> Result<Option<Card>> {
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = $1");
        self.fetch_one_opt(&sql, id, card_from_row).await
    }

    async fn cards_of_list(&mut self, list_id: Uuid) -> Result<Vec<Card>> {
        let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE list_id = $1 ORDER BY position, created_at");
        self.fetch_all_by(&sql, list_id, card_from_row).await
    }

    async fn insert_card(&mut self, card: &Card) -> Result<()> {
        sqlx::query(
            "INSERT INTO cards (id, list_id, title, description, position, created_at, updated_at, archived_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(card.id)
        .bind(card.list_id)
        .bind(&card.title)
        .bind(&card.description)
        .bind(card.position)
        .bind(card.created_at)
        .bind(card.updated_at)
        .bind(card.archived_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_card(&mut self, card: &Card) -> Result<()> {
        sqlx::query(
            "UPDATE cards SET title = $2, description = $3, position = $4, updated_at = $5, archived_at = $6 WHERE id = $1",
        )
        .bind(card.id)
        .bind(&card.title)
        .bind(&card.description)
        .bind(card.position)
        .bind(card.updated_at)
        .bind(card.archived_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn set_card_position(&mut self, id: Uuid, position: i32) -> Result<()> {
        self.set_position("cards", id, position).await
    }

    async fn delete_card(&mut self, id: Uuid) -> Result<()> {
        self.delete_by_id("cards", id).await
    }

    // Comment Operations

    async fn find_comment(&mut self, id: Uuid) -> Result<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        self.fetch_one_opt(&sql, id, comment_from_row).await
    }

    async fn comments_of_card(&mut self, card_id: Uuid) -> Result<Vec<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE card_id = $1 ORDER BY created_at DESC, id");
        self.fetch_all_by(&sql, card_id, comment_from_row).await
    }

    async fn insert_comment(&mut self, comment: &Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, card_id, user_id, content, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(comment.id)
        .bind(comment.card_id)
        .bind(comment.user_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_comment(&mut self, comment: &Comment) -> Result<()> {
        sqlx::query("UPDATE comments SET content = $2, updated_at = $3 WHERE id = $1")
            .bind(comment.id)
            .bind(&comment.content)
            .bind(comment.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_comment(&mut self, id: Uuid) -> Result<()> {
        self.delete_by_id("comments", id).await
    }

    // Checklist Operations

    async fn find_checklist(&mut self, id: Uuid) -> Result<Option<Checklist>> {
        let sql = format!("SELECT {CHECKLIST_COLUMNS} FROM checklists WHERE id = $1");
        self.fetch_one_opt(&sql, id, checklist_from_row).await
    }

    async fn checklists_of_card(&mut self, card_id: Uuid) -> Result<Vec<Checklist>> {
        let sql = format!("SELECT {CHECKLIST_COLUMNS} FROM checklists WHERE card_id = $1 ORDER BY title, created_at");
        self.fetch_all_by(&sql, card_id, checklist_from_row).await
    }

    async fn insert_checklist(&mut self, checklist: &Checklist) -> Result<()> {
        sqlx::query("INSERT INTO checklists (id, card_id, title, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(checklist.id)
            .bind(checklist.card_id)
            .bind(&checklist.title)
            .bind(checklist.created_at)
            .bind(checklist.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn update_checklist(&mut self, checklist: &Checklist) -> Result<()> {
        sqlx::query("UPDATE checklists SET title = $2, updated_at = $3 WHERE id = $1")
            .bind(checklist.id)
            .bind(&checklist.title)
            .bind(checklist.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_checklist(&mut self, id: Uuid) -> Result<()> {
        self.delete_by_id("checklists", id).await
    }

    async fn find_checklist_item(&mut self, id: Uuid) -> Result<Option<ChecklistItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM checklistitems WHERE id = $1");
        self.fetch_one_opt(&sql, id, item_from_row).await
    }

    async fn items_of_checklist(&mut self, checklist_id: Uuid) -> Result<Vec<ChecklistItem>> {
        let sql =
            format!("SELECT {ITEM_COLUMNS} FROM checklistitems WHERE checklist_id = $1 ORDER BY position, created_at");
        self.fetch_all_by(&sql, checklist_id, item_from_row).await
    }

    async fn insert_checklist_item(&mut self, item: &ChecklistItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO checklistitems (id, checklist_id, title, position, checked, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(item.id)
        .bind(item.checklist_id)
        .bind(&item.title)
        .bind(item.position)
        .bind(item.checked)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_checklist_item(&mut self, item: &ChecklistItem) -> Result<()> {
        sqlx::query("UPDATE checklistitems SET title = $2, checked = $3, updated_at = $4 WHERE id = $1")
            .bind(item.id)
            .bind(&item.title)
            .bind(item.checked)
            .bind(item.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn set_checklist_item_position(&mut self, id: Uuid, position: i32) -> Result<()> {
        self.set_position("checklistitems", id, position).await
    }

    async fn delete_checklist_item(&mut self, id: Uuid) -> Result<()> {
        self.delete_by_id("checklistitems", id).await
    }

    // Background Operations

    async fn find_background(&mut self, id: Uuid) -> Result<Option<Background>> {
        let sql = format!("SELECT {BACKGROUND_COLUMNS} FROM backgrounds WHERE id = $1");
        self.fetch_one_opt(&sql, id, background_from_row).await
    }

    async fn backgrounds_of_user(&mut self, user_id: Uuid) -> Result<Vec<Background>> {
        let sql = format!("SELECT {BACKGROUND_COLUMNS} FROM backgrounds WHERE user_id = $1 ORDER BY created_at, id");
        self.fetch_all_by(&sql, user_id, background_from_row).await
    }

    async fn insert_background(&mut self, background: &Background) -> Result<()> {
        sqlx::query("INSERT INTO backgrounds (id, user_id, data, color, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(background.id)
            .bind(background.user_id)
            .bind(&background.data)
            .bind(&background.color)
            .bind(background.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_background(&mut self, id: Uuid) -> Result<()> {
        self.delete_by_id("backgrounds", id).await
    }

    // Log Operations

    async fn insert_log(&mut self, entry: &LogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO logs (id, user_id, board_id, action, action_target_id, changes, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.board_id)
        .bind(entry.action.to_string())
        .bind(entry.action_target_id)
        .bind(&entry.changes)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn logs_of_board(&mut self, user_id: Uuid, board_id: Uuid) -> Result<Vec<LogEntry>> {
        let sql =
            format!("SELECT {LOG_COLUMNS} FROM logs WHERE user_id = $1 AND board_id = $2 ORDER BY created_at DESC, id");
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(board_id)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(db_err)?;
        rows.iter().map(log_from_row).collect::<sqlx::Result<Vec<_>>>().map_err(db_err)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(db_err)
    }
}
