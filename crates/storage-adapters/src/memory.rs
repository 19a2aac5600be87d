//! # InMemoryStore
//!
//! A [`KanbanStore`] backed by process memory. A unit of work holds the store
//! lock for its whole lifetime and mutates a private copy of the tables, so
//! transactions are serialized and a dropped unit of work leaves no trace.
//! Foreign keys are checked the same way the Postgres schema checks them
//! (no cascades).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::{Background, Board, Card, Checklist, ChecklistItem, Comment, List, User};
use domains::traits::{KanbanStore, UnitOfWork};
use domains::{EntityKind, LogEntry};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    boards: HashMap<Uuid, Board>,
    lists: HashMap<Uuid, List>,
    cards: HashMap<Uuid, Card>,
    comments: HashMap<Uuid, Comment>,
    checklists: HashMap<Uuid, Checklist>,
    checklist_items: HashMap<Uuid, ChecklistItem>,
    backgrounds: HashMap<Uuid, Background>,
    /// Insertion order.
    logs: Vec<LogEntry>,
}

/// Number of rows per table, for assertions on cascades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub users: usize,
    pub boards: usize,
    pub lists: usize,
    pub cards: usize,
    pub comments: usize,
    pub checklists: usize,
    pub checklist_items: usize,
    pub backgrounds: usize,
    pub logs: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_log_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `insert_log` fail until switched off again.
    pub fn inject_log_failure(&self, fail: bool) {
        self.fail_log_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn row_counts(&self) -> RowCounts {
        let t = self.tables.lock().await;
        RowCounts {
            users: t.users.len(),
            boards: t.boards.len(),
            lists: t.lists.len(),
            cards: t.cards.len(),
            comments: t.comments.len(),
            checklists: t.checklists.len(),
            checklist_items: t.checklist_items.len(),
            backgrounds: t.backgrounds.len(),
            logs: t.logs.len(),
        }
    }

    /// Every committed log entry, oldest first.
    pub async fn all_logs(&self) -> Vec<LogEntry> {
        self.tables.lock().await.logs.clone()
    }
}

#[async_trait]
impl KanbanStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            work,
            fail_log_writes: Arc::clone(&self.fail_log_writes),
        }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    fail_log_writes: Arc<AtomicBool>,
}

fn violation(table: &str, detail: impl std::fmt::Display) -> AppError {
    AppError::internal(format!("foreign key violation on {table}: {detail}"))
}

fn ensure_absent<T>(map: &HashMap<Uuid, T>, id: Uuid, table: &str) -> Result<()> {
    if map.contains_key(&id) {
        return Err(AppError::internal(format!("duplicate key {id} in {table}")));
    }
    Ok(())
}

fn replace<T: Clone>(map: &mut HashMap<Uuid, T>, id: Uuid, row: &T, kind: EntityKind) -> Result<()> {
    match map.get_mut(&id) {
        Some(slot) => {
            *slot = row.clone();
            Ok(())
        }
        None => Err(AppError::not_found(kind, id)),
    }
}

fn sorted<T: Clone>(rows: impl Iterator<Item = T>, mut cmp: impl FnMut(&T, &T) -> std::cmp::Ordering) -> Vec<T> {
    let mut out: Vec<T> = rows.collect();
    out.sort_by(&mut cmp);
    out
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_board(&mut self, id: Uuid) -> Result<Option<Board>> {
        // The whole store is already held by this unit of work.
        Ok(self.work.boards.get(&id).cloned())
    }

    // --- users ---

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>> {
        Ok(self.work.users.get(&id).cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        Ok(self.work.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&mut self, user: &User) -> Result<()> {
        ensure_absent(&self.work.users, user.id, "users")?;
        if self.work.users.values().any(|u| u.email == user.email) {
            return Err(AppError::internal(format!("duplicate email {} in users", user.email)));
        }
        self.work.users.insert(user.id, user.clone());
        Ok(())
    }

    // --- boards ---

    async fn find_board(&mut self, id: Uuid) -> Result<Option<Board>> {
        Ok(self.work.boards.get(&id).cloned())
    }

    async fn boards_of_user(&mut self, user_id: Uuid, archived: bool) -> Result<Vec<Board>> {
        Ok(sorted(
            self.work
                .boards
                .values()
                .filter(|b| b.user_id == user_id && b.archived_at.is_some() == archived)
                .cloned(),
            |a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
        ))
    }

    async fn count_boards_with_background(&mut self, background_id: Uuid) -> Result<u64> {
        Ok(self.work.boards.values().filter(|b| b.background_id == Some(background_id)).count() as u64)
    }

    async fn insert_board(&mut self, board: &Board) -> Result<()> {
        ensure_absent(&self.work.boards, board.id, "boards")?;
        if !self.work.users.contains_key(&board.user_id) {
            return Err(violation("boards", format!("user {} does not exist", board.user_id)));
        }
        if let Some(bg) = board.background_id {
            if !self.work.backgrounds.contains_key(&bg) {
                return Err(violation("boards", format!("background {bg} does not exist")));
            }
        }
        self.work.boards.insert(board.id, board.clone());
        Ok(())
    }

    async fn update_board(&mut self, board: &Board) -> Result<()> {
        if let Some(bg) = board.background_id {
            if !self.work.backgrounds.contains_key(&bg) {
                return Err(violation("boards", format!("background {bg} does not exist")));
            }
        }
        replace(&mut self.work.boards, board.id, board, EntityKind::Board)
    }

    async fn delete_board(&mut self, id: Uuid) -> Result<()> {
        if self.work.lists.values().any(|l| l.board_id == id) {
            return Err(violation("lists", format!("board {id} still has lists")));
        }
        self.work.boards.remove(&id);
        Ok(())
    }

    // --- lists ---

    async fn find_list(&mut self, id: Uuid) -> Result<Option<List>> {
        Ok(self.work.lists.get(&id).cloned())
    }

    async fn lists_of_board(&mut self, board_id: Uuid) -> Result<Vec<List>> {
        Ok(sorted(
            self.work.lists.values().filter(|l| l.board_id == board_id).cloned(),
            |a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)),
        ))
    }

    async fn insert_list(&mut self, list: &List) -> Result<()> {
        ensure_absent(&self.work.lists, list.id, "lists")?;
        if !self.work.boards.contains_key(&list.board_id) {
            return Err(violation("lists", format!("board {} does not exist", list.board_id)));
        }
        self.work.lists.insert(list.id, list.clone());
        Ok(())
    }

    async fn update_list(&mut self, list: &List) -> Result<()> {
        replace(&mut self.work.lists, list.id, list, EntityKind::List)
    }

    async fn set_list_position(&mut self, id: Uuid, position: i32) -> Result<()> {
        let list = self.work.lists.get_mut(&id).ok_or_else(|| AppError::not_found(EntityKind::List, id))?;
        list.position = position;
        Ok(())
    }

    async fn delete_list(&mut self, id: Uuid) -> Result<()> {
        if self.work.cards.values().any(|c| c.list_id == id) {
            return Err(violation("cards", format!("list {id} still has cards")));
        }
        self.work.lists.remove(&id);
        Ok(())
    }

    // --- cards ---

    async fn find_card(&mut self, id: Uuid) -> Result<Option<Card>> {
        Ok(self.work.cards.get(&id).cloned())
    }

    async fn cards_of_list(&mut self, list_id: Uuid) -> Result<Vec<Card>> {
        Ok(sorted(
            self.work.cards.values().filter(|c| c.list_id == list_id).cloned(),
            |a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)),
        ))
    }

    async fn insert_card(&mut self, card: &Card) -> Result<()> {
        ensure_absent(&self.work.cards, card.id, "cards")?;
        if !self.work.lists.contains_key(&card.list_id) {
            return Err(violation("cards", format!("list {} does not exist", card.list_id)));
        }
        self.work.cards.insert(card.id, card.clone());
        Ok(())
    }

    async fn update_card(&mut self, card: &Card) -> Result<()> {
        replace(&mut self.work.cards, card.id, card, EntityKind::Card)
    }

    async fn set_card_position(&mut self, id: Uuid, position: i32) -> Result<()> {
        let card = self.work.cards.get_mut(&id).ok_or_else(|| AppError::not_found(EntityKind::Card, id))?;
        card.position = position;
        Ok(())
    }

    async fn delete_card(&mut self, id: Uuid) -> Result<()> {
        if self.work.comments.values().any(|c| c.card_id == id) {
            return Err(violation("comments", format!("card {id} still has comments")));
        }
        if self.work.checklists.values().any(|c| c.card_id == id) {
            return Err(violation("checklists", format!("card {id} still has checklists")));
        }
        self.work.cards.remove(&id);
        Ok(())
    }

    // --- comments ---

    async fn find_comment(&mut self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.work.comments.get(&id).cloned())
    }

    async fn comments_of_card(&mut self, card_id: Uuid) -> Result<Vec<Comment>> {
        Ok(sorted(
            self.work.comments.values().filter(|c| c.card_id == card_id).cloned(),
            |a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)),
        ))
    }

    async fn insert_comment(&mut self, comment: &Comment) -> Result<()> {
        ensure_absent(&self.work.comments, comment.id, "comments")?;
        if !self.work.cards.contains_key(&comment.card_id) {
            return Err(violation("comments", format!("card {} does not exist", comment.card_id)));
        }
        self.work.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    async fn update_comment(&mut self, comment: &Comment) -> Result<()> {
        replace(&mut self.work.comments, comment.id, comment, EntityKind::Comment)
    }

    async fn delete_comment(&mut self, id: Uuid) -> Result<()> {
        self.work.comments.remove(&id);
        Ok(())
    }

    // --- checklists ---

    async fn find_checklist(&mut self, id: Uuid) -> Result<Option<Checklist>> {
        Ok(self.work.checklists.get(&id).cloned())
    }

    async fn checklists_of_card(&mut self, card_id: Uuid) -> Result<Vec<Checklist>> {
        Ok(sorted(
            self.work.checklists.values().filter(|c| c.card_id == card_id).cloned(),
            |a, b| a.title.cmp(&b.title).then(a.created_at.cmp(&b.created_at)),
        ))
    }

    async fn insert_checklist(&mut self, checklist: &Checklist) -> Result<()> {
        ensure_absent(&self.work.checklists, checklist.id, "checklists")?;
        if !self.work.cards.contains_key(&checklist.card_id) {
            return Err(violation("checklists", format!("card {} does not exist", checklist.card_id)));
        }
        self.work.checklists.insert(checklist.id, checklist.clone());
        Ok(())
    }

    async fn update_checklist(&mut self, checklist: &Checklist) -> Result<()> {
        replace(&mut self.work.checklists, checklist.id, checklist, EntityKind::Checklist)
    }

    async fn delete_checklist(&mut self, id: Uuid) -> Result<()> {
        if self.work.checklist_items.values().any(|i| i.checklist_id == id) {
            return Err(violation("checklistitems", format!("checklist {id} still has items")));
        }
        self.work.checklists.remove(&id);
        Ok(())
    }

    async fn find_checklist_item(&mut self, id: Uuid) -> Result<Option<ChecklistItem>> {
        Ok(self.work.checklist_items.get(&id).cloned())
    }

    async fn items_of_checklist(&mut self, checklist_id: Uuid) -> Result<Vec<ChecklistItem>> {
        Ok(sorted(
            self.work.checklist_items.values().filter(|i| i.checklist_id == checklist_id).cloned(),
            |a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)),
        ))
    }

    async fn insert_checklist_item(&mut self, item: &ChecklistItem) -> Result<()> {
        ensure_absent(&self.work.checklist_items, item.id, "checklistitems")?;
        if !self.work.checklists.contains_key(&item.checklist_id) {
            return Err(violation("checklistitems", format!("checklist {} does not exist", item.checklist_id)));
        }
        self.work.checklist_items.insert(item.id, item.clone());
        Ok(())
    }

    async fn update_checklist_item(&mut self, item: &ChecklistItem) -> Result<()> {
        replace(&mut self.work.checklist_items, item.id, item, EntityKind::ChecklistItem)
    }

    async fn set_checklist_item_position(&mut self, id: Uuid, position: i32) -> Result<()> {
        let item = self
            .work
            .checklist_items
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(EntityKind::ChecklistItem, id))?;
        item.position = position;
        Ok(())
    }

    async fn delete_checklist_item(&mut self, id: Uuid) -> Result<()> {
        self.work.checklist_items.remove(&id);
        Ok(())
    }

    // --- backgrounds ---

    async fn find_background(&mut self, id: Uuid) -> Result<Option<Background>> {
        Ok(self.work.backgrounds.get(&id).cloned())
    }

    async fn backgrounds_of_user(&mut self, user_id: Uuid) -> Result<Vec<Background>> {
        Ok(sorted(
            self.work.backgrounds.values().filter(|b| b.user_id == user_id).cloned(),
            |a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
        ))
    }

    async fn insert_background(&mut self, background: &Background) -> Result<()> {
        ensure_absent(&self.work.backgrounds, background.id, "backgrounds")?;
        self.work.backgrounds.insert(background.id, background.clone());
        Ok(())
    }

    async fn delete_background(&mut self, id: Uuid) -> Result<()> {
        if self.work.boards.values().any(|b| b.background_id == Some(id)) {
            return Err(violation("boards", format!("background {id} is still referenced")));
        }
        self.work.backgrounds.remove(&id);
        Ok(())
    }

    // --- logs ---

    async fn insert_log(&mut self, entry: &LogEntry) -> Result<()> {
        if self.fail_log_writes.load(Ordering::SeqCst) {
            return Err(AppError::internal("log write rejected"));
        }
        if !self.work.users.contains_key(&entry.user_id) {
            return Err(violation("logs", format!("user {} does not exist", entry.user_id)));
        }
        self.work.logs.push(entry.clone());
        Ok(())
    }

    async fn logs_of_board(&mut self, user_id: Uuid, board_id: Uuid) -> Result<Vec<LogEntry>> {
        Ok(self
            .work
            .logs
            .iter()
            .rev()
            .filter(|l| l.user_id == user_id && l.board_id == Some(board_id))
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryUnitOfWork { mut guard, work, .. } = *self;
        *guard = work;
        Ok(())
    }
}
