//! Operations over a board's entity graph inside one unit of work: nested
//! read views, bottom-up cascading deletes, and position write-back.

use uuid::Uuid;

use domains::color::BoardTheme;
use domains::error::Result;
use domains::models::{Board, BoardView, Card, CardView, ChecklistView, List, ListView};
use domains::position::{renumber, Assignment, Slot};
use domains::traits::UnitOfWork;

// --- Views ---

pub(crate) async fn checklists_view(uow: &mut dyn UnitOfWork, card_id: Uuid) -> Result<Vec<ChecklistView>> {
    let mut views = Vec::new();
    for checklist in uow.checklists_of_card(card_id).await? {
        let items = uow.items_of_checklist(checklist.id).await?;
        views.push(ChecklistView { checklist, items });
    }
    Ok(views)
}

pub(crate) async fn card_view(uow: &mut dyn UnitOfWork, card: Card) -> Result<CardView> {
    let comments = uow.comments_of_card(card.id).await?;
    let checklists = checklists_view(uow, card.id).await?;
    Ok(CardView { card, comments, checklists })
}

pub(crate) async fn list_view(uow: &mut dyn UnitOfWork, list: List) -> Result<ListView> {
    let mut cards = Vec::new();
    for card in uow.cards_of_list(list.id).await? {
        if card.is_active() {
            cards.push(card_view(uow, card).await?);
        }
    }
    Ok(ListView { list, cards })
}

/// The board with its background, derived theme, and active lists and cards.
pub(crate) async fn board_view(uow: &mut dyn UnitOfWork, board: Board) -> Result<BoardView> {
    let background = match board.background_id {
        Some(id) => uow.find_background(id).await?,
        None => None,
    };
    let theme = background.as_ref().map(|bg| BoardTheme::derive(&bg.color)).transpose()?;

    let mut lists = Vec::new();
    for list in uow.lists_of_board(board.id).await? {
        if list.is_active() {
            lists.push(list_view(uow, list).await?);
        }
    }
    Ok(BoardView { board, background, theme, lists })
}

// --- Cascades (children first) ---

pub(crate) async fn delete_checklist_tree(uow: &mut dyn UnitOfWork, checklist_id: Uuid) -> Result<()> {
    for item in uow.items_of_checklist(checklist_id).await? {
        uow.delete_checklist_item(item.id).await?;
    }
    uow.delete_checklist(checklist_id).await
}

pub(crate) async fn delete_card_tree(uow: &mut dyn UnitOfWork, card_id: Uuid) -> Result<()> {
    for comment in uow.comments_of_card(card_id).await? {
        uow.delete_comment(comment.id).await?;
    }
    for checklist in uow.checklists_of_card(card_id).await? {
        delete_checklist_tree(uow, checklist.id).await?;
    }
    uow.delete_card(card_id).await
}

/// Deletes the list and every card it holds, archived ones included.
pub(crate) async fn delete_list_tree(uow: &mut dyn UnitOfWork, list_id: Uuid) -> Result<()> {
    for card in uow.cards_of_list(list_id).await? {
        delete_card_tree(uow, card.id).await?;
    }
    uow.delete_list(list_id).await
}

// --- Positions ---

pub(crate) async fn active_list_slots(uow: &mut dyn UnitOfWork, board_id: Uuid) -> Result<Vec<Slot>> {
    let lists = uow.lists_of_board(board_id).await?;
    Ok(lists.iter().filter(|l| l.is_active()).map(List::slot).collect())
}

pub(crate) async fn active_card_slots(uow: &mut dyn UnitOfWork, list_id: Uuid) -> Result<Vec<Slot>> {
    let cards = uow.cards_of_list(list_id).await?;
    Ok(cards.iter().filter(|c| c.is_active()).map(Card::slot).collect())
}

pub(crate) async fn item_slots(uow: &mut dyn UnitOfWork, checklist_id: Uuid) -> Result<Vec<Slot>> {
    let items = uow.items_of_checklist(checklist_id).await?;
    Ok(items.iter().map(|i| i.slot()).collect())
}

/// Closes any gap left in the board's active lists.
pub(crate) async fn compact_lists(uow: &mut dyn UnitOfWork, board_id: Uuid) -> Result<()> {
    let active = active_list_slots(uow, board_id).await?;
    write_list_positions(uow, &renumber(&active)).await
}

/// Closes any gap left in the list's active cards.
pub(crate) async fn compact_cards(uow: &mut dyn UnitOfWork, list_id: Uuid) -> Result<()> {
    let active = active_card_slots(uow, list_id).await?;
    write_card_positions(uow, &renumber(&active)).await
}

pub(crate) async fn write_list_positions(uow: &mut dyn UnitOfWork, assignments: &[Assignment]) -> Result<()> {
    for a in assignments.iter().filter(|a| a.is_move()) {
        uow.set_list_position(a.id, a.to).await?;
    }
    Ok(())
}

pub(crate) async fn write_card_positions(uow: &mut dyn UnitOfWork, assignments: &[Assignment]) -> Result<()> {
    for a in assignments.iter().filter(|a| a.is_move()) {
        uow.set_card_position(a.id, a.to).await?;
    }
    Ok(())
}

pub(crate) async fn write_item_positions(uow: &mut dyn UnitOfWork, assignments: &[Assignment]) -> Result<()> {
    for a in assignments.iter().filter(|a| a.is_move()) {
        uow.set_checklist_item_position(a.id, a.to).await?;
    }
    Ok(())
}

/// The new position of `id`, if the assignments move it.
pub(crate) fn moved_to(assignments: &[Assignment], id: Uuid) -> Option<i32> {
    assignments.iter().find(|a| a.id == id && a.is_move()).map(|a| a.to)
}
