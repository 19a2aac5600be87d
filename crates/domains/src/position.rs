//! # PositionedCollection
//!
//! Keeps the active children of a parent (lists of a board, cards of a list,
//! items of a checklist) on the dense sequence `1..=N`.
//!
//! Everything here works on [`Slot`]s, the `(id, position)` projection of a
//! sibling, and returns [`Assignment`]s the caller writes back inside the
//! same unit of work that loaded the siblings.

use std::collections::HashSet;

use uuid::Uuid;

use crate::audit::EntityKind;
use crate::error::{AppError, Result};

/// One sibling as far as ordering is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: Uuid,
    pub position: i32,
}

impl Slot {
    pub fn new(id: Uuid, position: i32) -> Self {
        Self { id, position }
    }
}

/// A position write: `id` moves from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub id: Uuid,
    pub from: i32,
    pub to: i32,
}

impl Assignment {
    pub fn is_move(&self) -> bool {
        self.from != self.to
    }
}

/// How the target of an update moved between the active and archived sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// No state change: active siblings keep their relative order.
    Stay,
    /// Leaves the dense sequence.
    Leave,
    /// Re-enters the dense sequence at the end.
    Append,
}

/// Position for a new child given the active siblings loaded in the same unit of work.
pub fn next_position(active_siblings: usize) -> i32 {
    i32::try_from(active_siblings).map_or(i32::MAX, |n| n.saturating_add(1))
}

/// Sorts siblings into display order: stored position, then id for stability.
pub fn sort_slots(slots: &mut [Slot]) {
    slots.sort_by_key(|s| (s.position, s.id));
}

/// Assigns `index + 1` to each sibling, in the given order, and returns only
/// the siblings whose stored position differs.
pub fn renumber(siblings_in_display_order: &[Slot]) -> Vec<Assignment> {
    siblings_in_display_order
        .iter()
        .zip(1..)
        .map(|(slot, to)| Assignment { id: slot.id, from: slot.position, to })
        .filter(Assignment::is_move)
        .collect()
}

/// Renumbers `active` after `target` changed state.
///
/// `active` is the stored active set of the parent: it contains the target
/// unless the target was archived before this update. The returned
/// assignments cover every sibling that moves, the target included when it is
/// appended.
pub fn settle(active: &[Slot], target: Slot, placement: Placement) -> Vec<Assignment> {
    let mut order: Vec<Slot> = active.to_vec();
    sort_slots(&mut order);
    match placement {
        Placement::Stay => {}
        Placement::Leave => order.retain(|s| s.id != target.id),
        Placement::Append => {
            order.retain(|s| s.id != target.id);
            order.push(target);
        }
    }
    renumber(&order)
}

/// Splits the `idsordered` wire format into ids.
///
/// Empty segments are ignored; an empty payload or an unparseable id is a
/// validation failure.
pub fn parse_id_list(csv: &str) -> Result<Vec<Uuid>> {
    let ids = csv
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| AppError::ValidationError(format!("invalid id {s:?} in idsordered")))
        })
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        return Err(AppError::ValidationError("idsordered is required".into()));
    }
    Ok(ids)
}

/// Applies a caller-supplied total order to the active children of a parent.
///
/// Every id must be an active sibling and appear once. Active siblings missing
/// from `ids` keep their relative order and follow the explicit ones, so the
/// result is always dense. The returned assignments cover the whole sequence,
/// in the new order; callers write the ones that [`Assignment::is_move`].
pub fn apply_explicit_order(
    ids: &[Uuid],
    active: &[Slot],
    child: EntityKind,
    parent: EntityKind,
    parent_id: Uuid,
) -> Result<Vec<Assignment>> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut order = Vec::with_capacity(active.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(AppError::ValidationError(format!("{child} {id} appears twice in idsordered")));
        }
        let slot = active
            .iter()
            .find(|s| s.id == *id)
            .ok_or(AppError::UnknownSibling { child, id: *id, parent, parent_id })?;
        order.push(*slot);
    }

    let mut omitted: Vec<Slot> = active.iter().filter(|s| !seen.contains(&s.id)).copied().collect();
    sort_slots(&mut omitted);
    order.extend(omitted);

    Ok(order
        .iter()
        .zip(1..)
        .map(|(slot, to)| Assignment { id: slot.id, from: slot.position, to })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn dense(ids: &[Uuid]) -> Vec<Slot> {
        ids.iter().zip(1..).map(|(id, p)| Slot::new(*id, p)).collect()
    }

    fn apply(slots: &[Slot], assignments: &[Assignment]) -> Vec<(Uuid, i32)> {
        let mut out: Vec<(Uuid, i32)> = slots
            .iter()
            .map(|s| {
                let to = assignments.iter().find(|a| a.id == s.id).map_or(s.position, |a| a.to);
                (s.id, to)
            })
            .collect();
        out.sort_by_key(|(_, p)| *p);
        out
    }

    #[test]
    fn next_position_follows_active_count() {
        assert_eq!(next_position(0), 1);
        assert_eq!(next_position(3), 4);
    }

    #[test]
    fn renumber_skips_siblings_already_in_place() {
        let id = ids(3);
        let slots = vec![Slot::new(id[0], 1), Slot::new(id[1], 3), Slot::new(id[2], 4)];
        let moves = renumber(&slots);
        assert_eq!(
            moves,
            vec![
                Assignment { id: id[1], from: 3, to: 2 },
                Assignment { id: id[2], from: 4, to: 3 },
            ]
        );
    }

    #[test]
    fn leaving_the_middle_closes_the_gap() {
        let id = ids(3);
        let slots = dense(&id);
        let moves = settle(&slots, slots[1], Placement::Leave);
        assert_eq!(moves, vec![Assignment { id: id[2], from: 3, to: 2 }]);
    }

    #[test]
    fn appended_target_lands_last() {
        let id = ids(3);
        let survivors = vec![Slot::new(id[0], 1), Slot::new(id[2], 2)];
        let restored = Slot::new(id[1], 2);
        let moves = settle(&survivors, restored, Placement::Append);
        assert_eq!(moves, vec![Assignment { id: id[1], from: 2, to: 3 }]);
    }

    #[test]
    fn staying_target_keeps_relative_place() {
        let id = ids(3);
        let slots = dense(&id);
        assert!(settle(&slots, slots[0], Placement::Stay).is_empty());
    }

    #[test]
    fn archived_target_that_stays_archived_is_not_placed() {
        let id = ids(3);
        let active = vec![Slot::new(id[0], 1), Slot::new(id[1], 2)];
        let archived = Slot::new(id[2], 2);
        assert!(settle(&active, archived, Placement::Stay).is_empty());
    }

    #[test]
    fn explicit_order_is_exact() {
        let id = ids(3);
        let slots = dense(&id);
        let parent = Uuid::new_v4();
        let out = apply_explicit_order(&[id[2], id[0], id[1]], &slots, EntityKind::Card, EntityKind::List, parent)
            .unwrap();
        assert_eq!(apply(&slots, &out), vec![(id[2], 1), (id[0], 2), (id[1], 3)]);
    }

    #[test]
    fn omitted_siblings_are_appended_in_previous_order() {
        let id = ids(4);
        let slots = dense(&id);
        let out = apply_explicit_order(&[id[3]], &slots, EntityKind::List, EntityKind::Board, Uuid::new_v4()).unwrap();
        assert_eq!(apply(&slots, &out), vec![(id[3], 1), (id[0], 2), (id[1], 3), (id[2], 4)]);
    }

    #[test]
    fn duplicates_are_rejected() {
        let id = ids(2);
        let err = apply_explicit_order(&[id[0], id[0]], &dense(&id), EntityKind::Card, EntityKind::List, Uuid::nil())
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn foreign_ids_are_unknown_siblings() {
        let id = ids(2);
        let stranger = Uuid::new_v4();
        let err = apply_explicit_order(&[stranger], &dense(&id), EntityKind::Card, EntityKind::List, Uuid::nil())
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownSibling { id, .. } if id == stranger));
    }

    #[test]
    fn id_list_parsing() {
        let id = ids(2);
        let csv = format!("{}, {},", id[0], id[1]);
        assert_eq!(parse_id_list(&csv).unwrap(), id);
        assert!(matches!(parse_id_list(""), Err(AppError::ValidationError(_))));
        assert!(matches!(parse_id_list(" , "), Err(AppError::ValidationError(_))));
        assert!(matches!(parse_id_list("nope"), Err(AppError::ValidationError(_))));
    }
}
