//! The ordered log of marker events.
//!
//! Each entry is a signed slot number: `+slot` opens the marker in that slot
//! (or stands for a point error), `-slot` closes it. Entries are mostly
//! sorted by lexeme index, with local exceptions introduced by `precede` and
//! `done_before`, which is what [`Production::index_of`] relies on.

use rustc_hash::FxHashSet;

use crate::arena::{MarkerArena, MarkerData, MarkerId};
use crate::attributes::MarkerAttributes;
use crate::violation::Violation;

/// How many trailing entries are scanned before falling back to a binary
/// search.
pub(crate) const LINEAR_SEARCH_LIMIT: usize = 20;

/// A failed validity check, with the slot of the marker that caused it.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CheckFailure {
    pub(crate) violation: Violation,
    pub(crate) culprit: Option<u32>,
}

impl CheckFailure {
    fn new(violation: Violation, culprit: Option<u32>) -> Self {
        Self { violation, culprit }
    }
}

#[derive(Default)]
pub(crate) struct Production {
    entries: Vec<i32>,
    pub(crate) arena: MarkerArena,
    pub(crate) attributes: MarkerAttributes,
}

fn open(id: MarkerId) -> i32 {
    id.slot() as i32
}

fn close(id: MarkerId) -> i32 {
    -(id.slot() as i32)
}

impl Production {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[i32] {
        &self.entries
    }

    #[inline]
    pub(crate) fn entry(&self, index: usize) -> i32 {
        self.entries[index]
    }

    #[inline]
    pub(crate) fn lexeme_at(&self, index: usize) -> u32 {
        self.arena.lexeme(self.entries[index])
    }

    #[inline]
    pub(crate) fn set_lexeme_at(&mut self, index: usize, lexeme: u32) {
        self.arena.set_lexeme(self.entries[index], lexeme);
    }

    pub(crate) fn is_error_entry(&self, entry: i32) -> bool {
        entry > 0 && matches!(self.arena.data_at(entry.unsigned_abs()), MarkerData::Error(_))
    }

    /// Frees a marker slot together with its attributes.
    fn dispose(&mut self, slot: u32) {
        self.arena.free(slot);
        self.attributes.clean(slot);
    }

    /// Allocates a range marker; a reused slot starts without attributes.
    pub(crate) fn alloc_range(&mut self, start: u32) -> MarkerId {
        let id = self.arena.alloc_range(start);
        self.attributes.clean(id.slot());
        id
    }

    pub(crate) fn alloc_error(&mut self, index: u32, message: Box<str>) -> MarkerId {
        let id = self.arena.alloc_error(index, message);
        self.attributes.clean(id.slot());
        id
    }

    pub(crate) fn add_marker(&mut self, id: MarkerId) {
        self.entries.push(open(id));
    }

    /// Appends the close event of `id`, or inserts it right before the
    /// current position of `anchor_before`.
    pub(crate) fn add_done(&mut self, id: MarkerId, anchor_before: Option<MarkerId>) {
        let index = match anchor_before {
            Some(anchor) => self.index_of(anchor),
            None => self.entries.len(),
        };
        self.entries.insert(index, close(id));
    }

    /// Inserts the open event of `id` right before `anchor`.
    pub(crate) fn add_before(&mut self, id: MarkerId, anchor: MarkerId) {
        let index = self.index_of(anchor);
        self.entries.insert(index, open(id));
    }

    /// Position of the open event of `id` (or of the point error itself).
    #[track_caller]
    pub(crate) fn index_of(&self, id: MarkerId) -> usize {
        let lexeme = match self.arena.get(id) {
            MarkerData::Range(marker) => marker.start,
            MarkerData::Error(marker) => marker.index,
        };
        self.find(open(id), lexeme)
            .unwrap_or_else(|| panic!("{id:?} is not part of the production"))
    }

    #[track_caller]
    fn close_index_of(&self, id: MarkerId) -> Option<usize> {
        let end = self.arena.range(id).end?;
        self.find(close(id), end)
    }

    fn find(&self, entry: i32, lexeme: u32) -> Option<usize> {
        let low = self.entries.len().saturating_sub(LINEAR_SEARCH_LIMIT);
        if let Some(offset) = self.entries[low..].iter().rposition(|&it| it == entry) {
            return Some(low + offset);
        }

        let older = &self.entries[..low];
        let group_start = older.partition_point(|&it| self.arena.lexeme(it) < lexeme);
        for (offset, &it) in older[group_start..].iter().enumerate() {
            if it == entry {
                return Some(group_start + offset);
            }
            if self.arena.lexeme(it) > lexeme {
                break;
            }
        }

        // Entries are no longer ordered once edges have been rebound.
        older.iter().rposition(|&it| it == entry)
    }

    /// Removes `id` and everything recorded after it.
    pub(crate) fn rollback_to(&mut self, id: MarkerId) {
        let index = self.index_of(id);
        let removed = self.entries.split_off(index);
        // Freed in reverse so that the next marker reuses the slot of `id`.
        for &entry in removed.iter().rev() {
            if entry > 0 {
                self.dispose(entry.unsigned_abs());
            }
        }
        for &entry in &removed {
            let slot = entry.unsigned_abs();
            if entry < 0 && self.arena.is_live_slot(slot) {
                if let MarkerData::Range(_) = self.arena.data_at(slot) {
                    let id = self.arena.id_of(slot);
                    self.arena.range_mut(id).end = None;
                }
            }
        }
    }

    /// Removes the events of `id` only, keeping its children in place.
    pub(crate) fn drop_marker(&mut self, id: MarkerId) {
        if let Some(index) = self.close_index_of(id) {
            self.entries.remove(index);
        }
        let index = self.index_of(id);
        self.entries.remove(index);
        self.dispose(id.slot());
    }

    /// Pulls the recorded lexeme of the entries before `from` down to
    /// `max_lexeme`, stopping at the first one that is already within bounds.
    pub(crate) fn confine_markers_to_max_lexeme(&mut self, from: usize, max_lexeme: u32) {
        for index in (2..from).rev() {
            if self.lexeme_at(index) >= max_lexeme {
                self.set_lexeme_at(index, max_lexeme);
            } else {
                break;
            }
        }
    }

    pub(crate) fn has_errors_after(&self, id: MarkerId) -> bool {
        let index = self.index_of(id);
        self.entries[index + 1..].iter().any(|&entry| {
            let slot = entry.unsigned_abs();
            if entry > 0 {
                matches!(self.arena.data_at(slot), MarkerData::Error(_))
            } else {
                self.attributes.error_message(slot).is_some()
            }
        })
    }

    /// The marker closed by the last close event.
    pub(crate) fn last_done_marker(&self) -> Option<MarkerId> {
        let entry = self.entries.iter().rev().find(|&&entry| entry < 0)?;
        Some(self.arena.id_of(entry.unsigned_abs()))
    }

    /// Checks that `id` can be closed at the end of the production, or right
    /// before `before`: every marker opened in between must already be
    /// closed in between.
    pub(crate) fn check_done(
        &self,
        id: MarkerId,
        before: Option<MarkerId>,
    ) -> Result<(), CheckFailure> {
        let index = self.index_of(id);
        let end = match before {
            Some(before) => {
                let end = self.index_of(before);
                if index > end {
                    return Err(CheckFailure::new(
                        Violation::BeforePrecedesMarker,
                        Some(before.slot()),
                    ));
                }
                end
            }
            None => self.entries.len(),
        };

        let mut opened = FxHashSet::default();
        for &entry in &self.entries[index + 1..end] {
            let slot = entry.unsigned_abs();
            if entry > 0 {
                if let MarkerData::Range(marker) = self.arena.data_at(slot) {
                    if marker.end.is_none() {
                        return Err(CheckFailure::new(Violation::UnclosedChild, Some(slot)));
                    }
                    opened.insert(slot);
                }
            } else if !opened.remove(&slot) {
                return Err(CheckFailure::new(Violation::CrossingMarkers, Some(slot)));
            }
        }
        match opened.into_iter().next() {
            Some(slot) => Err(CheckFailure::new(Violation::CrossingMarkers, Some(slot))),
            None => Ok(()),
        }
    }

    /// Checks that no open marker was added after `id`.
    pub(crate) fn check_drop(&self, id: MarkerId) -> Result<(), CheckFailure> {
        let index = self.index_of(id);
        let open_child = self.entries[index + 1..].iter().find_map(|&entry| {
            let slot = entry.unsigned_abs();
            match self.arena.data_at(slot) {
                MarkerData::Range(marker) if entry > 0 && marker.end.is_none() => Some(slot),
                _ => None,
            }
        });
        match open_child {
            Some(slot) => Err(CheckFailure::new(Violation::DropWithOpenChildren, Some(slot))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use tessera_syntax::SyntaxKind;

    use super::*;

    const NODE: SyntaxKind = SyntaxKind::new(1);

    fn mark(production: &mut Production, start: u32) -> MarkerId {
        let id = production.arena.alloc_range(start);
        production.add_marker(id);
        id
    }

    fn done(production: &mut Production, id: MarkerId, end: u32) {
        let marker = production.arena.range_mut(id);
        marker.end = Some(end);
        marker.kind = NODE;
        production.add_done(id, None);
    }

    #[test]
    fn index_of_uses_binary_search_for_old_entries() {
        let mut production = Production::default();
        let root = mark(&mut production, 0);
        let mut first = None;
        for lexeme in 0..100 {
            let id = mark(&mut production, lexeme);
            done(&mut production, id, lexeme + 1);
            first.get_or_insert(id);
        }
        let first = first.unwrap();

        assert_eq!(production.index_of(root), 0);
        assert_eq!(production.index_of(first), 1);
        assert_eq!(production.close_index_of(first), Some(2));
        assert_eq!(production.last_done_marker().map(|id| id.slot()), Some(101));
    }

    #[test]
    fn index_of_finds_entries_sharing_a_lexeme() {
        let mut production = Production::default();
        mark(&mut production, 0);
        let same: Vec<_> = (0..30).map(|_| mark(&mut production, 5)).collect();
        for _ in 0..30 {
            mark(&mut production, 9);
        }

        for (offset, &id) in same.iter().enumerate() {
            assert_eq!(production.index_of(id), offset + 1);
        }
    }

    #[test]
    fn index_of_survives_unordered_entries() {
        let mut production = Production::default();
        mark(&mut production, 0);
        let early = mark(&mut production, 10);
        for lexeme in 0..40 {
            mark(&mut production, lexeme);
        }

        assert_eq!(production.index_of(early), 1);
    }

    #[test]
    fn precede_and_done_before_insert_at_anchor() {
        let mut production = Production::default();
        let root = mark(&mut production, 0);
        let child = mark(&mut production, 1);
        done(&mut production, child, 2);

        let wrapper = production.arena.alloc_range(1);
        production.add_before(wrapper, child);
        let next = mark(&mut production, 3);
        production.arena.range_mut(wrapper).end = Some(3);
        production.add_done(wrapper, Some(next));

        let (r, c) = (root.slot() as i32, child.slot() as i32);
        let (w, n) = (wrapper.slot() as i32, next.slot() as i32);
        assert_eq!(production.entries(), &[r, w, c, -c, -w, n]);
    }

    #[test]
    fn rollback_frees_removed_markers() {
        let mut production = Production::default();
        let root = mark(&mut production, 0);
        let outer = mark(&mut production, 1);
        let inner = mark(&mut production, 1);
        done(&mut production, inner, 2);
        let error = production.arena.alloc_error(2, "expected".into());
        production.add_marker(error);
        production.attributes.mark_collapsed(inner.slot());

        production.rollback_to(outer);

        assert_eq!(production.entries(), &[root.slot() as i32]);
        assert!(!production.arena.is_live(outer));
        assert!(!production.arena.is_live(inner));
        assert!(!production.arena.is_live(error));
        assert!(!production.attributes.is_collapsed(inner.slot()));

        let again = production.arena.alloc_range(1);
        assert_eq!(again.slot(), outer.slot());
    }

    #[test]
    fn reused_slots_start_clean() {
        let mut production = Production::default();
        mark(&mut production, 0);
        let first = production.alloc_range(1);
        production.arena.free(first.slot());
        production.attributes.mark_collapsed(first.slot());

        let second = production.alloc_range(2);

        assert_eq!(second.slot(), first.slot());
        assert!(!production.attributes.is_collapsed(second.slot()));
    }

    #[test]
    fn drop_keeps_children() {
        let mut production = Production::default();
        let root = mark(&mut production, 0);
        let outer = mark(&mut production, 0);
        let inner = mark(&mut production, 0);
        done(&mut production, inner, 1);
        done(&mut production, outer, 1);

        production.drop_marker(outer);

        let (r, i) = (root.slot() as i32, inner.slot() as i32);
        assert_eq!(production.entries(), &[r, i, -i]);
    }

    #[test]
    fn confine_stops_at_first_boundary_in_bounds() {
        let mut production = Production::default();
        mark(&mut production, 0);
        let a = mark(&mut production, 1);
        let b = mark(&mut production, 4);
        let c = mark(&mut production, 6);
        mark(&mut production, 7);

        production.confine_markers_to_max_lexeme(4, 5);

        assert_eq!(production.arena.range(a).start, 1);
        assert_eq!(production.arena.range(b).start, 4);
        assert_eq!(production.arena.range(c).start, 5);
    }

    #[test]
    fn validity_checks() {
        let mut production = Production::default();
        mark(&mut production, 0);
        let outer = mark(&mut production, 0);
        let open_child = mark(&mut production, 1);

        assert_eq!(
            production.check_done(outer, None),
            Err(CheckFailure::new(Violation::UnclosedChild, Some(open_child.slot())))
        );
        assert!(production.check_drop(outer).is_err());

        done(&mut production, open_child, 2);
        assert_eq!(production.check_done(outer, None), Ok(()));
        assert_eq!(
            production.check_done(open_child, Some(outer)).map_err(|it| it.violation),
            Err(Violation::BeforePrecedesMarker)
        );
    }

    #[test]
    fn crossing_ranges_are_detected() {
        let mut production = Production::default();
        mark(&mut production, 0);
        let a = mark(&mut production, 0);
        let b = mark(&mut production, 1);
        done(&mut production, a, 2);

        // `a` closed while `b` was open, so closing `b` now would cross it.
        assert_eq!(
            production.check_done(b, None).map_err(|it| it.violation),
            Err(Violation::CrossingMarkers)
        );
    }
}
