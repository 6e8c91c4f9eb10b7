//! Slot storage for markers with per-kind free lists.
//!
//! Slots are reused after a marker is disposed, so a slot index alone does
//! not identify a marker. Every slot carries a generation that is bumped on
//! disposal; a [`MarkerId`] remembers the generation it was issued with and
//! goes stale once its slot is freed.

use std::fmt;
use std::num::NonZeroU32;

use tessera_syntax::SyntaxKind;

/// Handle of a marker inside one builder.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId {
    slot: NonZeroU32,
    generation: u32,
}

impl MarkerId {
    pub(crate) fn slot(self) -> u32 {
        self.slot.get()
    }
}

impl fmt::Debug for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkerId({}@{})", self.slot, self.generation)
    }
}

#[derive(Debug)]
pub(crate) struct RangeMarker {
    pub(crate) start: u32,
    /// `None` while the marker is open.
    pub(crate) end: Option<u32>,
    pub(crate) kind: SyntaxKind,
}

#[derive(Debug)]
pub(crate) struct ErrorMarker {
    pub(crate) index: u32,
    pub(crate) message: Box<str>,
}

#[derive(Debug)]
pub(crate) enum MarkerData {
    Range(RangeMarker),
    Error(ErrorMarker),
}

impl MarkerData {
    fn clear(&mut self) {
        match self {
            Self::Range(marker) => {
                marker.start = 0;
                marker.end = None;
                marker.kind = SyntaxKind::TOMBSTONE;
            }
            Self::Error(marker) => {
                marker.index = 0;
                marker.message = Box::default();
            }
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    live: bool,
    data: MarkerData,
}

#[derive(Debug)]
pub(crate) struct MarkerArena {
    slots: Vec<Slot>,
    free_ranges: Vec<u32>,
    free_errors: Vec<u32>,
}

impl Default for MarkerArena {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerArena {
    pub(crate) fn new() -> Self {
        // Slot 0 means "no marker" and is never handed out.
        let reserved = Slot {
            generation: 0,
            live: false,
            data: MarkerData::Range(RangeMarker {
                start: 0,
                end: None,
                kind: SyntaxKind::TOMBSTONE,
            }),
        };
        Self { slots: vec![reserved], free_ranges: Vec::new(), free_errors: Vec::new() }
    }

    pub(crate) fn alloc_range(&mut self, start: u32) -> MarkerId {
        match self.free_ranges.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                let MarkerData::Range(marker) = &mut entry.data else {
                    unreachable!("range free list holds an error slot")
                };
                marker.start = start;
                entry.live = true;
                Self::id(slot, entry.generation)
            }
            None => self.push(MarkerData::Range(RangeMarker {
                start,
                end: None,
                kind: SyntaxKind::TOMBSTONE,
            })),
        }
    }

    pub(crate) fn alloc_error(&mut self, index: u32, message: Box<str>) -> MarkerId {
        match self.free_errors.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                let MarkerData::Error(marker) = &mut entry.data else {
                    unreachable!("error free list holds a range slot")
                };
                marker.index = index;
                marker.message = message;
                entry.live = true;
                Self::id(slot, entry.generation)
            }
            None => self.push(MarkerData::Error(ErrorMarker { index, message })),
        }
    }

    fn push(&mut self, data: MarkerData) -> MarkerId {
        let slot = u32::try_from(self.slots.len())
            .ok()
            .filter(|&slot| slot <= i32::MAX as u32)
            .unwrap_or_else(|| panic!("too many markers"));
        self.slots.push(Slot { generation: 0, live: true, data });
        Self::id(slot, 0)
    }

    fn id(slot: u32, generation: u32) -> MarkerId {
        let slot = NonZeroU32::new(slot).unwrap_or_else(|| panic!("slot 0 is reserved"));
        MarkerId { slot, generation }
    }

    /// Returns the slot to its free list and invalidates every handle to it.
    pub(crate) fn free(&mut self, slot: u32) {
        let entry = &mut self.slots[slot as usize];
        assert!(entry.live, "marker slot {slot} freed twice");
        entry.live = false;
        entry.generation = entry.generation.wrapping_add(1);
        entry.data.clear();
        match entry.data {
            MarkerData::Range(_) => self.free_ranges.push(slot),
            MarkerData::Error(_) => self.free_errors.push(slot),
        }
    }

    pub(crate) fn is_live(&self, id: MarkerId) -> bool {
        let entry = &self.slots[id.slot() as usize];
        entry.live && entry.generation == id.generation
    }

    pub(crate) fn is_live_slot(&self, slot: u32) -> bool {
        self.slots[slot as usize].live
    }

    /// Current handle of a live slot.
    pub(crate) fn id_of(&self, slot: u32) -> MarkerId {
        let entry = &self.slots[slot as usize];
        debug_assert!(entry.live);
        Self::id(slot, entry.generation)
    }

    #[track_caller]
    pub(crate) fn get(&self, id: MarkerId) -> &MarkerData {
        assert!(self.is_live(id), "{id:?} was disposed");
        &self.slots[id.slot() as usize].data
    }

    #[track_caller]
    pub(crate) fn range(&self, id: MarkerId) -> &RangeMarker {
        match self.get(id) {
            MarkerData::Range(marker) => marker,
            MarkerData::Error(_) => panic!("{id:?} is an error marker"),
        }
    }

    #[track_caller]
    pub(crate) fn range_mut(&mut self, id: MarkerId) -> &mut RangeMarker {
        assert!(self.is_live(id), "{id:?} was disposed");
        match &mut self.slots[id.slot() as usize].data {
            MarkerData::Range(marker) => marker,
            MarkerData::Error(_) => panic!("{id:?} is an error marker"),
        }
    }

    /// Data of a slot named by a production entry; such slots are always live.
    #[inline]
    pub(crate) fn data_at(&self, slot: u32) -> &MarkerData {
        &self.slots[slot as usize].data
    }

    /// Lexeme index recorded for a production entry (`+slot` opens, `-slot`
    /// closes).
    #[inline]
    pub(crate) fn lexeme(&self, entry: i32) -> u32 {
        match self.data_at(entry.unsigned_abs()) {
            MarkerData::Range(marker) if entry < 0 => marker.end.unwrap_or(marker.start),
            MarkerData::Range(marker) => marker.start,
            MarkerData::Error(marker) => marker.index,
        }
    }

    #[inline]
    pub(crate) fn set_lexeme(&mut self, entry: i32, lexeme: u32) {
        match &mut self.slots[entry.unsigned_abs() as usize].data {
            MarkerData::Range(marker) if entry < 0 => marker.end = Some(lexeme),
            MarkerData::Range(marker) => marker.start = lexeme,
            MarkerData::Error(marker) => marker.index = lexeme,
        }
    }

    /// Number of slots ever allocated, including the reserved one.
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_zero_is_never_issued() {
        let mut arena = MarkerArena::new();
        let id = arena.alloc_range(0);

        assert_eq!(id.slot(), 1);
        assert_eq!(arena.capacity(), 2);
    }

    #[test]
    fn free_lists_are_per_kind() {
        let mut arena = MarkerArena::new();
        let range = arena.alloc_range(3);
        let error = arena.alloc_error(4, "oops".into());

        arena.free(range.slot());
        let other_error = arena.alloc_error(5, "again".into());
        assert_ne!(other_error.slot(), range.slot());

        let reused = arena.alloc_range(7);
        assert_eq!(reused.slot(), range.slot());
        assert_ne!(reused, range);
        assert_eq!(arena.range(reused).start, 7);
        assert!(arena.is_live(error));
    }

    #[test]
    fn freeing_clears_fields() {
        let mut arena = MarkerArena::new();
        let id = arena.alloc_range(2);
        arena.range_mut(id).end = Some(4);
        arena.range_mut(id).kind = SyntaxKind::new(9);

        arena.free(id.slot());
        let reused = arena.alloc_range(1);

        let marker = arena.range(reused);
        assert_eq!(marker.end, None);
        assert!(marker.kind.is_tombstone());
    }

    #[test]
    #[should_panic(expected = "was disposed")]
    fn stale_handles_are_detected() {
        let mut arena = MarkerArena::new();
        let id = arena.alloc_range(0);
        arena.free(id.slot());
        arena.alloc_range(1);

        arena.range(id);
    }
}
