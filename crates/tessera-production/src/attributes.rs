//! Side tables for marker attributes that only a few markers carry.

use std::panic::Location;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::binder::Binder;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Edge {
    Left,
    Right,
}

/// Growable bitset over marker slots.
#[derive(Debug, Default)]
struct SlotBits {
    words: Vec<u64>,
}

impl SlotBits {
    const BITS_PER_WORD: usize = u64::BITS as usize;

    fn contains(&self, slot: u32) -> bool {
        let slot = slot as usize;
        self.words
            .get(slot / Self::BITS_PER_WORD)
            .is_some_and(|word| word & (1 << (slot % Self::BITS_PER_WORD)) != 0)
    }

    fn insert(&mut self, slot: u32) {
        let slot = slot as usize;
        let word = slot / Self::BITS_PER_WORD;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (slot % Self::BITS_PER_WORD);
    }

    fn remove(&mut self, slot: u32) {
        let slot = slot as usize;
        if let Some(word) = self.words.get_mut(slot / Self::BITS_PER_WORD) {
            *word &= !(1 << (slot % Self::BITS_PER_WORD));
        }
    }
}

/// Custom binders, error messages, collapse flags and allocation sites,
/// keyed by marker slot. `present` tells which slots have any of them, so the
/// common case never touches the maps.
#[derive(Default)]
pub(crate) struct MarkerAttributes {
    present: SlotBits,
    left_binders: FxHashMap<u32, Binder>,
    right_binders: FxHashMap<u32, Binder>,
    error_messages: FxHashMap<u32, Box<str>>,
    allocation_sites: FxHashMap<u32, &'static Location<'static>>,
    collapsed: FxHashSet<u32>,
}

impl MarkerAttributes {
    pub(crate) fn clean(&mut self, slot: u32) {
        if self.present.contains(slot) {
            self.present.remove(slot);
            self.left_binders.remove(&slot);
            self.right_binders.remove(&slot);
            self.error_messages.remove(&slot);
            self.allocation_sites.remove(&slot);
            self.collapsed.remove(&slot);
        }
    }

    pub(crate) fn set_binder(&mut self, slot: u32, edge: Edge, binder: Binder) {
        self.present.insert(slot);
        match edge {
            Edge::Left => self.left_binders.insert(slot, binder),
            Edge::Right => self.right_binders.insert(slot, binder),
        };
    }

    pub(crate) fn binder(&self, slot: u32, edge: Edge) -> Option<&Binder> {
        if !self.present.contains(slot) {
            return None;
        }
        match edge {
            Edge::Left => self.left_binders.get(&slot),
            Edge::Right => self.right_binders.get(&slot),
        }
    }

    pub(crate) fn set_error_message(&mut self, slot: u32, message: Box<str>) {
        self.present.insert(slot);
        self.error_messages.insert(slot, message);
    }

    pub(crate) fn error_message(&self, slot: u32) -> Option<&str> {
        if !self.present.contains(slot) {
            return None;
        }
        self.error_messages.get(&slot).map(|message| &**message)
    }

    pub(crate) fn mark_collapsed(&mut self, slot: u32) {
        self.present.insert(slot);
        self.collapsed.insert(slot);
    }

    pub(crate) fn is_collapsed(&self, slot: u32) -> bool {
        self.present.contains(slot) && self.collapsed.contains(&slot)
    }

    pub(crate) fn set_allocation_site(&mut self, slot: u32, site: &'static Location<'static>) {
        self.present.insert(slot);
        self.allocation_sites.insert(slot, site);
    }

    pub(crate) fn allocation_site(&self, slot: u32) -> Option<&'static Location<'static>> {
        if !self.present.contains(slot) {
            return None;
        }
        self.allocation_sites.get(&slot).copied()
    }
}
