use crate::SyntaxKind;

const SIZE: usize = 8;

/// A fixed-size bitset over the first `512` kinds.
///
/// Kinds beyond that are never members; [`SyntaxKind::TOMBSTONE`] in
/// particular is in no set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SyntaxSet {
    bits: [u64; SIZE],
}

impl SyntaxSet {
    pub const EMPTY: Self = Self { bits: [0; SIZE] };
    const BITS_PER_SLOT: u16 = u64::BITS as u16;

    const fn from_kind(kind: SyntaxKind) -> Self {
        let kind = kind.raw();

        let slot_index = (kind / Self::BITS_PER_SLOT) as usize;

        assert!(slot_index < SIZE, "kind does not fit into a SyntaxSet");

        let bit_index = kind % Self::BITS_PER_SLOT;
        let mask = 1 << bit_index;

        let mut bits = Self::EMPTY.bits;
        bits[slot_index] = mask;

        Self { bits }
    }

    pub const fn union(mut self, other: &Self) -> Self {
        let mut i = 0;

        while i < self.bits.len() {
            self.bits[i] |= other.bits[i];
            i += 1;
        }

        self
    }

    pub const fn new<const N: usize>(kinds: [SyntaxKind; N]) -> Self {
        let mut set = Self::EMPTY;

        let mut i = 0;
        while i < kinds.len() {
            set = set.union(&Self::from_kind(kinds[i]));
            i += 1;
        }

        set
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        let kind = kind.raw();
        let slot_index = (kind / Self::BITS_PER_SLOT) as usize;
        if slot_index >= SIZE {
            return false;
        }
        let bit_index = kind % Self::BITS_PER_SLOT;
        let mask = 1 << bit_index;

        self.bits[slot_index] & mask != 0
    }

    pub const fn is_empty(&self) -> bool {
        let mut i = 0;
        while i < self.bits.len() {
            if self.bits[i] != 0 {
                return false;
            }
            i += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: SyntaxKind = SyntaxKind::new(3);
    const B: SyntaxKind = SyntaxKind::new(130);
    const C: SyntaxKind = SyntaxKind::new(511);

    #[test]
    fn membership_across_slots() {
        const SET: SyntaxSet = SyntaxSet::new([A, B]);

        assert!(SET.contains(A));
        assert!(SET.contains(B));
        assert!(!SET.contains(C));
        assert!(!SET.contains(SyntaxKind::TOMBSTONE));
        assert!(!SET.is_empty());
        assert!(SyntaxSet::EMPTY.is_empty());
        assert!(SET.union(&SyntaxSet::new([C])).contains(C));
    }
}
