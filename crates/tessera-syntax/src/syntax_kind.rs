use std::fmt;

/// A token or node kind.
///
/// Kinds are plain numbers; the language on top decides what they mean.
/// Only [`SyntaxKind::TOMBSTONE`] is reserved.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SyntaxKind(u16);

impl SyntaxKind {
    /// Placeholder kind of a node that has not been completed yet.
    pub const TOMBSTONE: Self = Self(u16::MAX);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn is_tombstone(self) -> bool {
        self.0 == Self::TOMBSTONE.0
    }
}

impl fmt::Debug for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tombstone() { f.write_str("TOMBSTONE") } else { write!(f, "#{}", self.0) }
    }
}

impl From<u16> for SyntaxKind {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}
