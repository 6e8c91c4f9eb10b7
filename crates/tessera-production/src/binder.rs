//! Policies deciding how much of the trivia next to a node boundary belongs
//! to the node.
//!
//! During finalization every boundary is shown the run of whitespace and
//! comment tokens around it. A binder picks an edge inside that run: for an
//! opening boundary everything after the edge is inside the node, for a
//! closing boundary everything before it is.

use std::ops::Range;
use std::sync::Arc;

use tessera_syntax::{SyntaxKind, SyntaxSet, TokenStream};

/// A contiguous run of whitespace and comment tokens.
pub struct TokenRun<'a> {
    tokens: &'a TokenStream,
    range: Range<usize>,
    comments: &'a SyntaxSet,
}

impl<'a> TokenRun<'a> {
    pub(crate) fn new(tokens: &'a TokenStream, range: Range<usize>, comments: &'a SyntaxSet) -> Self {
        Self { tokens, range, comments }
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn kinds(&self) -> &'a [SyntaxKind] {
        &self.tokens.kinds()[self.range.clone()]
    }

    pub fn kind(&self, index: usize) -> SyntaxKind {
        self.kinds()[index]
    }

    pub fn text(&self, index: usize) -> &'a str {
        assert!(index < self.len());
        self.tokens.token_text(self.range.start + index)
    }

    pub fn is_comment(&self, index: usize) -> bool {
        self.comments.contains(self.kind(index))
    }

    /// Whether the run touches the start or the end of the token stream.
    pub fn at_stream_edge(&self) -> bool {
        self.range.start == 0 || self.range.end == self.tokens.len()
    }
}

pub trait EdgeBinder: Send + Sync {
    /// Position of the edge inside `run`, in `0..=run.len()`.
    fn edge_position(&self, run: &TokenRun<'_>) -> usize;

    /// Recursive binders may claim trivia already passed by enclosing
    /// boundaries, which are then pulled back to the new edge.
    fn is_recursive(&self) -> bool {
        false
    }
}

pub type Binder = Arc<dyn EdgeBinder>;

/// Default for opening boundaries: comments right before a node belong to
/// it, plain whitespace in front of them does not.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultLeftBinder;

impl EdgeBinder for DefaultLeftBinder {
    fn edge_position(&self, run: &TokenRun<'_>) -> usize {
        (0..run.len()).find(|&i| run.is_comment(i)).unwrap_or(run.len())
    }
}

/// Default for closing boundaries and the fixed policy of point errors: the
/// edge stays before the run, so nothing is claimed.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRightBinder;

impl EdgeBinder for DefaultRightBinder {
    fn edge_position(&self, _run: &TokenRun<'_>) -> usize {
        0
    }
}

/// Puts the edge before the whole run.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyLeftBinder;

impl EdgeBinder for GreedyLeftBinder {
    fn edge_position(&self, _run: &TokenRun<'_>) -> usize {
        0
    }
}

/// Puts the edge after the whole run.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyRightBinder;

impl EdgeBinder for GreedyRightBinder {
    fn edge_position(&self, run: &TokenRun<'_>) -> usize {
        run.len()
    }
}

/// Edge before the first token of the given kinds.
#[derive(Clone, Copy, Debug)]
pub struct LeadingCommentsBinder(pub SyntaxSet);

impl EdgeBinder for LeadingCommentsBinder {
    fn edge_position(&self, run: &TokenRun<'_>) -> usize {
        run.kinds().iter().position(|&kind| self.0.contains(kind)).unwrap_or(run.len())
    }
}

/// Edge after the last token of the given kinds.
#[derive(Clone, Copy, Debug)]
pub struct TrailingCommentsBinder(pub SyntaxSet);

impl EdgeBinder for TrailingCommentsBinder {
    fn edge_position(&self, run: &TokenRun<'_>) -> usize {
        run.kinds().iter().rposition(|&kind| self.0.contains(kind)).map_or(0, |i| i + 1)
    }
}

/// Marks the wrapped binder as recursive.
#[derive(Clone, Copy, Debug)]
pub struct Recursive<B>(pub B);

impl<B: EdgeBinder> EdgeBinder for Recursive<B> {
    fn edge_position(&self, run: &TokenRun<'_>) -> usize {
        self.0.edge_position(run)
    }

    fn is_recursive(&self) -> bool {
        true
    }
}
