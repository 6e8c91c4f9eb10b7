use std::sync::Arc;

use tessera_syntax::{SyntaxKind, SyntaxSet};

use crate::binder::{Binder, DefaultLeftBinder, DefaultRightBinder};

/// Language-specific inputs of a [`Builder`](crate::Builder).
#[derive(Clone)]
pub struct BuilderConfig {
    pub(crate) whitespace: SyntaxSet,
    pub(crate) comments: SyntaxSet,
    pub(crate) error_kind: SyntaxKind,
    pub(crate) left_bound: SyntaxSet,
    pub(crate) default_left: Binder,
    pub(crate) default_right: Binder,
    pub(crate) debug: bool,
}

impl BuilderConfig {
    pub fn new(whitespace: SyntaxSet, error_kind: SyntaxKind) -> Self {
        Self {
            whitespace,
            comments: SyntaxSet::EMPTY,
            error_kind,
            left_bound: SyntaxSet::EMPTY,
            default_left: Arc::new(DefaultLeftBinder),
            default_right: Arc::new(DefaultRightBinder),
            debug: false,
        }
    }

    pub fn with_comments(mut self, comments: SyntaxSet) -> Self {
        self.comments = comments;
        self
    }

    /// Node kinds that stick to the preceding token when they cover nothing
    /// but trivia.
    pub fn with_left_bound(mut self, kinds: SyntaxSet) -> Self {
        self.left_bound = kinds;
        self
    }

    pub fn with_default_binders(mut self, left: Binder, right: Binder) -> Self {
        self.default_left = left;
        self.default_right = right;
        self
    }

    /// Enables allocation-site tracking and the expensive consistency checks.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn whitespace(&self) -> SyntaxSet {
        self.whitespace
    }

    pub fn comments(&self) -> SyntaxSet {
        self.comments
    }

    pub fn error_kind(&self) -> SyntaxKind {
        self.error_kind
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    #[inline]
    pub fn is_trivia(&self, kind: SyntaxKind) -> bool {
        self.whitespace.contains(kind) || self.comments.contains(kind)
    }
}

impl std::fmt::Debug for BuilderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderConfig")
            .field("whitespace", &self.whitespace)
            .field("comments", &self.comments)
            .field("error_kind", &self.error_kind)
            .field("left_bound", &self.left_bound)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
