//! Position of the parser inside the token stream.
//!
//! Whitespace and comments are skipped lazily: `advance` only moves past the
//! current token, and the trivia after it is skipped the next time the
//! parser asks for the current token (`token_type`, `eof`, `mark`). Raw
//! operations never skip anything.

use tessera_syntax::{SyntaxKind, SyntaxSet, TokenStream};
use text_size::{TextRange, TextSize};

/// Reclassifies tokens on the fly, for contextual keywords and the like.
pub trait TokenRemapper {
    fn remap(&self, kind: SyntaxKind, range: TextRange, text: &str) -> SyntaxKind;
}

impl<F> TokenRemapper for F
where
    F: Fn(SyntaxKind, TextRange, &str) -> SyntaxKind,
{
    fn remap(&self, kind: SyntaxKind, range: TextRange, text: &str) -> SyntaxKind {
        self(kind, range, text)
    }
}

pub(crate) struct TokenCursor<'a> {
    tokens: TokenStream,
    whitespace: SyntaxSet,
    comments: SyntaxSet,
    current: usize,
    cached_kind: Option<SyntaxKind>,
    type_checked: bool,
    /// Whether the parser looked at the current token since the last move.
    inspected: bool,
    remapper: Option<Box<dyn TokenRemapper + 'a>>,
    on_skip: Option<Box<dyn FnMut(SyntaxKind, TextRange) + 'a>>,
}

impl<'a> TokenCursor<'a> {
    pub(crate) fn new(tokens: TokenStream, whitespace: SyntaxSet, comments: SyntaxSet) -> Self {
        Self {
            tokens,
            whitespace,
            comments,
            current: 0,
            cached_kind: None,
            type_checked: false,
            inspected: false,
            remapper: None,
            on_skip: None,
        }
    }

    pub(crate) fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub(crate) fn is_trivia(&self, kind: SyntaxKind) -> bool {
        self.whitespace.contains(kind) || self.comments.contains(kind)
    }

    /// Whether `start..end` holds nothing but trivia.
    pub(crate) fn is_empty(&self, start: usize, end: usize) -> bool {
        let end = end.min(self.len());
        start >= end || self.tokens.kinds()[start..end].iter().all(|&kind| self.is_trivia(kind))
    }

    pub(crate) fn set_remapper(&mut self, remapper: Box<dyn TokenRemapper + 'a>) {
        self.remapper = Some(remapper);
        self.type_checked = false;
        self.cached_kind = None;
    }

    /// Replaces the comment set; the current token is looked at again.
    pub(crate) fn set_comments(&mut self, comments: SyntaxSet) {
        self.comments = comments;
        self.type_checked = false;
        self.cached_kind = None;
    }

    pub(crate) fn set_whitespace_skipped_callback(
        &mut self,
        callback: Box<dyn FnMut(SyntaxKind, TextRange) + 'a>,
    ) {
        self.on_skip = Some(callback);
    }

    pub(crate) fn token_type(&mut self) -> Option<SyntaxKind> {
        self.inspected = true;
        if let Some(kind) = self.cached_kind {
            return Some(kind);
        }
        if self.eof() {
            return None;
        }
        if self.remapper.is_some() {
            self.skip_whitespace();
            if self.current >= self.len() {
                return None;
            }
        }
        let kind = self.tokens.kind(self.current);
        self.cached_kind = Some(kind);
        Some(kind)
    }

    pub(crate) fn eof(&mut self) -> bool {
        self.inspected = true;
        if !self.type_checked {
            self.type_checked = true;
            self.skip_whitespace();
        }
        self.current >= self.len()
    }

    pub(crate) fn advance(&mut self) {
        if self.eof() {
            return;
        }
        self.type_checked = false;
        self.inspected = false;
        self.current += 1;
        self.cached_kind = None;
    }

    pub(crate) fn was_inspected(&self) -> bool {
        self.inspected
    }

    pub(crate) fn raw_advance(&mut self, steps: usize) {
        if steps == 0 {
            return;
        }
        self.current = self.current.saturating_add(steps).min(self.len());
        self.type_checked = true;
        self.inspected = false;
        self.cached_kind = None;
    }

    /// Moves back to a previously seen position.
    pub(crate) fn reset_to(&mut self, index: usize) {
        self.current = index;
        self.type_checked = true;
        self.inspected = false;
        self.cached_kind = None;
    }

    pub(crate) fn mark_checked(&mut self) {
        self.type_checked = true;
    }

    pub(crate) fn look_ahead(&mut self, steps: usize) -> Option<SyntaxKind> {
        if self.eof() {
            return None;
        }
        let mut cur = self.current;
        for _ in 0..steps {
            cur += 1;
            while cur < self.len() && self.is_trivia(self.tokens.kind(cur)) {
                cur += 1;
            }
        }
        (cur < self.len()).then(|| self.tokens.kind(cur))
    }

    fn raw_index(&self, steps: isize) -> Option<usize> {
        self.current.checked_add_signed(steps)
    }

    pub(crate) fn raw_lookup(&self, steps: isize) -> Option<SyntaxKind> {
        self.raw_index(steps).filter(|&cur| cur < self.len()).map(|cur| self.tokens.kind(cur))
    }

    pub(crate) fn raw_token_type_start(&self, steps: isize) -> Option<TextSize> {
        self.raw_index(steps).map(|cur| self.tokens.start(cur.min(self.len())))
    }

    pub(crate) fn raw_token_index(&self) -> usize {
        self.current
    }

    pub(crate) fn current_offset(&mut self) -> TextSize {
        if self.eof() {
            return self.tokens.text_len();
        }
        self.tokens.start(self.current)
    }

    pub(crate) fn token_text(&mut self) -> Option<&str> {
        if self.eof() {
            return None;
        }
        Some(self.tokens.token_text(self.current))
    }

    pub(crate) fn remap_current_token(&mut self, kind: SyntaxKind) {
        if self.current < self.len() {
            self.tokens.remap(self.current, kind);
        }
        self.cached_kind = None;
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while self.current < self.len() {
            let kind = self.remapped_current();
            if !self.is_trivia(kind) {
                break;
            }
            let range = self.tokens.token_range(self.current);
            if let Some(on_skip) = &mut self.on_skip {
                on_skip(kind, range);
            }
            self.current += 1;
            self.cached_kind = None;
        }
    }

    fn remapped_current(&mut self) -> SyntaxKind {
        if let Some(kind) = self.cached_kind {
            return kind;
        }
        let kind = self.tokens.kind(self.current);
        if let Some(remapper) = &self.remapper {
            let range = self.tokens.token_range(self.current);
            let remapped = remapper.remap(kind, range, &self.tokens.text()[range]);
            if remapped != kind {
                self.tokens.remap(self.current, remapped);
            }
            return remapped;
        }
        kind
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    const IDENT: SyntaxKind = SyntaxKind::new(1);
    const WS: SyntaxKind = SyntaxKind::new(2);
    const COMMENT: SyntaxKind = SyntaxKind::new(3);
    const KEYWORD: SyntaxKind = SyntaxKind::new(4);

    fn cursor<'a>() -> TokenCursor<'a> {
        let tokens = TokenStream::from_pieces([
            (IDENT, "a"),
            (WS, " "),
            (COMMENT, "/*c*/"),
            (IDENT, "b"),
            (WS, " "),
        ]);
        TokenCursor::new(tokens, SyntaxSet::new([WS]), SyntaxSet::new([COMMENT]))
    }

    #[test]
    fn skipping_is_deferred_until_queried() {
        let mut cursor = cursor();
        assert_eq!(cursor.token_type(), Some(IDENT));

        cursor.advance();
        assert_eq!(cursor.raw_token_index(), 1);
        assert_eq!(cursor.raw_lookup(0), Some(WS));

        assert_eq!(cursor.token_type(), Some(IDENT));
        assert_eq!(cursor.raw_token_index(), 3);
        assert_eq!(cursor.token_text(), Some("b"));

        assert!(cursor.was_inspected());
        cursor.advance();
        assert!(!cursor.was_inspected());
        assert!(cursor.eof());
        assert!(cursor.was_inspected());
        assert_eq!(cursor.raw_token_index(), 5);
        assert_eq!(cursor.token_type(), None);
        assert_eq!(cursor.current_offset(), TextSize::new(9));
    }

    #[test]
    fn raw_operations_do_not_skip() {
        let mut cursor = cursor();
        cursor.raw_advance(1);
        assert_eq!(cursor.token_type(), Some(WS));
        assert_eq!(cursor.raw_lookup(-1), Some(IDENT));
        assert_eq!(cursor.raw_lookup(-2), None);
        assert_eq!(cursor.raw_token_type_start(2), Some(TextSize::new(7)));
        assert_eq!(cursor.raw_token_type_start(-2), None);

        cursor.raw_advance(100);
        assert!(cursor.eof());
    }

    #[test]
    fn look_ahead_skips_trivia() {
        let mut cursor = cursor();
        assert_eq!(cursor.look_ahead(0), Some(IDENT));
        assert_eq!(cursor.look_ahead(1), Some(IDENT));
        assert_eq!(cursor.look_ahead(2), None);
        assert_eq!(cursor.raw_token_index(), 0);
    }

    #[test]
    fn skipped_tokens_are_reported() {
        let skipped = RefCell::new(Vec::new());
        let mut cursor = cursor();
        cursor.set_whitespace_skipped_callback(Box::new(|kind, range| {
            skipped.borrow_mut().push((kind, range));
        }));

        cursor.token_type();
        cursor.advance();
        cursor.eof();
        drop(cursor);

        assert_eq!(
            skipped.into_inner(),
            vec![
                (WS, TextRange::new(1.into(), 2.into())),
                (COMMENT, TextRange::new(2.into(), 7.into())),
            ]
        );
    }

    #[test]
    fn remapper_rewrites_inspected_tokens() {
        let mut cursor = cursor();
        cursor.set_remapper(Box::new(|kind: SyntaxKind, _range: TextRange, text: &str| {
            if kind == IDENT && text == "b" { KEYWORD } else { kind }
        }));

        assert_eq!(cursor.token_type(), Some(IDENT));
        cursor.advance();
        assert_eq!(cursor.token_type(), Some(KEYWORD));
        assert_eq!(cursor.tokens().kind(3), KEYWORD);
    }

    #[test]
    fn remapper_at_trailing_trivia_reports_end() {
        let mut cursor = cursor();
        cursor.set_remapper(Box::new(|kind: SyntaxKind, _range: TextRange, _text: &str| kind));

        cursor.raw_advance(4);
        assert_eq!(cursor.token_type(), None);
        assert_eq!(cursor.raw_token_index(), 5);
        assert!(cursor.eof());
    }

    #[test]
    fn changing_comments_changes_skipping() {
        let mut cursor = cursor();
        cursor.raw_advance(2);
        assert_eq!(cursor.token_type(), Some(COMMENT));

        cursor.reset_to(1);
        cursor.set_comments(SyntaxSet::EMPTY);
        assert_eq!(cursor.token_type(), Some(COMMENT));
        assert_eq!(cursor.raw_token_index(), 2);
    }

    #[test]
    fn explicit_remap_invalidates_cache() {
        let mut cursor = cursor();
        assert_eq!(cursor.token_type(), Some(IDENT));

        cursor.remap_current_token(KEYWORD);

        assert_eq!(cursor.token_type(), Some(KEYWORD));
        assert!(cursor.is_empty(1, 3));
        assert!(!cursor.is_empty(1, 4));
    }
}
