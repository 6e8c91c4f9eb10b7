use std::ops::Range;
use std::sync::Arc;

use text_size::{TextLen, TextRange, TextSize};

use crate::SyntaxKind;

/// Lexed tokens of a source text: one kind and one start offset per token.
///
/// The end of the last token is the end of the text. Cloning is cheap, so a
/// stream can be cached and handed to several builder runs. Kinds are
/// copy-on-write: [`TokenStream::remap`] never affects other clones.
#[derive(Clone)]
pub struct TokenStream {
    text: Arc<str>,
    kinds: Arc<Vec<SyntaxKind>>,
    starts: Arc<[TextSize]>,
}

impl TokenStream {
    /// Creates a stream from `(kind, start offset)` pairs.
    ///
    /// Offsets must be non-decreasing and inside `text`.
    pub fn new(
        text: impl Into<Arc<str>>,
        tokens: impl IntoIterator<Item = (SyntaxKind, TextSize)>,
    ) -> Self {
        let text = text.into();
        let (kinds, starts): (Vec<_>, Vec<_>) = tokens.into_iter().unzip();

        let text_len = text.text_len();
        let mut previous = TextSize::new(0);
        for &start in &starts {
            assert!(start >= previous, "token offsets must be non-decreasing");
            assert!(start <= text_len, "token offset {start:?} is past the end of the text");
            previous = start;
        }

        Self { text, kinds: Arc::new(kinds), starts: starts.into() }
    }

    /// Creates a stream by concatenating token texts.
    pub fn from_pieces<'a>(pieces: impl IntoIterator<Item = (SyntaxKind, &'a str)>) -> Self {
        let mut text = String::new();
        let mut tokens = Vec::new();
        for (kind, piece) in pieces {
            tokens.push((kind, text.text_len()));
            text.push_str(piece);
        }
        Self::new(text, tokens)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_len(&self) -> TextSize {
        self.text.text_len()
    }

    #[inline]
    pub fn kind(&self, index: usize) -> SyntaxKind {
        self.kinds[index]
    }

    #[inline]
    pub fn kinds(&self) -> &[SyntaxKind] {
        &self.kinds
    }

    /// Start offset of the token at `index`; `len()` maps to the text end.
    #[inline]
    pub fn start(&self, index: usize) -> TextSize {
        match self.starts.get(index) {
            Some(&start) => start,
            None => self.text_len(),
        }
    }

    pub fn token_range(&self, index: usize) -> TextRange {
        TextRange::new(self.start(index), self.start(index + 1))
    }

    /// Text range covered by the tokens in `tokens`.
    pub fn range(&self, tokens: Range<usize>) -> TextRange {
        TextRange::new(self.start(tokens.start), self.start(tokens.end))
    }

    pub fn token_text(&self, index: usize) -> &str {
        &self.text[self.token_range(index)]
    }

    /// Replaces the kind of one token, copying the kind table first if it is
    /// shared with another stream.
    pub fn remap(&mut self, index: usize, kind: SyntaxKind) {
        if self.kinds[index] != kind {
            Arc::make_mut(&mut self.kinds)[index] = kind;
        }
    }
}

impl std::fmt::Debug for TokenStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStream")
            .field("tokens", &self.len())
            .field("text_len", &self.text_len())
            .finish_non_exhaustive()
    }
}
