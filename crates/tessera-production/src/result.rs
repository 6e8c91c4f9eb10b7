use std::fmt::Write;
use std::ops::{Index, Range};

use tessera_errors::{Diagnostic, Renderer};
use tessera_syntax::{SyntaxKind, TokenStream};
use text_size::{TextRange, TextSize};

use crate::arena::MarkerData;
use crate::production::Production;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryEvent {
    /// Opening boundary of a node.
    Start,
    /// Closing boundary of a node.
    Finish,
    /// A point error between two tokens.
    Error,
}

/// One position of the finalized production.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductionEntry {
    event: EntryEvent,
    kind: SyntaxKind,
    message: Option<Box<str>>,
    start: u32,
    end: u32,
}

impl ProductionEntry {
    pub fn event(&self) -> EntryEvent {
        self.event
    }

    /// Closing boundaries and point errors are done, opening boundaries are
    /// not.
    pub fn is_done(&self) -> bool {
        self.event != EntryEvent::Start
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn error_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn start_token(&self) -> usize {
        self.start as usize
    }

    pub fn end_token(&self) -> usize {
        self.end as usize
    }

    pub fn token_range(&self) -> Range<usize> {
        self.start_token()..self.end_token()
    }

    pub fn is_point_error(&self) -> bool {
        self.event == EntryEvent::Error
    }
}

/// The balanced production of a finished builder.
///
/// Immutable and cheap to share between threads.
#[derive(Clone, Debug)]
pub struct ProductionResult {
    tokens: TokenStream,
    entries: Box<[ProductionEntry]>,
    collapsed: Box<[usize]>,
}

impl ProductionResult {
    pub(crate) fn new(production: &Production, tokens: TokenStream, error_kind: SyntaxKind) -> Self {
        let mut collapsed = Vec::new();
        let entries = production
            .entries()
            .iter()
            .enumerate()
            .map(|(position, &entry)| {
                let slot = entry.unsigned_abs();
                match production.arena.data_at(slot) {
                    MarkerData::Range(marker) => {
                        let event = if entry > 0 { EntryEvent::Start } else { EntryEvent::Finish };
                        if event == EntryEvent::Start && production.attributes.is_collapsed(slot) {
                            collapsed.push(position);
                        }
                        ProductionEntry {
                            event,
                            kind: marker.kind,
                            message: production.attributes.error_message(slot).map(Box::from),
                            start: marker.start,
                            end: marker.end.unwrap_or(marker.start),
                        }
                    }
                    MarkerData::Error(marker) => ProductionEntry {
                        event: EntryEvent::Error,
                        kind: error_kind,
                        message: Some(marker.message.clone()),
                        start: marker.index,
                        end: marker.index,
                    },
                }
            })
            .collect();

        Self { tokens, entries, collapsed: collapsed.into() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&ProductionEntry> {
        self.entries.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductionEntry> {
        self.entries.iter()
    }

    /// The token stream the production was built over, including remapped
    /// kinds.
    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    pub fn collapsed_count(&self) -> usize {
        self.collapsed.len()
    }

    /// Sequence positions of the opening boundaries of collapsed nodes.
    pub fn collapsed_positions(&self) -> &[usize] {
        &self.collapsed
    }

    pub fn is_collapsed(&self, position: usize) -> bool {
        self.collapsed.binary_search(&position).is_ok()
    }

    /// Source range covered by an entry.
    pub fn text_range(&self, entry: &ProductionEntry) -> TextRange {
        TextRange::new(self.tokens.start(entry.start_token()), self.tokens.start(entry.end_token()))
    }

    /// Point errors and error nodes, in production order.
    pub fn errors(&self) -> impl Iterator<Item = &ProductionEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.event != EntryEvent::Finish && entry.message.is_some())
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors()
            .map(|entry| {
                let message = entry.error_message().unwrap_or_default();
                Diagnostic::error(message, self.text_range(entry))
            })
            .collect()
    }

    /// Renders every diagnostic against the source text, one after another.
    pub fn render_diagnostics(&self, renderer: &Renderer, path: &str) -> String {
        let text = self.tokens.text();
        let mut buf = String::new();
        for diagnostic in self.diagnostics() {
            writeln!(buf, "{}", diagnostic.render(renderer, path, text)).ok();
        }
        buf
    }

    /// Replays the production as a tree walk over every token of the stream.
    ///
    /// Collapsed nodes come out as one token covering their whole span. A
    /// point error at the same token as the previous one is skipped.
    pub fn events(&self) -> Vec<TreeEvent<'_>> {
        let mut events = Vec::with_capacity(self.entries.len() + self.tokens.len());
        let mut current = 0;
        let mut last_error = None;
        let mut position = 0;

        while position < self.entries.len() {
            let entry = &self.entries[position];
            match entry.event {
                EntryEvent::Start => {
                    self.push_tokens(&mut events, &mut current, entry.start_token());
                    if self.is_collapsed(position) {
                        let end = entry.end_token().max(current);
                        let range =
                            TextRange::new(self.tokens.start(current), self.tokens.start(end));
                        events.push(TreeEvent::Token { kind: entry.kind, range });
                        current = end;
                        position = self.matching_finish(position);
                    } else {
                        let error = entry.error_message();
                        events.push(TreeEvent::Enter { kind: entry.kind, error });
                    }
                }
                EntryEvent::Finish => {
                    let until = if position + 1 == self.entries.len() {
                        self.tokens.len()
                    } else {
                        entry.end_token()
                    };
                    self.push_tokens(&mut events, &mut current, until);
                    events.push(TreeEvent::Leave);
                }
                EntryEvent::Error => {
                    self.push_tokens(&mut events, &mut current, entry.start_token());
                    if last_error != Some(current) {
                        let message = entry.error_message().unwrap_or_default();
                        let offset = self.tokens.start(current);
                        events.push(TreeEvent::Error { message, offset });
                        last_error = Some(current);
                    }
                }
            }
            position += 1;
        }

        events
    }

    fn push_tokens(&self, events: &mut Vec<TreeEvent<'_>>, current: &mut usize, until: usize) {
        let until = until.min(self.tokens.len());
        while *current < until {
            let kind = self.tokens.kind(*current);
            events.push(TreeEvent::Token { kind, range: self.tokens.token_range(*current) });
            *current += 1;
        }
    }

    fn matching_finish(&self, start: usize) -> usize {
        let mut depth = 0usize;
        for (position, entry) in self.entries.iter().enumerate().skip(start) {
            match entry.event {
                EntryEvent::Start => depth += 1,
                EntryEvent::Finish => {
                    depth -= 1;
                    if depth == 0 {
                        return position;
                    }
                }
                EntryEvent::Error => {}
            }
        }
        self.entries.len()
    }

    /// Indented rendering of [`ProductionResult::events`], for tests and
    /// debugging.
    pub fn debug_dump<'n>(&self, names: impl Fn(SyntaxKind) -> &'n str) -> String {
        let mut buf = String::new();
        let mut indent = 0;
        let text = self.tokens.text();
        for event in self.events() {
            match event {
                TreeEvent::Enter { kind, error } => {
                    write!(buf, "{:indent$}{}", "", names(kind)).ok();
                    if let Some(message) = error {
                        write!(buf, " error: {message}").ok();
                    }
                    buf.push('\n');
                    indent += 2;
                }
                TreeEvent::Leave => indent -= 2,
                TreeEvent::Token { kind, range } => {
                    let text = &text[range];
                    writeln!(buf, "{:indent$}{}@{range:?} {text:?}", "", names(kind)).ok();
                }
                TreeEvent::Error { message, offset } => {
                    writeln!(buf, "{:indent$}error@{offset:?}: {message}", "").ok();
                }
            }
        }
        buf
    }
}

impl Index<usize> for ProductionResult {
    type Output = ProductionEntry;

    fn index(&self, position: usize) -> &ProductionEntry {
        &self.entries[position]
    }
}

impl<'a> IntoIterator for &'a ProductionResult {
    type Item = &'a ProductionEntry;
    type IntoIter = std::slice::Iter<'a, ProductionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEvent<'a> {
    Enter { kind: SyntaxKind, error: Option<&'a str> },
    Token { kind: SyntaxKind, range: TextRange },
    Leave,
    Error { message: &'a str, offset: TextSize },
}
