use std::panic::Location;
use std::sync::Arc;

use tessera_errors::{Attachment, LogRecord, Logger, Severity, TracingLogger};
use tessera_syntax::{SyntaxKind, SyntaxSet, TokenStream};
use text_size::{TextRange, TextSize};

use crate::arena::MarkerId;
use crate::attributes::Edge;
use crate::balancer::balance;
use crate::binder::{Binder, DefaultRightBinder};
use crate::cancel::Cancelled;
use crate::config::BuilderConfig;
use crate::cursor::{TokenCursor, TokenRemapper};
use crate::marker::{CompletedMarker, Marker, MarkerRef};
use crate::production::{CheckFailure, Production};
use crate::result::ProductionResult;
use crate::violation::Violation;

/// Number of raw advances between two cancellation checks. `advance` and
/// rollbacks check every time.
const CANCELLATION_POLL_INTERVAL: u32 = 256;

/// Records the node boundaries a recursive-descent parser declares over a
/// token stream.
///
/// ```ignore
/// let mut b = Builder::new(tokens, config);
/// let root = b.mark();
/// while !b.eof() {
///     let m = b.mark();
///     b.advance();
///     m.done(&mut b, ITEM);
/// }
/// root.done(&mut b, FILE);
/// let result = b.finish();
/// ```
pub struct Builder<'a> {
    cursor: TokenCursor<'a>,
    production: Production,
    config: BuilderConfig,
    logger: Box<dyn Logger + 'a>,
    cancellation: Option<Box<dyn Fn() -> bool + 'a>>,
    advances_since_poll: u32,
    violations: Vec<Violation>,
    result: Option<ProductionResult>,
}

impl<'a> Builder<'a> {
    pub fn new(tokens: TokenStream, config: BuilderConfig) -> Self {
        Self {
            cursor: TokenCursor::new(tokens, config.whitespace, config.comments),
            production: Production::default(),
            config,
            logger: Box::new(TracingLogger),
            cancellation: None,
            advances_since_poll: 0,
            violations: Vec::new(),
            result: None,
        }
    }

    pub fn with_logger(mut self, logger: impl Logger + 'a) -> Self {
        self.logger = Box::new(logger);
        self
    }

    /// Installs a check that aborts the build by unwinding with
    /// [`Cancelled`] once it returns `true`. Use [`Cancelled::catch`] around
    /// the parse to get it back as an error.
    pub fn with_cancellation(mut self, is_cancelled: impl Fn() -> bool + 'a) -> Self {
        self.cancellation = Some(Box::new(is_cancelled));
        self
    }

    pub fn set_token_remapper(&mut self, remapper: impl TokenRemapper + 'a) {
        self.cursor.set_remapper(Box::new(remapper));
    }

    /// Replaces the comment set for the rest of the parse, including the
    /// balancing at the end.
    pub fn enforce_comment_tokens(&mut self, comments: SyntaxSet) {
        self.invalidate_result();
        self.config.comments = comments;
        self.cursor.set_comments(comments);
    }

    /// Calls `callback` for every whitespace or comment token the cursor
    /// skips.
    pub fn set_whitespace_skipped_callback(
        &mut self,
        callback: impl FnMut(SyntaxKind, TextRange) + 'a,
    ) {
        self.cursor.set_whitespace_skipped_callback(Box::new(callback));
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStream {
        self.cursor.tokens()
    }

    /// Misuse reports collected so far.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn token_type(&mut self) -> Option<SyntaxKind> {
        self.cursor.token_type()
    }

    pub fn at(&mut self, kind: SyntaxKind) -> bool {
        self.token_type() == Some(kind)
    }

    pub fn eof(&mut self) -> bool {
        self.cursor.eof()
    }

    pub fn advance(&mut self) {
        if self.config.debug && !self.cursor.was_inspected() {
            self.log(LogRecord::new(Severity::Warn, "eating token without its type checking"));
        }
        self.cursor.advance();
        self.poll_cancellation();
    }

    pub fn raw_advance(&mut self, steps: usize) {
        self.cursor.raw_advance(steps);
        self.poll_cancellation_every_interval();
    }

    pub fn look_ahead(&mut self, steps: usize) -> Option<SyntaxKind> {
        self.cursor.look_ahead(steps)
    }

    pub fn raw_lookup(&self, steps: isize) -> Option<SyntaxKind> {
        self.cursor.raw_lookup(steps)
    }

    pub fn raw_token_type_start(&self, steps: isize) -> Option<TextSize> {
        self.cursor.raw_token_type_start(steps)
    }

    pub fn raw_token_index(&self) -> usize {
        self.cursor.raw_token_index()
    }

    /// Start offset of the token at `index`, or the text length past the end.
    pub fn raw_token_offset(&self, index: usize) -> TextSize {
        self.tokens().start(index.min(self.tokens().len()))
    }

    pub fn current_offset(&mut self) -> TextSize {
        self.cursor.current_offset()
    }

    pub fn token_text(&mut self) -> Option<&str> {
        self.cursor.token_text()
    }

    pub fn remap_current_token(&mut self, kind: SyntaxKind) {
        self.cursor.remap_current_token(kind);
    }

    /// Opens a node at the current token.
    #[track_caller]
    pub fn mark(&mut self) -> Marker {
        self.invalidate_result();
        if !self.production.is_empty() {
            self.cursor.skip_whitespace();
        }
        let id = self.production.alloc_range(self.cursor.raw_token_index() as u32);
        self.production.add_marker(id);
        self.record_allocation_site(id, Location::caller());
        Marker::new(id)
    }

    /// Records an error between the previous token and the current one.
    ///
    /// A second error at the same token right after the first is dropped.
    pub fn error(&mut self, message: impl Into<Box<str>>) {
        let index = self.cursor.raw_token_index() as u32;
        if let Some(&last) = self.production.entries().last() {
            if self.production.is_error_entry(last) && self.production.arena.lexeme(last) == index {
                return;
            }
        }
        self.invalidate_result();
        let id = self.production.alloc_error(index, message.into());
        self.production.add_marker(id);
    }

    pub fn has_errors_after(&self, marker: &impl MarkerRef) -> bool {
        self.production.has_errors_after(marker.id())
    }

    pub fn last_done_marker(&self) -> Option<CompletedMarker> {
        let id = self.production.last_done_marker()?;
        Some(CompletedMarker::new(id, self.production.arena.range(id).kind))
    }

    /// Overrides how the trivia around the node's edges is attached.
    /// `None` keeps the configured default for that edge.
    #[track_caller]
    pub fn set_edge_binders(
        &mut self,
        marker: &impl MarkerRef,
        left: Option<Binder>,
        right: Option<Binder>,
    ) {
        let id = marker.id();
        assert!(self.production.arena.is_live(id), "{id:?} was disposed");
        self.invalidate_result();
        let slot = id.slot();
        if let Some(left) = left {
            self.production.attributes.set_binder(slot, Edge::Left, left);
        }
        if let Some(right) = right {
            self.production.attributes.set_binder(slot, Edge::Right, right);
        }
    }

    pub(crate) fn close(
        &mut self,
        id: MarkerId,
        kind: SyntaxKind,
        before: Option<MarkerId>,
        message: Option<Box<str>>,
    ) {
        self.invalidate_result();
        if self.config.debug {
            if let Err(failure) = self.production.check_done(id, before) {
                self.report_failure(failure);
            }
        }
        if kind == self.config.error_kind && message.is_none() {
            self.log(LogRecord::new(
                Severity::Warn,
                "error nodes without a message are discouraged, use `error` instead",
            ));
        }

        let end = match before {
            Some(before) => self.production.arena.lexeme(before.slot() as i32),
            None => self.cursor.raw_token_index() as u32,
        };
        let start = self.production.arena.range(id).start;
        let slot = id.slot();

        let ties_left = message.is_some() || self.config.left_bound.contains(kind);
        if ties_left && self.cursor.is_empty(start as usize, end as usize) {
            self.production.attributes.set_binder(slot, Edge::Left, Arc::new(DefaultRightBinder));
        }
        if let Some(message) = message {
            self.production.attributes.set_error_message(slot, message);
        }

        let marker = self.production.arena.range_mut(id);
        marker.end = Some(end);
        marker.kind = kind;
        self.production.add_done(id, before);
    }

    pub(crate) fn collapse(&mut self, id: MarkerId, kind: SyntaxKind) {
        self.close(id, kind, None, None);
        self.production.attributes.mark_collapsed(id.slot());
    }

    #[track_caller]
    pub(crate) fn precede(&mut self, anchor: MarkerId) -> Marker {
        self.invalidate_result();
        let start = self.production.arena.range(anchor).start;
        let id = self.production.alloc_range(start);
        self.production.add_before(id, anchor);
        self.record_allocation_site(id, Location::caller());
        Marker::new(id)
    }

    pub(crate) fn drop_marker(&mut self, id: MarkerId) {
        self.invalidate_result();
        if self.config.debug {
            if let Err(failure) = self.production.check_drop(id) {
                self.report_failure(failure);
            }
        }
        self.production.drop_marker(id);
    }

    pub(crate) fn rollback_to(&mut self, id: MarkerId) {
        self.poll_cancellation();
        self.invalidate_result();
        let start = self.production.arena.range(id).start;
        self.production.rollback_to(id);
        self.cursor.reset_to(start as usize);
    }

    /// Balances whitespace, validates the production and returns the result.
    ///
    /// The result is computed once and reused until the production changes.
    pub fn prepare_production(&mut self) -> &ProductionResult {
        let result = match self.result.take() {
            Some(result) => result,
            None => self.build_result(),
        };
        self.result.insert(result)
    }

    pub fn finish(mut self) -> ProductionResult {
        match self.result.take() {
            Some(result) => result,
            None => self.build_result(),
        }
    }

    fn build_result(&mut self) -> ProductionResult {
        let error_kind = self.config.error_kind;
        if self.production.is_empty() {
            let text = Attachment::new("text", self.cursor.tokens().text());
            self.report(Violation::EmptyProduction, Some(text));
            return ProductionResult::new(&self.production, self.tokens().clone(), error_kind);
        }

        self.cursor.skip_whitespace();
        self.cursor.mark_checked();
        balance(&mut self.production, self.cursor.tokens(), &self.config);

        if !self.is_balanced() {
            let text = Attachment::new("text", self.cursor.tokens().text());
            self.report(Violation::Unbalanced, Some(text));
        }

        let tokens = self.cursor.tokens().clone();
        let current = self.cursor.raw_token_index();
        if current < tokens.len() {
            let kinds = tokens.kinds()[current..].to_vec();
            self.report(Violation::TokensNotInserted { kinds }, None);
        }

        if let Some((root, root_end)) = self.root() {
            if root_end < tokens.len() {
                let kinds = tokens.kinds()[root_end..].to_vec();
                self.report(Violation::TokensOutsideRoot { kinds, root }, None);
            }
        }

        let (entries, markers) = (self.production.len(), self.production.arena.capacity());
        tracing::debug!(entries, markers, tokens = tokens.len(), "production prepared");
        ProductionResult::new(&self.production, tokens, error_kind)
    }

    /// Kind and end of the first marker, if the last entry closes it.
    fn root(&self) -> Option<(SyntaxKind, usize)> {
        let first = self.production.entry(0);
        let last = self.production.len() - 1;
        if self.production.is_error_entry(first) || self.production.entry(last) != -first {
            return None;
        }
        let root = self.production.arena.id_of(first.unsigned_abs());
        Some((self.production.arena.range(root).kind, self.production.lexeme_at(last) as usize))
    }

    /// Every close matches the innermost open marker and the first marker
    /// encloses all others.
    fn is_balanced(&self) -> bool {
        let entries = self.production.entries();
        let mut stack = Vec::new();
        for (index, &entry) in entries.iter().enumerate() {
            if entry > 0 {
                if !self.production.is_error_entry(entry) {
                    stack.push(entry);
                }
            } else if stack.pop() != Some(-entry) {
                return false;
            }
            if stack.is_empty() && index + 1 != entries.len() {
                return false;
            }
        }
        stack.is_empty()
    }

    /// Drops the prepared result. Preparing again balances the already
    /// rebound edges a second time, which is reported.
    fn invalidate_result(&mut self) {
        if self.result.take().is_some() {
            self.log(LogRecord::new(
                Severity::Warn,
                "production modified after it was prepared; edges will be rebound again",
            ));
        }
    }

    fn record_allocation_site(&mut self, id: MarkerId, site: &'static Location<'static>) {
        if self.config.debug {
            self.production.attributes.set_allocation_site(id.slot(), site);
        }
    }

    fn poll_cancellation_every_interval(&mut self) {
        self.advances_since_poll += 1;
        if self.advances_since_poll >= CANCELLATION_POLL_INTERVAL {
            self.advances_since_poll = 0;
            self.poll_cancellation();
        }
    }

    fn poll_cancellation(&self) {
        if let Some(is_cancelled) = &self.cancellation {
            if is_cancelled() {
                tracing::debug!(token = self.cursor.raw_token_index(), "parsing cancelled");
                Cancelled::throw();
            }
        }
    }

    fn log(&self, record: LogRecord) {
        self.logger.log(&record);
    }

    fn report(&mut self, violation: Violation, attachment: Option<Attachment>) {
        let mut record = LogRecord::new(Severity::Error, violation.to_string());
        if let Some(attachment) = attachment {
            record = record.with_attachment(attachment);
        }
        self.log(record);
        self.violations.push(violation);
    }

    fn report_failure(&mut self, failure: CheckFailure) {
        let attributes = &self.production.attributes;
        let site = failure.culprit.and_then(|slot| attributes.allocation_site(slot));
        let attachment = site.map(|site| Attachment::new("allocation site", site.to_string()));
        self.report(failure.violation, attachment);
    }
}
