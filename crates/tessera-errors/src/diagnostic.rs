use std::fmt::Display;

use annotate_snippets::{Level, Renderer, Snippet};
use text_size::TextRange;

/// A recoverable error embedded in a production, located in the source text.
///
/// An empty range is an error between two tokens; a non-empty one covers an
/// error node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    message: String,
    range: TextRange,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, range: TextRange) -> Self {
        Self { message: message.into(), range }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    fn label(&self) -> &'static str {
        if self.range.is_empty() { "expected here" } else { "in this node" }
    }

    pub fn render<'a>(
        &'a self,
        renderer: &'a Renderer,
        path: &'a str,
        text: &'a str,
    ) -> impl Display + 'a {
        let annotation = Level::Error.span(self.range.into()).label(self.label());
        let snippet = Snippet::source(text).origin(path).annotation(annotation).fold(true);
        renderer.render(Level::Error.title(&self.message).snippet(snippet))
    }
}
