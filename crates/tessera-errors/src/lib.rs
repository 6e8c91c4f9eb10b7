//! Diagnostics for recoverable parse errors and the logging sink used for
//! internal consistency reports.

mod diagnostic;
mod logger;

pub use annotate_snippets::Renderer;
pub use diagnostic::Diagnostic;
pub use logger::{Attachment, LogRecord, Logger, Severity, TracingLogger};
pub use text_size::TextRange;
