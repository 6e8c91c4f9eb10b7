//! Sink for reports about misuse of the builder API.

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

/// Extra context shipped with a record, such as the source text being parsed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    pub name: String,
    pub content: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { name: name.into(), content: content.into() }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    pub attachment: Option<Attachment>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into(), attachment: None }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.severity, self.message)?;
        if let Some(attachment) = &self.attachment {
            write!(f, "\n--- {} ---\n{}", attachment.name, attachment.content)?;
        }
        Ok(())
    }
}

pub trait Logger {
    fn log(&self, record: &LogRecord);
}

impl<F> Logger for F
where
    F: Fn(&LogRecord),
{
    fn log(&self, record: &LogRecord) {
        self(record)
    }
}

/// Forwards records to the `tracing` facade. Installing a subscriber is left
/// to the application.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, record: &LogRecord) {
        let attachment = record.attachment.as_ref().map(|it| it.name.as_str());
        let message = &record.message;
        match record.severity {
            Severity::Error => tracing::error!(attachment, "{message}"),
            Severity::Warn => tracing::warn!(attachment, "{message}"),
            Severity::Info => tracing::info!(attachment, "{message}"),
            Severity::Debug => tracing::debug!(attachment, "{message}"),
        }
        if let Some(attachment) = &record.attachment {
            tracing::trace!(name = %attachment.name, content = %attachment.content, "attachment");
        }
    }
}
