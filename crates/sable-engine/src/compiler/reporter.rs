//! Error sink
//!
//! The core reports through [`ErrorReporter`] and owns no diagnostic storage
//! of its own. Reporters keep a current location that every subsequent
//! message is attributed to.

use super::messages::{self, Message, Severity};
use crate::source::Location;
use parking_lot::Mutex;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;

/// Destination for diagnostics
pub trait ErrorReporter {
    /// Set the location subsequent messages refer to
    fn set_location(&mut self, location: Location);

    /// The current location
    fn location(&self) -> &Location;

    /// Report a catalog message with positional arguments
    fn message(&mut self, message: &Message, args: &[String]);

    /// Report a compiler defect
    fn internal_error(&mut self, text: &str) {
        self.message(&messages::INTERNAL_ERROR, &[text.to_string()]);
    }

    /// Report a compiler defect caused by `error`, including its source chain
    fn internal_error_from(&mut self, error: &dyn Error, context: Option<&str>) {
        let mut text = match context {
            Some(context) => format!("{}: ", context),
            None => String::new(),
        };
        text.push_str(&error_chain(error));
        self.internal_error(&text);
    }
}

/// `error: cause: cause` for an error and its sources
pub fn error_chain(error: &dyn Error) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// A reported message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedMessage {
    /// Effective severity
    pub severity: Severity,
    /// Diagnostic code
    pub code: &'static str,
    /// Formatted text
    pub text: String,
    /// Location current when the message was reported
    pub location: Location,
}

impl ReportedMessage {
    fn new(message: &Message, args: &[String], location: &Location, promote_warnings: bool) -> Self {
        let severity = match message.severity {
            Severity::Warning if promote_warnings => Severity::Error,
            other => other,
        };
        Self {
            severity,
            code: message.code,
            text: message.format(args),
            location: location.clone(),
        }
    }

    /// Check whether this message reports a compiler defect
    pub fn is_internal_error(&self) -> bool {
        self.code == messages::INTERNAL_ERROR.code
    }

    /// JSON form for tooling
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "severity": self.severity.to_string(),
            "code": self.code,
            "message": self.text,
            "file": &*self.location.file,
            "line": self.location.span.line,
            "column": self.location.span.column,
        })
    }
}

impl std::fmt::Display for ReportedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {}: {}",
            self.location, self.severity, self.code, self.text
        )
    }
}

// ============================================================================
// Text reporter
// ============================================================================

/// Writes one line per message: `path(line,col): severity code: text`
#[derive(Debug)]
pub struct TextErrorReporter<W: Write> {
    writer: W,
    location: Location,
    promote_warnings: bool,
    error_count: usize,
}

impl<W: Write> TextErrorReporter<W> {
    /// Create a reporter writing to `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            location: Location::default(),
            promote_warnings: false,
            error_count: 0,
        }
    }

    /// Report warnings as errors
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.promote_warnings = enabled;
        self
    }

    /// Number of error-severity messages written
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Consume the reporter and return the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ErrorReporter for TextErrorReporter<W> {
    fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn message(&mut self, message: &Message, args: &[String]) {
        let reported = ReportedMessage::new(message, args, &self.location, self.promote_warnings);
        if reported.severity == Severity::Error {
            self.error_count += 1;
        }
        if let Err(e) = writeln!(self.writer, "{}", reported) {
            tracing::warn!(error = %e, code = reported.code, "failed to write diagnostic");
        }
    }
}

// ============================================================================
// Collecting reporters
// ============================================================================

/// Keeps every message in report order
#[derive(Debug, Default)]
pub struct CollectingErrorReporter {
    messages: Vec<ReportedMessage>,
    location: Location,
    promote_warnings: bool,
}

impl CollectingErrorReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Report warnings as errors
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.promote_warnings = enabled;
        self
    }

    /// Messages in report order
    pub fn messages(&self) -> &[ReportedMessage] {
        &self.messages
    }

    /// Check whether any error or internal error was reported
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    /// Check whether any compiler defect was reported
    pub fn has_internal_errors(&self) -> bool {
        self.messages.iter().any(ReportedMessage::is_internal_error)
    }
}

impl ErrorReporter for CollectingErrorReporter {
    fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn message(&mut self, message: &Message, args: &[String]) {
        self.messages.push(ReportedMessage::new(
            message,
            args,
            &self.location,
            self.promote_warnings,
        ));
    }
}

/// A collecting reporter whose clones append to the same message list
///
/// Each clone keeps its own current location, so bodies compiled on
/// different threads attribute their messages correctly.
#[derive(Debug, Clone, Default)]
pub struct SharedErrorReporter {
    messages: Arc<Mutex<Vec<ReportedMessage>>>,
    location: Location,
    promote_warnings: bool,
}

impl SharedErrorReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Report warnings as errors
    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.promote_warnings = enabled;
        self
    }

    /// Snapshot of all messages reported through any clone
    pub fn messages(&self) -> Vec<ReportedMessage> {
        self.messages.lock().clone()
    }

    /// Check whether any error or internal error was reported
    pub fn has_errors(&self) -> bool {
        self.messages
            .lock()
            .iter()
            .any(|m| m.severity == Severity::Error)
    }
}

impl ErrorReporter for SharedErrorReporter {
    fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn message(&mut self, message: &Message, args: &[String]) {
        let reported = ReportedMessage::new(message, args, &self.location, self.promote_warnings);
        self.messages.lock().push(reported);
    }
}
