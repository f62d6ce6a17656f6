//! Rich diagnostic rendering
//!
//! Renders collected messages with source snippets through codespan-reporting.

use super::messages::Severity;
use super::reporter::ReportedMessage;
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity as CsSeverity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{self, Config};
use termcolor::Buffer;

/// Source files available for snippets
pub struct SourceFiles {
    files: SimpleFiles<String, String>,
    ids: Vec<String>,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFiles {
    /// Create an empty file set
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            ids: Vec::new(),
        }
    }

    /// Add a file under the path messages refer to it by
    pub fn add(&mut self, path: impl Into<String>, source: impl Into<String>) {
        let path = path.into();
        self.files.add(path.clone(), source.into());
        self.ids.push(path);
    }

    fn id_of(&self, path: &str) -> Option<usize> {
        self.ids.iter().position(|p| p == path)
    }
}

/// Build the codespan diagnostic for a message
pub fn to_diagnostic(message: &ReportedMessage, files: &SourceFiles) -> Diagnostic<usize> {
    let severity = if message.is_internal_error() {
        CsSeverity::Bug
    } else {
        match message.severity {
            Severity::Error => CsSeverity::Error,
            Severity::Warning => CsSeverity::Warning,
            Severity::Info => CsSeverity::Note,
        }
    };

    let mut diagnostic = Diagnostic::new(severity)
        .with_code(message.code)
        .with_message(message.text.clone());

    let span = message.location.span;
    if let Some(file_id) = files.id_of(&message.location.file) {
        if span.end > span.start {
            diagnostic = diagnostic.with_labels(vec![Label::primary(file_id, span.start..span.end)]);
        }
    } else {
        diagnostic = diagnostic.with_notes(vec![format!("at {}", message.location)]);
    }
    diagnostic
}

/// Render messages without color
pub fn render_diagnostics(
    messages: &[ReportedMessage],
    files: &SourceFiles,
) -> Result<String, codespan_reporting::files::Error> {
    let mut buffer = Buffer::no_color();
    let config = Config::default();
    for message in messages {
        term::emit(&mut buffer, &config, &files.files, &to_diagnostic(message, files))?;
    }
    Ok(String::from_utf8_lossy(buffer.as_slice()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::messages;
    use crate::compiler::reporter::{CollectingErrorReporter, ErrorReporter};
    use crate::source::{Location, Span};

    #[test]
    fn test_render_with_snippet() {
        let source = "class A {\n    void M() { goto end; }\n}\n";
        let start = source.find("goto").unwrap();
        let mut files = SourceFiles::new();
        files.add("A.cs", source);

        let mut reporter = CollectingErrorReporter::new();
        reporter.set_location(Location::new("A.cs", Span::new(start, start + 9, 2, 16)));
        reporter.message(&messages::UNSUPPORTED_CONSTRUCT, &["goto".to_string()]);

        let text = render_diagnostics(reporter.messages(), &files).unwrap();
        assert!(text.contains("error[SC7001]: Unsupported construct: goto."));
        assert!(text.contains("A.cs:2:16"));
    }

    #[test]
    fn test_internal_error_without_source() {
        let mut reporter = CollectingErrorReporter::new();
        reporter.internal_error("lost");
        let diag = to_diagnostic(&reporter.messages()[0], &SourceFiles::new());
        assert_eq!(diag.severity, CsSeverity::Bug);
        assert!(diag.labels.is_empty());
        assert_eq!(diag.notes, vec!["at (1,1)".to_string()]);
    }
}
