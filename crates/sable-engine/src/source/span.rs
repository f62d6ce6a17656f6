//! Source positions

use std::fmt;
use std::sync::Arc;

/// A byte range in a source file together with its 1-based start position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Line of the start offset (1-based)
    pub line: u32,
    /// Column of the start offset (1-based)
    pub column: u32,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Length of the span in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A span inside a named source file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Path of the source file as reported to the user
    pub file: Arc<str>,
    /// Position inside the file
    pub span: Span,
}

impl Location {
    /// Create a new location
    pub fn new(file: impl Into<Arc<str>>, span: Span) -> Self {
        Self {
            file: file.into(),
            span,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            file: Arc::from(""),
            span: Span::default(),
        }
    }
}

/// Formats as `file(line,col)`; an unset position prints as `(1,1)`
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{})",
            self.file,
            self.span.line.max(1),
            self.span.column.max(1)
        )
    }
}
