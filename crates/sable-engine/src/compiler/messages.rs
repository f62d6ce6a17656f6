//! Message catalog
//!
//! Every diagnostic the core can emit, with its stable code.

use std::fmt;

/// Message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A catalog entry: severity, stable code and a `{0}`-style format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    /// Default severity
    pub severity: Severity,
    /// Stable diagnostic code
    pub code: &'static str,
    /// Format string with positional `{n}` placeholders
    pub format: &'static str,
}

impl Message {
    /// Substitute `args` into the format string
    pub fn format(&self, args: &[String]) -> String {
        let mut out = String::with_capacity(self.format.len());
        let mut rest = self.format;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let substituted = after.find('}').and_then(|close| {
                let index: usize = after[..close].parse().ok()?;
                Some((args.get(index)?, close))
            });
            match substituted {
                Some((arg, close)) => {
                    out.push_str(arg);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// A source construct the statement compiler does not lower
pub const UNSUPPORTED_CONSTRUCT: Message = Message {
    severity: Severity::Error,
    code: "SC7001",
    format: "Unsupported construct: {0}.",
};

/// Internal error text for a declarator whose variable has no descriptor
pub fn missing_variable_descriptor(name: &str) -> String {
    format!("Variable declarator for '{}' has no variable descriptor.", name)
}

/// Compiler defect
pub const INTERNAL_ERROR: Message = Message {
    severity: Severity::Error,
    code: "SC7999",
    format: "Internal error: {0}",
};
