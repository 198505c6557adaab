//! Error types for the scheme compiler.

/// Result type alias for dump operations.
pub type Result<T> = std::result::Result<T, DumpError>;

/// A recoverable syntax error recorded while parsing.
///
/// The parser never stops at the first problem: it records a `ParseError`,
/// skips the malformed construct and keeps going, so one run can surface
/// several independent issues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at {line}:{column}: {reason}")]
pub struct ParseError {
    /// 1-based source line of the offending construct.
    pub line: u32,
    /// 1-based source column of the offending construct.
    pub column: u32,
    /// Human-readable description of what went wrong.
    pub reason: String,
}

impl ParseError {
    /// Create a parse error at the given source position.
    pub fn new(reason: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            reason: reason.into(),
        }
    }
}

/// A fatal validation error raised while dumping a parsed stylesheet.
///
/// Dumping is all-or-nothing: the first `DumpError` aborts the document
/// build and no partial document is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dump error at {line}:{column}, {reason}")]
pub struct DumpError {
    /// 1-based source line of the offending construct.
    pub line: u32,
    /// 1-based source column of the offending construct.
    pub column: u32,
    /// Human-readable description of what went wrong.
    pub reason: String,
    /// Selector/property context (e.g. `"string.quoted; foreground"`) for
    /// mapping the error back to source, when available.
    pub location: Option<String>,
}

impl DumpError {
    /// Create a dump error at the given source position.
    pub fn new(reason: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            reason: reason.into(),
            location: None,
        }
    }

    /// Attach a selector/property location string.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let e = ParseError::new("expected ':'", 3, 7);
        assert_eq!(e.to_string(), "parse error at 3:7: expected ':'");
    }

    #[test]
    fn dump_error_display_and_location() {
        let e = DumpError::new("Only one *-rule allowed", 5, 1);
        assert_eq!(e.to_string(), "dump error at 5:1, Only one *-rule allowed");
        assert_eq!(e.location, None);

        let e = e.with_location("string; foreground");
        assert_eq!(e.location.as_deref(), Some("string; foreground"));
    }
}
