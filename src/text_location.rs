//! Source location tracking for error reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Represents the place in the documentation sources where a block or a
/// hierarchy declaration was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Name of the document (path relative to the source directory, without
    /// extension).
    pub docname: String,
    /// Line number (1-indexed, 0 when unknown).
    pub lineno: usize,
}

impl SourceLocation {
    /// Creates a new SourceLocation.
    pub fn new(docname: impl Into<String>, lineno: usize) -> Self {
        Self {
            docname: docname.into(),
            lineno,
        }
    }

    /// Creates a location with only line information.
    pub fn line_only(lineno: usize) -> Self {
        Self {
            docname: String::new(),
            lineno,
        }
    }

    /// Returns a new location with an updated document name.
    pub fn with_docname(mut self, docname: impl Into<String>) -> Self {
        self.docname = docname.into();
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.docname.is_empty() {
            write!(f, "line {}", self.lineno)
        } else {
            write!(f, "document '{}', line {}", self.docname, self.lineno)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_docname() {
        let loc = SourceLocation::new("chapter/intro", 10);
        assert_eq!(format!("{}", loc), "document 'chapter/intro', line 10");
    }

    #[test]
    fn test_display_without_docname() {
        let loc = SourceLocation::line_only(42);
        assert_eq!(format!("{}", loc), "line 42");
    }

    #[test]
    fn test_with_docname() {
        let loc = SourceLocation::line_only(7).with_docname("setup");
        assert_eq!(loc.docname, "setup");
        assert_eq!(loc.lineno, 7);
    }
}
