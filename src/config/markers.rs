//! Reference delimiters.

use serde::{Deserialize, Serialize};

use crate::errors::{LiterateError, Result};

/// Delimiters surrounding a block reference inside block content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markers {
    /// Opening delimiter.
    #[serde(default = "default_begin")]
    pub begin: String,

    /// Closing delimiter.
    #[serde(default = "default_end")]
    pub end: String,
}

fn default_begin() -> String {
    "{{".to_string()
}

fn default_end() -> String {
    "}}".to_string()
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            begin: default_begin(),
            end: default_end(),
        }
    }
}

impl Markers {
    /// Creates a new delimiter pair.
    pub fn new(begin: &str, end: &str) -> Self {
        Self {
            begin: begin.to_string(),
            end: end.to_string(),
        }
    }

    /// Checks that both delimiters are non-empty and distinct.
    pub fn validate(&self) -> Result<()> {
        if self.begin.is_empty() || self.end.is_empty() {
            return Err(LiterateError::Config(
                "reference delimiters cannot be empty".to_string(),
            ));
        }
        if self.begin == self.end {
            return Err(LiterateError::Config(format!(
                "reference delimiters must differ, both are '{}'",
                self.begin
            )));
        }
        Ok(())
    }

    /// Wraps a block name in the delimiters.
    pub fn format_reference(&self, name: &str) -> String {
        format!("{}{}{}", self.begin, name, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markers() {
        let markers = Markers::default();
        assert_eq!(markers.begin, "{{");
        assert_eq!(markers.end, "}}");
        assert!(markers.validate().is_ok());
        assert_eq!(markers.format_reference("main"), "{{main}}");
    }

    #[test]
    fn test_invalid_markers() {
        assert!(Markers::new("", "}}").validate().is_err());
        assert!(Markers::new("@@", "@@").validate().is_err());
        assert!(Markers::new("<<", ">>").validate().is_ok());
    }
}
