//! Error types for the literate system.

use thiserror::Error;

use crate::model::{root_label, BlockKey, Placement};
use crate::text_location::SourceLocation;

/// Main error type for literate operations.
///
/// Every registry and tangle failure is fatal for the build: callers surface
/// the message and abort.
#[derive(Error, Debug)]
pub enum LiterateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Invalid block title '{raw}': {message}")]
    MalformedTitle { raw: String, message: String },

    #[error("Invalid block reference '{raw}' in {location}: {message}")]
    MalformedReference {
        raw: String,
        location: SourceLocation,
        message: String,
    },

    #[error("Invalid block name '{name}' in {location}: {message}")]
    InvalidName {
        name: String,
        location: SourceLocation,
        message: String,
    },

    #[error(
        "Multiple literate blocks with the same name {key} were found:\n  - In {first}.\n  - In {second}."
    )]
    DuplicateBlock {
        key: BlockKey,
        first: SourceLocation,
        second: SourceLocation,
    },

    #[error("Blocks modify a literate block that was never defined:\n{}", .0.join("\n"))]
    DanglingOverride(Vec<String>),

    #[error(
        "Attempting to set the tangle parent for root '{root}' to a different value:\n  Was set to '{existing}' in {existing_location}.\n  But trying to set to '{requested}' in {location}."
    )]
    HierarchyConflict {
        root: String,
        existing: String,
        existing_location: SourceLocation,
        requested: String,
        location: SourceLocation,
    },

    #[error("Tangle root '{root}' cannot be its own parent (in {location})")]
    SelfParent {
        root: String,
        location: SourceLocation,
    },

    #[error("Setting '{parent}' as parent of '{root}' creates a cycle in the tangle hierarchy (in {location})")]
    HierarchyCycle {
        root: String,
        parent: String,
        location: SourceLocation,
    },

    #[error("Invalid tangle hierarchy declaration in {location}: {message}")]
    InvalidHierarchy {
        location: SourceLocation,
        message: String,
    },

    #[error(
        "Literate block not found: '{reference}' (referenced by '{referencer}' from {location}, tangling {})",
        root_label(.tangle_root.as_deref())
    )]
    UnresolvedReference {
        reference: String,
        referencer: String,
        location: SourceLocation,
        tangle_root: Option<String>,
    },

    #[error("Literate block not found: '{name}' ({context}in {})", root_label(.tangle_root.as_deref()))]
    BlockNotFound {
        name: String,
        tangle_root: Option<String>,
        context: String,
    },

    #[error(
        "Insertion point not found: no line of {target} contains \"{pattern}\" (INSERT {placement} from {location})"
    )]
    UnmatchedInsertion {
        target: BlockKey,
        placement: Placement,
        pattern: String,
        location: SourceLocation,
    },

    #[error("Cycle detected in references: {}", .0.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(" -> "))]
    CycleDetected(Vec<BlockKey>),

    #[error("Registry integrity error: {0}")]
    Integrity(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for literate operations.
pub type Result<T> = std::result::Result<T, LiterateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message_names_both_sides() {
        let err = LiterateError::DuplicateBlock {
            key: BlockKey::build("main", None),
            first: SourceLocation::new("intro", 3),
            second: SourceLocation::new("later", 12),
        };
        let message = err.to_string();
        assert!(message.contains("document 'intro', line 3"));
        assert!(message.contains("document 'later', line 12"));
    }

    #[test]
    fn test_block_not_found_mentions_root() {
        let err = LiterateError::BlockNotFound {
            name: "file:main.c".to_string(),
            tangle_root: Some("step1".to_string()),
            context: String::new(),
        };
        assert!(err.to_string().contains("root 'step1'"));
    }
}
