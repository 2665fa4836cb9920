//! Registry keys for literate blocks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the tangle root and the block name inside a key.
///
/// Block names must not contain it.
pub const KEY_SEPARATOR: &str = "##";

/// Prefix of block names that designate an output file.
pub const FILE_PREFIX: &str = "file:";

/// Identifies a block chain inside a registry: `tangle_root##name`.
///
/// The default tangle root is encoded as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockKey(String);

impl BlockKey {
    /// Builds the key of block `name` in `tangle_root`.
    pub fn build(name: &str, tangle_root: Option<&str>) -> Self {
        Self(format!(
            "{}{}{}",
            tangle_root.unwrap_or(""),
            KEY_SEPARATOR,
            name
        ))
    }

    /// Returns the raw key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the tangle root part, `None` for the default root.
    pub fn tangle_root(&self) -> Option<&str> {
        match self.0.split_once(KEY_SEPARATOR) {
            Some(("", _)) | None => None,
            Some((root, _)) => Some(root),
        }
    }

    /// Returns the block name part.
    pub fn name(&self) -> &str {
        match self.0.split_once(KEY_SEPARATOR) {
            Some((_, name)) => name,
            None => &self.0,
        }
    }

    /// Checks if this key designates an output file.
    pub fn is_file_target(&self) -> bool {
        is_file_target(self.name())
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tangle_root() {
            Some(root) => write!(f, "'{}' (in root '{}')", self.name(), root),
            None => write!(f, "'{}'", self.name()),
        }
    }
}

/// Normalizes a tangle root: empty strings denote the default root.
pub fn normalize_root(root: Option<String>) -> Option<String> {
    root.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())
}

/// Human readable label of a tangle root for messages.
pub fn root_label(root: Option<&str>) -> String {
    match root {
        Some(root) => format!("root '{}'", root),
        None => "the default root".to_string(),
    }
}

/// Checks if a block name designates an output file (starts with `file:`).
pub fn is_file_target(name: &str) -> bool {
    name.starts_with(FILE_PREFIX)
}

/// Returns the relative output path of a `file:` block name, trimmed.
pub fn file_path(name: &str) -> Option<&str> {
    name.strip_prefix(FILE_PREFIX).map(str::trim)
}
