//! References from one block to another.

use serde::{Deserialize, Serialize};

use super::block_key::{normalize_root, BlockKey};

/// Per-reference options written after the referenced name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LinkOption {
    /// Do not draw the link in rendered output. Tangling ignores it.
    Hidden,
}

/// A parsed `{{name}}` occurrence.
///
/// The reference is resolved relative to the tangle root of the block that
/// contains it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockLink {
    /// Referenced block name.
    pub name: String,
    /// Tangle root of the referencing block.
    pub tangle_root: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<LinkOption>,
}

impl BlockLink {
    /// Creates a link to `name` from a block living in `tangle_root`.
    pub fn new(name: impl Into<String>, tangle_root: Option<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            tangle_root: normalize_root(tangle_root),
            options: Vec::new(),
        }
    }

    /// Adds an option.
    pub fn with_option(mut self, option: LinkOption) -> Self {
        if !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }

    /// Key of the referenced block in the referencing block's root.
    pub fn key(&self) -> BlockKey {
        BlockKey::build(&self.name, self.tangle_root.as_deref())
    }

    /// Returns true if the link must not be drawn.
    pub fn is_hidden(&self) -> bool {
        self.options.contains(&LinkOption::Hidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_uses_referencing_root() {
        let link = BlockLink::new(" Utils ", Some("step2".to_string()));
        assert_eq!(link.name, "Utils");
        assert_eq!(link.key().as_str(), "step2##Utils");
    }

    #[test]
    fn test_options() {
        let link = BlockLink::new("a", None)
            .with_option(LinkOption::Hidden)
            .with_option(LinkOption::Hidden);
        assert!(link.is_hidden());
        assert_eq!(link.options.len(), 1);
    }
}
