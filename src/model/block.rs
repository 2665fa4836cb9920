//! Literate block representation.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::block_key::{normalize_root, BlockKey};
use super::block_link::BlockLink;
use super::uid::Uid;
use crate::text_location::SourceLocation;

/// Index of a block in its registry's arena.
///
/// Only meaningful for the registry that handed it out; use [`Uid`] to refer
/// to a block across registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub(crate) usize);

/// How a block relates to the block before it in its version chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relation {
    /// Starts an independent chain.
    #[default]
    New,
    /// Adds its content after the previous content.
    Append,
    /// Adds its content before the previous content.
    Prepend,
    /// Discards everything before it in the chain.
    Replace,
    /// Content-less modifier splicing another block at a pattern.
    Insert,
    /// Holds the content spliced by an `Insert` modifier. Behaves like `New`.
    Inserted,
}

impl Relation {
    /// Returns true for relations that start their own chain.
    pub fn is_fresh(self) -> bool {
        matches!(self, Relation::New | Relation::Inserted)
    }

    /// Returns true for relations that need a predecessor.
    pub fn is_override(self) -> bool {
        !self.is_fresh()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::New => "NEW",
            Relation::Append => "APPEND",
            Relation::Prepend => "PREPEND",
            Relation::Replace => "REPLACE",
            Relation::Insert => "INSERT",
            Relation::Inserted => "INSERTED",
        };
        f.write_str(s)
    }
}

/// Where inserted content goes relative to the matching line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Placement {
    Before,
    After,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Before => f.write_str("BEFORE"),
            Placement::After => f.write_str("AFTER"),
        }
    }
}

/// Insertion point of an `Insert` modifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsertLocation {
    pub placement: Placement,
    /// Substring searched in the target's lines.
    pub pattern: String,
}

impl InsertLocation {
    pub fn new(placement: Placement, pattern: impl Into<String>) -> Self {
        Self {
            placement,
            pattern: pattern.into(),
        }
    }
}

/// How a block enters the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegistrationMode {
    #[default]
    New,
    Append,
    Prepend,
    Replace,
    /// Register the block as insertable content and patch `target` with it.
    Insert {
        target: String,
        location: InsertLocation,
    },
}

impl RegistrationMode {
    /// Relation given to the registered block itself.
    pub fn relation(&self) -> Relation {
        match self {
            RegistrationMode::New => Relation::New,
            RegistrationMode::Append => Relation::Append,
            RegistrationMode::Prepend => Relation::Prepend,
            RegistrationMode::Replace => Relation::Replace,
            RegistrationMode::Insert { .. } => Relation::Inserted,
        }
    }
}

/// A literate block: a named piece of text, possibly overriding an earlier
/// block of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Name used to reference the block.
    pub name: String,

    /// Tangle root the block was defined in, `None` for the default root.
    pub tangle_root: Option<String>,

    /// Content lines, references replaced by placeholders.
    pub content: Vec<String>,

    /// Placeholder -> reference, for the placeholders found in `content`.
    pub links: IndexMap<String, BlockLink>,

    /// Language tag, informational only.
    pub lexer: Option<String>,

    /// Where the block was defined.
    pub source_location: SourceLocation,

    /// Presentation hint.
    pub hidden: bool,

    pub uid: Uid,

    // Fields below are maintained by the registry.
    pub relation_to_prev: Relation,
    pub prev: Option<BlockId>,
    pub next: Option<BlockId>,
    /// Position of the block in its chain.
    pub child_index: usize,
    pub inserted_block: Option<BlockId>,
    pub inserted_location: Option<InsertLocation>,
}

impl Block {
    /// Creates a new block with plain content lines.
    pub fn new(
        name: impl Into<String>,
        tangle_root: Option<String>,
        content: Vec<String>,
        source_location: SourceLocation,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            tangle_root: normalize_root(tangle_root),
            content,
            links: IndexMap::new(),
            lexer: None,
            source_location,
            hidden: false,
            uid: Uid::generate(),
            relation_to_prev: Relation::New,
            prev: None,
            next: None,
            child_index: 0,
            inserted_block: None,
            inserted_location: None,
        }
    }

    /// Synthesizes the content-less modifier that patches `target`.
    pub(crate) fn insert_modifier(
        target: &str,
        tangle_root: Option<String>,
        inserted: BlockId,
        location: InsertLocation,
        source_location: SourceLocation,
    ) -> Self {
        let mut block = Self::new(target, tangle_root, Vec::new(), source_location);
        block.relation_to_prev = Relation::Insert;
        block.inserted_block = Some(inserted);
        block.inserted_location = Some(location);
        block.hidden = true;
        block
    }

    /// Sets the language tag.
    pub fn with_lexer(mut self, lexer: impl Into<String>) -> Self {
        self.lexer = Some(lexer.into());
        self
    }

    /// Sets the placeholder table.
    pub fn with_links(mut self, links: IndexMap<String, BlockLink>) -> Self {
        self.links = links;
        self
    }

    /// Sets where the block was defined.
    pub fn with_location(mut self, source_location: SourceLocation) -> Self {
        self.source_location = source_location;
        self
    }

    /// Sets the presentation hint.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Returns the registry key of this block.
    pub fn key(&self) -> BlockKey {
        BlockKey::build(&self.name, self.tangle_root.as_deref())
    }

    /// Returns the tangle root as a string slice.
    pub fn root(&self) -> Option<&str> {
        self.tangle_root.as_deref()
    }

    /// Returns true if the block still waits for its predecessor.
    pub fn is_detached_override(&self) -> bool {
        self.relation_to_prev.is_override() && self.prev.is_none()
    }

    /// Human readable identification, e.g. `'main' (in root 'step1')`.
    pub fn format(&self) -> String {
        self.key().to_string()
    }

    /// Returns a copy without any registry-maintained link.
    pub(crate) fn detached(&self) -> Self {
        Self {
            prev: None,
            next: None,
            child_index: 0,
            ..self.clone()
        }
    }
}
