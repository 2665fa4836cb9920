//! Tangling: expanding references into final text.

use std::collections::HashSet;

use super::block::BlockId;
use super::block_key::BlockKey;
use super::registry::Registry;
use crate::errors::{LiterateError, Result};

/// Detects cycles while blocks are expanded recursively.
#[derive(Debug, Default)]
pub struct CycleDetector {
    /// Keys of the blocks currently being expanded (for error reporting).
    stack: Vec<BlockKey>,
    /// Set for O(1) membership checks.
    seen: HashSet<BlockKey>,
}

impl CycleDetector {
    /// Creates a new cycle detector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a block, checking for cycles.
    ///
    /// Returns an error if entering this block would create a cycle.
    pub fn enter(&mut self, key: &BlockKey) -> Result<()> {
        if self.seen.contains(key) {
            let mut cycle = self.stack.clone();
            cycle.push(key.clone());
            return Err(LiterateError::CycleDetected(cycle));
        }
        self.seen.insert(key.clone());
        self.stack.push(key.clone());
        Ok(())
    }

    /// Exits a block.
    pub fn exit(&mut self) {
        if let Some(key) = self.stack.pop() {
            self.seen.remove(&key);
        }
    }

    /// Returns the current depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Output of [`tangle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tangled {
    pub lines: Vec<String>,
    /// The block the requested name resolved to.
    pub block: BlockId,
}

impl Tangled {
    /// Joins the lines with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Tangles the block `name` as seen from `tangle_root`.
pub fn tangle(registry: &Registry, name: &str, tangle_root: Option<&str>) -> Result<Tangled> {
    tangle_with_context(registry, name, tangle_root, "")
}

/// Like [`tangle`], with a prefix describing the request for the
/// block-not-found error, e.g. `"requested in document 'x', line 3, "`.
pub fn tangle_with_context(
    registry: &Registry,
    name: &str,
    tangle_root: Option<&str>,
    error_context: &str,
) -> Result<Tangled> {
    let name = name.trim();
    let block = registry
        .resolve_predecessor(name, tangle_root, None)
        .ok_or_else(|| LiterateError::BlockNotFound {
            name: name.to_string(),
            tangle_root: tangle_root.map(str::to_string),
            context: error_context.to_string(),
        })?;

    let mut tangler = Tangler {
        registry,
        tangle_root,
        detector: CycleDetector::new(),
        output: Vec::new(),
    };
    tangler.expand(block, "")?;

    Ok(Tangled {
        lines: tangler.output,
        block,
    })
}

struct Tangler<'a> {
    registry: &'a Registry,
    tangle_root: Option<&'a str>,
    detector: CycleDetector,
    output: Vec<String>,
}

impl<'a> Tangler<'a> {
    fn expand(&mut self, id: BlockId, prefix: &str) -> Result<()> {
        let registry = self.registry;
        self.detector.enter(&registry.block(id).key())?;

        for line in registry.all_content(id, self.tangle_root)? {
            self.expand_line(line.text, line.owner, prefix)?;
        }

        self.detector.exit();
        Ok(())
    }

    /// Expands the earliest reference of `text`, then whatever follows it.
    fn expand_line(&mut self, text: &str, owner: BlockId, prefix: &str) -> Result<()> {
        let registry = self.registry;
        let block = registry.block(owner);

        let earliest = block
            .links
            .iter()
            .filter_map(|(placeholder, link)| {
                text.find(placeholder.as_str())
                    .map(|position| (position, placeholder.len(), link))
            })
            .min_by_key(|(position, _, _)| *position);

        let Some((position, placeholder_len, link)) = earliest else {
            self.output.push(format!("{}{}", prefix, text));
            return Ok(());
        };

        let target = registry
            .resolve_predecessor(&link.name, link.tangle_root.as_deref(), self.tangle_root)
            .ok_or_else(|| LiterateError::UnresolvedReference {
                reference: link.name.clone(),
                referencer: block.name.clone(),
                location: block.source_location.clone(),
                tangle_root: self.tangle_root.map(str::to_string),
            })?;

        let inner_prefix = format!("{}{}", prefix, &text[..position]);
        let suffix = &text[position + placeholder_len..];
        let mark = self.output.len();
        self.expand(target, &inner_prefix)?;

        if suffix.trim().is_empty() {
            return Ok(());
        }

        // The rest of the line continues the last expanded line.
        let last = if self.output.len() > mark {
            self.output.pop()
        } else {
            None
        }
        .unwrap_or(inner_prefix);
        self.expand_line(&format!("{}{}", last, suffix), owner, "")
    }
}
