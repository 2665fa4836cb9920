//! The block registry.
//!
//! Blocks live in an arena and are addressed by [`BlockId`]. Blocks sharing
//! a name inside one tangle root form a version chain through `prev`/`next`;
//! the chain head is indexed by its [`BlockKey`]. A head that modifies a block
//! of an ancestor root points at that block through `prev`. Override heads
//! whose predecessor is not registered yet are kept in the missing set until
//! a later registration, merge or hierarchy declaration resolves them.

use std::collections::HashMap;
use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::block::{Block, BlockId, RegistrationMode, Relation};
use super::block_key::{file_path, root_label, BlockKey, KEY_SEPARATOR};
use super::block_link::BlockLink;
use super::hierarchy::Hierarchy;
use super::uid::Uid;
use crate::errors::{LiterateError, Result};
use crate::text_location::SourceLocation;

/// A `file:` block visible from a tangle root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTarget {
    /// Full block name, prefix included.
    pub name: String,
    /// Output path relative to the root's output directory.
    pub path: String,
    /// Root the block is defined in.
    pub defined_in: Option<String>,
}

/// Short description of a related block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedBlock {
    pub key: BlockKey,
    pub uid: Uid,
    pub source_location: SourceLocation,
}

/// How a block relates to the other blocks of the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockRelations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacing: Option<RelatedBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completing: Option<RelatedBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepending: Option<RelatedBlock>,
    /// Block patched by this block's content, for inserted blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserting_into: Option<RelatedBlock>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replaced_by: Vec<RelatedBlock>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub completed_in: Vec<RelatedBlock>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prepended_in: Vec<RelatedBlock>,
    /// Blocks spliced into this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patched_by: Vec<RelatedBlock>,
    /// Keys of the blocks referencing this block's name.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub referenced_in: Vec<BlockKey>,
}

/// Registry of literate blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    /// Every registered block, in registration order.
    blocks: Vec<Block>,
    /// Chain heads by key.
    heads: IndexMap<BlockKey, BlockId>,
    /// Block name -> keys of the chains with that name, across roots.
    #[serde(skip)]
    name_index: HashMap<String, Vec<BlockKey>>,
    uids: HashMap<Uid, BlockId>,
    /// Referenced key -> keys of the referencing blocks.
    references: IndexMap<BlockKey, IndexSet<BlockKey>>,
    hierarchy: Hierarchy,
    /// Override heads still waiting for their predecessor.
    missing: IndexSet<BlockId>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a block.
    ///
    /// The block receives a fresh uid. Override modes link it to the block
    /// they modify, or leave it pending in the missing set. The insert mode
    /// registers the block as insertable content and links a content-less
    /// modifier to the target chain.
    pub fn register_block(&mut self, mut block: Block, mode: RegistrationMode) -> Result<BlockId> {
        block.uid = Uid::generate();
        block.relation_to_prev = mode.relation();
        block.prev = None;
        block.next = None;
        block.child_index = 0;
        block.inserted_block = None;
        block.inserted_location = None;

        if let RegistrationMode::Insert { target, .. } = &mode {
            validate_name(target, &block.source_location)?;
        }

        let referencer = block.key();
        let referencees: Vec<BlockKey> = block.links.values().map(BlockLink::key).collect();

        let id = self.link_block(block)?;
        for referencee in referencees {
            self.add_reference(referencer.clone(), referencee);
        }

        if let RegistrationMode::Insert { target, location } = mode {
            let inserted = &self.blocks[id.0];
            let modifier = Block::insert_modifier(
                &target,
                inserted.tangle_root.clone(),
                id,
                location,
                inserted.source_location.clone(),
            );
            self.link_block(modifier)?;
        }

        Ok(id)
    }

    /// Declares `parent` as the parent tangle root of `root`.
    ///
    /// Chains of `root` and of its descendants are re-resolved against the
    /// new lineage.
    pub fn set_tangle_parent(
        &mut self,
        root: &str,
        parent: &str,
        source_location: SourceLocation,
        fetch_files: Vec<PathBuf>,
    ) -> Result<()> {
        if self
            .hierarchy
            .set_parent(root, parent, source_location, fetch_files)?
        {
            let root = root.trim();
            debug!("tangle root '{}' inherits from '{}'", root, parent.trim());
            self.reconcile_subtree(root);
        }
        Ok(())
    }

    /// Records that the block `referencer` mentions `referencee`.
    pub fn add_reference(&mut self, referencer: BlockKey, referencee: BlockKey) {
        self.references
            .entry(referencee)
            .or_default()
            .insert(referencer);
    }

    /// Finds the block a name resolves to.
    ///
    /// With an `override_root`, the roots between it and `tangle_root` are
    /// searched first so that a descendant root being tangled sees its own
    /// modifications of blocks defined higher up. Otherwise, or when that
    /// finds nothing, the lineage of `tangle_root` is searched upwards.
    pub fn resolve_predecessor(
        &self,
        name: &str,
        tangle_root: Option<&str>,
        override_root: Option<&str>,
    ) -> Option<BlockId> {
        if let Some(override_root) = override_root {
            let mut found = None;
            let mut current = Some(override_root);
            while let Some(root) = current {
                if Some(root) == tangle_root {
                    break;
                }
                if let Some(id) = self.get(name, Some(root)) {
                    if self.blocks[id.0].relation_to_prev.is_fresh() {
                        // A fresh definition hides the modifications below it.
                        found = None;
                    } else if found.is_none() {
                        found = Some(id);
                    }
                }
                current = self.hierarchy.parent(Some(root));
            }
            if found.is_some() {
                return found;
            }
        }

        self.hierarchy
            .lineage(tangle_root)
            .into_iter()
            .find_map(|root| self.get(name, root))
    }

    /// Returns the chain head of `name` in exactly `tangle_root`.
    pub fn get(&self, name: &str, tangle_root: Option<&str>) -> Option<BlockId> {
        self.get_by_key(&BlockKey::build(name, tangle_root))
    }

    /// Returns the chain head registered under `key`.
    pub fn get_by_key(&self, key: &BlockKey) -> Option<BlockId> {
        self.heads.get(key).copied()
    }

    /// Returns the block with the given uid.
    pub fn get_by_uid(&self, uid: Uid) -> Option<BlockId> {
        self.uids.get(&uid).copied()
    }

    /// Returns a block.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not handed out by this registry.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    /// Iterates over a chain, starting at `id` and following `next`.
    pub fn chain(&self, id: BlockId) -> impl Iterator<Item = BlockId> + '_ {
        std::iter::successors(Some(id), move |current| self.blocks[current.0].next)
    }

    /// Returns the head of the chain `id` belongs to.
    pub fn chain_head(&self, id: BlockId) -> BlockId {
        let mut current = id;
        while let Some(prev) = self.blocks[current.0].prev {
            if self.blocks[prev.0].next != Some(current) {
                break;
            }
            current = prev;
        }
        current
    }

    /// Iterates over all blocks in registration order.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| (BlockId(index), block))
    }

    /// Iterates over chain heads in registration order.
    pub fn heads(&self) -> impl Iterator<Item = (&BlockKey, BlockId)> {
        self.heads.iter().map(|(key, id)| (key, *id))
    }

    /// Iterates over override heads that have no predecessor yet.
    pub fn missing(&self) -> impl Iterator<Item = &Block> {
        self.missing.iter().map(|id| &self.blocks[id.0])
    }

    /// Returns the tangle root hierarchy.
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Returns the number of registered blocks, modifiers included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no block was registered.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns the keys of the blocks that reference `key`.
    pub fn references_to(&self, key: &BlockKey) -> Vec<&BlockKey> {
        self.references
            .get(key)
            .map(|referencers| referencers.iter().collect())
            .unwrap_or_default()
    }

    /// Checks the structural consistency of the registry.
    ///
    /// Unless `allow_missing` is set, pending overrides are an error listing
    /// every one of them.
    pub fn check_integrity(&self, allow_missing: bool) -> Result<()> {
        let in_bounds = |id: &BlockId| id.0 < self.blocks.len();
        for (id, block) in self.blocks() {
            if !block.prev.iter().all(in_bounds) {
                return Err(LiterateError::Integrity(format!(
                    "{} ({}) follows an unknown block",
                    block.format(),
                    block.source_location
                )));
            }
            if let Some(next) = block.next {
                match self.blocks.get(next.0) {
                    Some(follower) if follower.prev == Some(id) => {}
                    _ => {
                        return Err(LiterateError::Integrity(format!(
                            "the block following {} ({}) does not point back to it",
                            block.format(),
                            block.source_location
                        )))
                    }
                }
            }
            if let Some(inserted) = block.inserted_block {
                if inserted.0 >= self.blocks.len() {
                    return Err(LiterateError::Integrity(format!(
                        "{} inserts an unknown block",
                        block.format()
                    )));
                }
            }
            if block.is_detached_override() != self.missing.contains(&id) {
                return Err(LiterateError::Integrity(format!(
                    "pending state of {} ({}) is out of date",
                    block.format(),
                    block.source_location
                )));
            }
            if self.uids.get(&block.uid) != Some(&id) {
                return Err(LiterateError::Integrity(format!(
                    "uid {} of {} is not indexed",
                    block.uid,
                    block.format()
                )));
            }
        }

        if let Some(id) = self.missing.iter().find(|id| !in_bounds(*id)) {
            return Err(LiterateError::Integrity(format!(
                "pending block #{} is not registered",
                id.0
            )));
        }
        if self.uids.len() != self.blocks.len() {
            return Err(LiterateError::Integrity(format!(
                "{} uids are indexed for {} blocks",
                self.uids.len(),
                self.blocks.len()
            )));
        }
        self.check_chains_terminate()?;

        for (key, id) in &self.heads {
            match self.blocks.get(id.0) {
                Some(block) if block.key() == *key => {}
                _ => {
                    return Err(LiterateError::Integrity(format!(
                        "the head registered for {} has a different key",
                        key
                    )))
                }
            }
        }

        if !allow_missing && !self.missing.is_empty() {
            let lines = self
                .missing()
                .map(|block| {
                    format!(
                        "  - {} {} in {}",
                        pending_action(block.relation_to_prev),
                        block.format(),
                        block.source_location
                    )
                })
                .collect();
            return Err(LiterateError::DanglingOverride(lines));
        }

        Ok(())
    }

    /// Fails if following `next` from some block loops forever.
    ///
    /// `next` links are known to point back through `prev`, so every chain
    /// has a single entry and a walk from the entries must visit every block.
    fn check_chains_terminate(&self) -> Result<()> {
        let mut visited = vec![false; self.blocks.len()];
        for (id, block) in self.blocks() {
            let is_entry = block
                .prev
                .map_or(true, |prev| self.blocks[prev.0].next != Some(id));
            if !is_entry {
                continue;
            }
            for node in self.chain(id) {
                if visited[node.0] {
                    break;
                }
                visited[node.0] = true;
            }
        }
        match visited.iter().position(|seen| !seen) {
            Some(index) => Err(LiterateError::Integrity(format!(
                "the chain of {} loops back on itself",
                self.blocks[index].format()
            ))),
            None => Ok(()),
        }
    }

    /// Merges another registry into this one.
    ///
    /// The hierarchy is merged first, then every block of `other` is
    /// replayed in its registration order, keeping its uid. Blocks pending
    /// in either registry get resolved when the other one provides their
    /// predecessor.
    pub fn merge(&mut self, other: &Registry) -> Result<()> {
        debug!("merging {} blocks", other.blocks.len());

        for root in self.hierarchy.merge(&other.hierarchy)? {
            debug!("tangle root '{}' receives its parent", root);
            self.reconcile_subtree(&root);
        }

        let mut remap: HashMap<BlockId, BlockId> = HashMap::with_capacity(other.blocks.len());
        for (old_id, block) in other.blocks() {
            let mut block = block.detached();
            if let Some(inserted) = block.inserted_block {
                let mapped = remap.get(&inserted).copied().ok_or_else(|| {
                    LiterateError::Integrity(format!(
                        "{} inserts a block registered after it",
                        block.format()
                    ))
                })?;
                block.inserted_block = Some(mapped);
            }
            let new_id = self.link_block(block)?;
            remap.insert(old_id, new_id);
        }

        for (referencee, referencers) in &other.references {
            self.references
                .entry(referencee.clone())
                .or_default()
                .extend(referencers.iter().cloned());
        }

        self.check_integrity(true)
    }

    /// Builds a copy of this registry without the blocks and parent
    /// declarations of `docname`.
    ///
    /// Surviving blocks are replayed in their registration order, so chains
    /// that lose their base become pending again.
    pub fn remove_document(&self, docname: &str) -> Result<Registry> {
        let mut rebuilt = Registry::default();
        for entry in self.hierarchy.entries() {
            if entry.source_location.docname == docname {
                continue;
            }
            rebuilt.hierarchy.set_parent(
                &entry.root,
                &entry.parent,
                entry.source_location.clone(),
                entry.fetch_files.clone(),
            )?;
        }

        let mut remap: HashMap<BlockId, BlockId> = HashMap::new();
        for (old_id, block) in self.blocks() {
            if block.source_location.docname == docname {
                continue;
            }
            let mut block = block.detached();
            if let Some(inserted) = block.inserted_block {
                match remap.get(&inserted) {
                    Some(mapped) => block.inserted_block = Some(*mapped),
                    None => continue,
                }
            }
            let referencer = block.key();
            let referencees: Vec<BlockKey> = block.links.values().map(BlockLink::key).collect();
            let new_id = rebuilt.link_block(block)?;
            for referencee in referencees {
                rebuilt.add_reference(referencer.clone(), referencee);
            }
            remap.insert(old_id, new_id);
        }

        debug!(
            "removed {} blocks of document '{}'",
            self.blocks.len() - rebuilt.blocks.len(),
            docname
        );
        rebuilt.check_integrity(true)?;
        Ok(rebuilt)
    }

    /// Returns every tangle root: the default root first, then roots in the
    /// order they appear in blocks and in the hierarchy.
    pub fn tangle_roots(&self) -> Vec<Option<&str>> {
        let mut roots: Vec<Option<&str>> = vec![None];
        let from_blocks = self.blocks.iter().map(Block::root);
        let from_hierarchy = self.hierarchy.roots().into_iter().map(Some);
        for root in from_blocks.chain(from_hierarchy) {
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        roots
    }

    /// Returns the blocks defined in exactly `tangle_root`, in registration
    /// order.
    pub fn blocks_by_root(&self, tangle_root: Option<&str>) -> Vec<BlockId> {
        self.blocks()
            .filter(|(_, block)| block.root() == tangle_root)
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns the `file:` blocks visible from `tangle_root`.
    ///
    /// Blocks defined in the root come first, then inherited ones. Two
    /// names that only differ by whitespace around the path are rejected
    /// since they would write the same file.
    pub fn file_targets(&self, tangle_root: Option<&str>) -> Result<Vec<FileTarget>> {
        let mut targets: IndexMap<String, FileTarget> = IndexMap::new();
        for root in self.hierarchy.lineage(tangle_root) {
            for key in self.heads.keys() {
                if key.tangle_root() != root {
                    continue;
                }
                let name = key.name();
                let Some(path) = file_path(name) else {
                    continue;
                };
                if path.is_empty() {
                    return Err(LiterateError::Config(format!(
                        "file block {} has an empty output path",
                        key
                    )));
                }
                match targets.get(path) {
                    Some(existing) if existing.name != name => {
                        return Err(LiterateError::Config(format!(
                            "file blocks '{}' and '{}' both write '{}' when tangling {}",
                            existing.name,
                            name,
                            path,
                            root_label(tangle_root)
                        )));
                    }
                    Some(_) => {}
                    None => {
                        targets.insert(
                            path.to_string(),
                            FileTarget {
                                name: name.to_string(),
                                path: path.to_string(),
                                defined_in: root.map(str::to_string),
                            },
                        );
                    }
                }
            }
        }
        Ok(targets.into_values().collect())
    }

    /// Describes how a block relates to the rest of the registry.
    pub fn relations(&self, id: BlockId) -> BlockRelations {
        let block = &self.blocks[id.0];
        let mut relations = BlockRelations::default();

        if let Some(prev) = block.prev {
            let related = self.related(prev);
            match block.relation_to_prev {
                Relation::Replace => relations.replacing = Some(related),
                Relation::Append => relations.completing = Some(related),
                Relation::Prepend => relations.prepending = Some(related),
                _ => {}
            }
        }

        for (other_id, other) in self.blocks() {
            if other.inserted_block == Some(id) {
                relations.inserting_into = other.prev.map(|target| self.related(target));
            }
            if other.prev != Some(id) {
                continue;
            }
            match other.relation_to_prev {
                Relation::Replace => relations.replaced_by.push(self.related(other_id)),
                Relation::Append => relations.completed_in.push(self.related(other_id)),
                Relation::Prepend => relations.prepended_in.push(self.related(other_id)),
                Relation::Insert => {
                    if let Some(inserted) = other.inserted_block {
                        relations.patched_by.push(self.related(inserted));
                    }
                }
                Relation::New | Relation::Inserted => {}
            }
        }

        relations.referenced_in = self
            .references_to(&block.key())
            .into_iter()
            .cloned()
            .collect();
        relations
    }

    /// Renders the registry for inspection, one entry per line.
    pub fn pretty_dump(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if !self.hierarchy.is_empty() {
            lines.push("Hierarchy:".to_string());
            for entry in self.hierarchy.entries() {
                lines.push(format!(
                    "  {} -> {} ({})",
                    entry.root, entry.parent, entry.source_location
                ));
            }
        }

        lines.push("Blocks:".to_string());
        for (_, head) in self.heads() {
            let block = &self.blocks[head.0];
            let mut line = format!(
                "  {} [{}] {}",
                block.format(),
                block.relation_to_prev,
                block.source_location
            );
            if let Some(prev) = block.prev {
                line.push_str(&format!(" <- {}", self.blocks[prev.0].format()));
            }
            if self.missing.contains(&head) {
                line.push_str(" (missing)");
            }
            lines.push(line);
            for node in self.chain(head).skip(1) {
                let node = &self.blocks[node.0];
                lines.push(format!(
                    "    + [{}] {}",
                    node.relation_to_prev, node.source_location
                ));
            }
        }

        lines
    }

    /// Serializes the registry to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a registry serialized with [`Registry::to_json`].
    pub fn from_json(input: &str) -> Result<Self> {
        let mut registry: Self = serde_json::from_str(input)?;
        registry.check_integrity(true)?;
        let keys: Vec<BlockKey> = registry.heads.keys().cloned().collect();
        for key in &keys {
            registry.index_name(key);
        }
        Ok(registry)
    }

    fn related(&self, id: BlockId) -> RelatedBlock {
        let block = &self.blocks[id.0];
        RelatedBlock {
            key: block.key(),
            uid: block.uid,
            source_location: block.source_location.clone(),
        }
    }

    /// Stores a block whose registry links are not set yet.
    fn link_block(&mut self, block: Block) -> Result<BlockId> {
        validate_name(&block.name, &block.source_location)?;
        if let Some(existing) = self.uids.get(&block.uid) {
            return Err(LiterateError::Integrity(format!(
                "uid {} of {} is already used by {}",
                block.uid,
                block.format(),
                self.blocks[existing.0].format()
            )));
        }

        let name = block.name.clone();
        let tangle_root = block.tangle_root.clone();
        let id = if block.relation_to_prev.is_fresh() {
            self.insert_fresh(block)?
        } else {
            self.insert_override(block)
        };

        self.reconcile_name(&name, tangle_root.as_deref());
        Ok(id)
    }

    fn insert_fresh(&mut self, block: Block) -> Result<BlockId> {
        let key = block.key();
        let Some(existing) = self.get_by_key(&key) else {
            let id = self.push(block);
            self.index_head(key, id);
            return Ok(id);
        };

        // Only a pending chain of overrides can receive its base.
        if !self.missing.contains(&existing) {
            return Err(LiterateError::DuplicateBlock {
                key,
                first: self.blocks[existing.0].source_location.clone(),
                second: block.source_location,
            });
        }

        let id = self.push(block);
        self.blocks[id.0].next = Some(existing);
        self.blocks[existing.0].prev = Some(id);
        self.missing.shift_remove(&existing);
        self.heads.insert(key.clone(), id);
        self.renumber_chain(id);
        debug!("{} becomes the base of the modifications of {}", self.blocks[id.0].source_location, key);
        Ok(id)
    }

    fn insert_override(&mut self, block: Block) -> BlockId {
        let key = block.key();
        let found = self.resolve_predecessor(&block.name, block.root(), None);
        let same_root = found.is_some_and(|f| self.blocks[f.0].tangle_root == block.tangle_root);
        let id = self.push(block);

        match found {
            Some(head) if same_root => self.append_to_chain(head, id),
            Some(ancestor) => {
                debug!("{} modifies {}", key, self.blocks[ancestor.0].format());
                self.blocks[id.0].prev = Some(ancestor);
                self.index_head(key, id);
            }
            None => {
                debug!("{} modifies a block that is not registered yet", key);
                self.index_head(key, id);
                self.missing.insert(id);
            }
        }
        id
    }

    fn push(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.uids.insert(block.uid, id);
        self.blocks.push(block);
        id
    }

    fn index_head(&mut self, key: BlockKey, id: BlockId) {
        self.index_name(&key);
        self.heads.insert(key, id);
    }

    fn index_name(&mut self, key: &BlockKey) {
        let keys = self.name_index.entry(key.name().to_string()).or_default();
        if !keys.contains(key) {
            keys.push(key.clone());
        }
    }

    fn append_to_chain(&mut self, head: BlockId, id: BlockId) {
        let mut last = head;
        while let Some(next) = self.blocks[last.0].next {
            last = next;
        }
        self.blocks[last.0].next = Some(id);
        self.blocks[id.0].prev = Some(last);
        self.blocks[id.0].child_index = self.blocks[last.0].child_index + 1;
    }

    fn renumber_chain(&mut self, head: BlockId) {
        let nodes: Vec<BlockId> = self.chain(head).collect();
        for (index, node) in nodes.into_iter().enumerate() {
            self.blocks[node.0].child_index = index;
        }
    }

    /// Re-resolves override heads named `name` in strict descendants of
    /// `tangle_root`.
    fn reconcile_name(&mut self, name: &str, tangle_root: Option<&str>) {
        let Some(keys) = self.name_index.get(name) else {
            return;
        };
        let candidates: Vec<BlockId> = keys
            .iter()
            .filter_map(|key| self.heads.get(key).copied())
            .filter(|id| {
                let block = &self.blocks[id.0];
                block.relation_to_prev.is_override()
                    && self.hierarchy.is_strict_ancestor(tangle_root, block.root())
            })
            .collect();
        self.relink_heads(candidates);
    }

    /// Re-resolves every override head of `tangle_root` and its descendants.
    fn reconcile_subtree(&mut self, tangle_root: &str) {
        let candidates: Vec<BlockId> = self
            .heads
            .values()
            .copied()
            .filter(|id| {
                let block = &self.blocks[id.0];
                block.relation_to_prev.is_override()
                    && self.hierarchy.is_ancestor_or_self(Some(tangle_root), block.root())
            })
            .collect();
        self.relink_heads(candidates);
    }

    /// Points each head at the closest block of its name in its ancestors.
    fn relink_heads(&mut self, heads: Vec<BlockId>) {
        for id in heads {
            let block = &self.blocks[id.0];
            let expected = self
                .hierarchy
                .lineage(block.root())
                .into_iter()
                .skip(1)
                .find_map(|root| self.get(&block.name, root));
            if block.prev == expected {
                continue;
            }

            let key = block.key();
            self.blocks[id.0].prev = expected;
            match expected {
                Some(prev) => {
                    self.missing.shift_remove(&id);
                    debug!("{} now modifies {}", key, self.blocks[prev.0].format());
                }
                None => {
                    self.missing.insert(id);
                    debug!("{} lost its predecessor", key);
                }
            }
        }
    }
}

fn validate_name(name: &str, location: &SourceLocation) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LiterateError::InvalidName {
            name: name.to_string(),
            location: location.clone(),
            message: "block names cannot be empty".to_string(),
        });
    }
    if name.contains(KEY_SEPARATOR) {
        return Err(LiterateError::InvalidName {
            name: name.to_string(),
            location: location.clone(),
            message: format!("block names cannot contain '{}'", KEY_SEPARATOR),
        });
    }
    Ok(())
}

fn pending_action(relation: Relation) -> &'static str {
    match relation {
        Relation::Append => "append to",
        Relation::Prepend => "prepend to",
        Relation::Replace => "replace",
        Relation::Insert => "insert into",
        Relation::New | Relation::Inserted => "define",
    }
}
