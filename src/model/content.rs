//! Assembling the raw content of a block chain.

use indexmap::IndexMap;

use super::block::{BlockId, Placement, Relation};
use super::block_key::BlockKey;
use super::registry::Registry;
use super::tangle::CycleDetector;
use crate::errors::{LiterateError, Result};

/// A content line together with the block it comes from.
///
/// Placeholders in `text` are keys of the owner's link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLine<'a> {
    pub text: &'a str,
    pub owner: BlockId,
}

/// Insert modifiers of one chain sharing a placement and a pattern.
struct InsertionGroup<'a> {
    placement: Placement,
    pattern: &'a str,
    modifiers: Vec<BlockId>,
    consumed: bool,
}

impl Registry {
    /// Returns the content of the chain `id` belongs to, references not
    /// expanded.
    ///
    /// Content inherited from an ancestor root is included according to the
    /// chain's first relation. Inserted blocks are looked up with
    /// `eval_root` as override root, so that a descendant root being
    /// evaluated sees its own version of them.
    pub fn all_content(
        &self,
        id: BlockId,
        eval_root: Option<&str>,
    ) -> Result<Vec<ContentLine<'_>>> {
        let mut detector = CycleDetector::new();
        self.flatten(self.chain_head(id), eval_root, &mut detector)
    }

    fn flatten<'a>(
        &'a self,
        head: BlockId,
        eval_root: Option<&str>,
        detector: &mut CycleDetector,
    ) -> Result<Vec<ContentLine<'a>>> {
        let key = self.block(head).key();
        detector.enter(&key)?;

        let chain: Vec<BlockId> = self.chain(head).collect();
        let start_index = chain
            .iter()
            .rposition(|id| self.block(*id).relation_to_prev == Relation::Replace)
            .unwrap_or(0);
        let chain = &chain[start_index..];
        let start = self.block(chain[0]);

        let inherited = match start.prev {
            Some(prev)
                if matches!(
                    start.relation_to_prev,
                    Relation::Append | Relation::Prepend | Relation::Insert
                ) =>
            {
                self.flatten(self.chain_head(prev), eval_root, detector)?
            }
            _ => Vec::new(),
        };

        let mut prepended: Vec<Vec<ContentLine<'a>>> = Vec::new();
        let mut body: Vec<ContentLine<'a>> = Vec::new();
        let mut groups: IndexMap<(Placement, &'a str), Vec<BlockId>> = IndexMap::new();
        for &node in chain {
            let block = self.block(node);
            if block.relation_to_prev == Relation::Insert {
                if let Some(location) = &block.inserted_location {
                    groups
                        .entry((location.placement, location.pattern.as_str()))
                        .or_default()
                        .push(node);
                }
                continue;
            }
            let lines = block.content.iter().map(|text| ContentLine {
                text: text.as_str(),
                owner: node,
            });
            if block.relation_to_prev == Relation::Prepend {
                prepended.push(lines.collect());
            } else {
                body.extend(lines);
            }
        }

        let (before, after) = if start.relation_to_prev == Relation::Prepend {
            (Vec::new(), inherited)
        } else {
            (inherited, Vec::new())
        };
        let mut sequence = before;
        // The latest prepend ends up first.
        for lines in prepended.into_iter().rev() {
            sequence.extend(lines);
        }
        sequence.extend(body);
        sequence.extend(after);

        let content = if groups.is_empty() {
            sequence
        } else {
            let groups = groups
                .into_iter()
                .map(|((placement, pattern), modifiers)| InsertionGroup {
                    placement,
                    pattern,
                    modifiers,
                    consumed: false,
                })
                .collect();
            self.splice_insertions(&key, sequence, groups, eval_root, detector)?
        };

        detector.exit();
        Ok(content)
    }

    fn splice_insertions<'a>(
        &'a self,
        target: &BlockKey,
        sequence: Vec<ContentLine<'a>>,
        mut groups: Vec<InsertionGroup<'a>>,
        eval_root: Option<&str>,
        detector: &mut CycleDetector,
    ) -> Result<Vec<ContentLine<'a>>> {
        let mut output = Vec::with_capacity(sequence.len());
        for line in sequence {
            self.emit_insertions(&mut groups, Placement::Before, line.text, eval_root, detector, &mut output)?;
            output.push(line);
            self.emit_insertions(&mut groups, Placement::After, line.text, eval_root, detector, &mut output)?;
        }

        if let Some(group) = groups.iter().find(|group| !group.consumed) {
            let location = group
                .modifiers
                .first()
                .map(|id| self.block(*id).source_location.clone())
                .unwrap_or_default();
            return Err(LiterateError::UnmatchedInsertion {
                target: target.clone(),
                placement: group.placement,
                pattern: group.pattern.to_string(),
                location,
            });
        }

        Ok(output)
    }

    fn emit_insertions<'a>(
        &'a self,
        groups: &mut [InsertionGroup<'a>],
        placement: Placement,
        text: &str,
        eval_root: Option<&str>,
        detector: &mut CycleDetector,
        output: &mut Vec<ContentLine<'a>>,
    ) -> Result<()> {
        for group in groups.iter_mut() {
            if group.consumed || group.placement != placement || !text.contains(group.pattern) {
                continue;
            }
            group.consumed = true;
            for &modifier in &group.modifiers {
                output.extend(self.inserted_content(modifier, eval_root, detector)?);
            }
        }
        Ok(())
    }

    fn inserted_content<'a>(
        &'a self,
        modifier: BlockId,
        eval_root: Option<&str>,
        detector: &mut CycleDetector,
    ) -> Result<Vec<ContentLine<'a>>> {
        let modifier = self.block(modifier);
        let inserted = modifier.inserted_block.ok_or_else(|| {
            LiterateError::Integrity(format!(
                "insertion into {} has no inserted block",
                modifier.format()
            ))
        })?;
        let inserted_block = self.block(inserted);
        let resolved = self
            .resolve_predecessor(&inserted_block.name, inserted_block.root(), eval_root)
            .unwrap_or(inserted);
        self.flatten(self.chain_head(resolved), eval_root, detector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InsertLocation, RegistrationMode};
    use crate::test_utils::{assembled, loc, register};
    use pretty_assertions::assert_eq;

    fn insert(target: &str, placement: Placement, pattern: &str) -> RegistrationMode {
        RegistrationMode::Insert {
            target: target.to_string(),
            location: InsertLocation::new(placement, pattern),
        }
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut reg = Registry::new();
        register(&mut reg, "T", None, &["int a;", "int b;"], RegistrationMode::New);
        register(&mut reg, "I", None, &["// after a"], insert("T", Placement::After, "a;"));
        register(&mut reg, "J", None, &["// before b"], insert("T", Placement::Before, "b;"));

        assert_eq!(
            assembled(&reg, "T", None),
            vec!["int a;", "// after a", "// before b", "int b;"]
        );
    }

    #[test]
    fn test_insert_group_used_once() {
        let mut reg = Registry::new();
        register(&mut reg, "T", None, &["x = 1", "x = 2"], RegistrationMode::New);
        register(&mut reg, "I", None, &["log(x)"], insert("T", Placement::After, "x ="));

        assert_eq!(assembled(&reg, "T", None), vec!["x = 1", "log(x)", "x = 2"]);
    }

    #[test]
    fn test_same_pattern_keeps_chain_order() {
        let mut reg = Registry::new();
        register(&mut reg, "T", None, &["a"], RegistrationMode::New);
        register(&mut reg, "I", None, &["1"], insert("T", Placement::After, "a"));
        register(&mut reg, "J", None, &["2"], insert("T", Placement::After, "a"));

        assert_eq!(assembled(&reg, "T", None), vec!["a", "1", "2"]);
    }

    #[test]
    fn test_unmatched_insertion() {
        let mut reg = Registry::new();
        let target = register(&mut reg, "T", None, &["a"], RegistrationMode::New);
        register(&mut reg, "I", None, &["x"], insert("T", Placement::Before, "zzz"));

        let err = reg.all_content(target, None).unwrap_err();
        match err {
            LiterateError::UnmatchedInsertion { pattern, placement, .. } => {
                assert_eq!(pattern, "zzz");
                assert_eq!(placement, Placement::Before);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_insert_into_inherited_content() {
        let mut reg = Registry::new();
        reg.set_tangle_parent("child", "parent", loc("setup", 1), vec![])
            .unwrap();
        register(&mut reg, "T", Some("parent"), &["a", "b"], RegistrationMode::New);
        register(&mut reg, "I", Some("child"), &["x"], insert("T", Placement::After, "b"));

        assert_eq!(assembled(&reg, "T", Some("child")), vec!["a", "b", "x"]);
        assert_eq!(assembled(&reg, "T", Some("parent")), vec!["a", "b"]);
    }

    #[test]
    fn test_prepend_in_child_root() {
        let mut reg = Registry::new();
        reg.set_tangle_parent("child", "parent", loc("setup", 1), vec![])
            .unwrap();
        register(&mut reg, "X", Some("parent"), &["1"], RegistrationMode::New);
        register(&mut reg, "X", Some("child"), &["0"], RegistrationMode::Prepend);
        register(&mut reg, "X", Some("child"), &["2"], RegistrationMode::Append);

        assert_eq!(assembled(&reg, "X", Some("child")), vec!["0", "2", "1"]);
    }

    #[test]
    fn test_replace_in_child_root() {
        let mut reg = Registry::new();
        reg.set_tangle_parent("child", "parent", loc("setup", 1), vec![])
            .unwrap();
        register(&mut reg, "X", Some("parent"), &["1"], RegistrationMode::New);
        register(&mut reg, "X", Some("child"), &["2"], RegistrationMode::Replace);

        assert_eq!(assembled(&reg, "X", Some("child")), vec!["2"]);
    }

    #[test]
    fn test_inserted_block_resolved_from_eval_root() {
        let mut reg = Registry::new();
        reg.set_tangle_parent("child", "parent", loc("setup", 1), vec![])
            .unwrap();
        let target = register(&mut reg, "T", Some("parent"), &["a"], RegistrationMode::New);
        register(&mut reg, "I", Some("parent"), &["x"], insert("T", Placement::After, "a"));
        register(&mut reg, "I", Some("child"), &["y"], RegistrationMode::Append);

        let texts = |eval_root| -> Vec<String> {
            reg.all_content(target, eval_root)
                .unwrap()
                .iter()
                .map(|line| line.text.to_string())
                .collect()
        };
        assert_eq!(texts(Some("child")), vec!["a", "x", "y"]);
        assert_eq!(texts(None), vec!["a", "x"]);
    }

    #[test]
    fn test_lines_keep_their_owner() {
        let mut reg = Registry::new();
        let first = register(&mut reg, "X", None, &["a"], RegistrationMode::New);
        let second = register(&mut reg, "X", None, &["b"], RegistrationMode::Append);

        let lines = reg.all_content(second, None).unwrap();
        assert_eq!(lines[0].owner, first);
        assert_eq!(lines[1].owner, second);
    }

    #[test]
    fn test_insertion_cycle_detected() {
        let mut reg = Registry::new();
        let id = register(&mut reg, "B", None, &["b"], insert("B", Placement::Before, "b"));

        let err = reg.all_content(id, None).unwrap_err();
        assert!(matches!(err, LiterateError::CycleDetected(_)));
    }
}
