//! Parent/child relations between tangle roots.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{LiterateError, Result};
use crate::text_location::SourceLocation;

/// The first declaration of a tangle root's parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub root: String,
    pub parent: String,
    /// Where the parent was first declared.
    pub source_location: SourceLocation,
    /// Extra files copied into the root's output directory.
    #[serde(default)]
    pub fetch_files: Vec<PathBuf>,
}

/// Maps each tangle root to its parent.
///
/// The default root is the implicit ancestor of every root: lookups that
/// exhaust the declared parents end there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    entries: IndexMap<String, HierarchyEntry>,
}

impl Hierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `parent` as the parent of `root`.
    ///
    /// Redeclaring the same parent only accumulates fetch files. Returns true
    /// when a new edge was added.
    pub fn set_parent(
        &mut self,
        root: &str,
        parent: &str,
        source_location: SourceLocation,
        fetch_files: Vec<PathBuf>,
    ) -> Result<bool> {
        let root = root.trim();
        let parent = parent.trim();

        if root.is_empty() {
            return Err(LiterateError::InvalidHierarchy {
                location: source_location,
                message: "the default tangle root cannot have a parent".to_string(),
            });
        }
        if parent.is_empty() {
            return Err(LiterateError::InvalidHierarchy {
                location: source_location,
                message: format!("empty parent given for tangle root '{}'", root),
            });
        }
        if root == parent {
            return Err(LiterateError::SelfParent {
                root: root.to_string(),
                location: source_location,
            });
        }

        if let Some(existing) = self.entries.get_mut(root) {
            if existing.parent != parent {
                return Err(LiterateError::HierarchyConflict {
                    root: root.to_string(),
                    existing: existing.parent.clone(),
                    existing_location: existing.source_location.clone(),
                    requested: parent.to_string(),
                    location: source_location,
                });
            }
            for file in fetch_files {
                if !existing.fetch_files.contains(&file) {
                    existing.fetch_files.push(file);
                }
            }
            return Ok(false);
        }

        if self.lineage(Some(parent)).contains(&Some(root)) {
            return Err(LiterateError::HierarchyCycle {
                root: root.to_string(),
                parent: parent.to_string(),
                location: source_location,
            });
        }

        self.entries.insert(
            root.to_string(),
            HierarchyEntry {
                root: root.to_string(),
                parent: parent.to_string(),
                source_location,
                fetch_files,
            },
        );
        Ok(true)
    }

    /// Returns the declared parent of a root.
    pub fn parent(&self, root: Option<&str>) -> Option<&str> {
        root.and_then(|r| self.entries.get(r))
            .map(|entry| entry.parent.as_str())
    }

    /// Returns the entry declared for a root.
    pub fn get(&self, root: &str) -> Option<&HierarchyEntry> {
        self.entries.get(root)
    }

    /// Returns all entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &HierarchyEntry> {
        self.entries.values()
    }

    /// Returns every root named by the hierarchy, children and parents.
    pub fn roots(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = Vec::new();
        for entry in self.entries.values() {
            for root in [entry.root.as_str(), entry.parent.as_str()] {
                if !roots.contains(&root) {
                    roots.push(root);
                }
            }
        }
        roots
    }

    /// Returns the fetch files declared for a root.
    pub fn fetch_files(&self, root: &str) -> &[PathBuf] {
        self.entries
            .get(root)
            .map(|entry| entry.fetch_files.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the root itself, its declared ancestors from closest to
    /// farthest, then the default root.
    pub fn lineage<'a>(&'a self, root: Option<&'a str>) -> Vec<Option<&'a str>> {
        let mut chain = vec![root];
        let mut current = root;
        while let Some(parent) = self.parent(current) {
            // Guards against cycles in deserialized data.
            if chain.contains(&Some(parent)) || chain.len() > self.entries.len() {
                break;
            }
            chain.push(Some(parent));
            current = Some(parent);
        }
        if root.is_some() {
            chain.push(None);
        }
        chain
    }

    /// Checks if `ancestor` is `root` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: Option<&str>, root: Option<&str>) -> bool {
        self.lineage(root).contains(&ancestor)
    }

    /// Checks if `ancestor` is a strict ancestor of `root`.
    pub fn is_strict_ancestor(&self, ancestor: Option<&str>, root: Option<&str>) -> bool {
        ancestor != root && self.is_ancestor_or_self(ancestor, root)
    }

    /// Copies the entries of `other`, validating parent declarations.
    ///
    /// Returns the roots that received a new parent.
    pub fn merge(&mut self, other: &Hierarchy) -> Result<Vec<String>> {
        let mut added = Vec::new();
        for entry in other.entries() {
            if self.set_parent(
                &entry.root,
                &entry.parent,
                entry.source_location.clone(),
                entry.fetch_files.clone(),
            )? {
                added.push(entry.root.clone());
            }
        }
        Ok(added)
    }

    /// Returns the number of declared edges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no parent was declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: usize) -> SourceLocation {
        SourceLocation::new("setup", line)
    }

    #[test]
    fn test_lineage() {
        let mut h = Hierarchy::new();
        h.set_parent("c", "p", loc(1), vec![]).unwrap();
        h.set_parent("p", "g", loc(2), vec![]).unwrap();

        assert_eq!(h.lineage(Some("c")), vec![Some("c"), Some("p"), Some("g"), None]);
        assert_eq!(h.lineage(None), vec![None]);
        assert!(h.is_strict_ancestor(Some("g"), Some("c")));
        assert!(h.is_strict_ancestor(None, Some("c")));
        assert!(!h.is_strict_ancestor(Some("c"), Some("c")));
        assert!(!h.is_ancestor_or_self(Some("c"), Some("p")));
    }

    #[test]
    fn test_self_parent() {
        let mut h = Hierarchy::new();
        let err = h.set_parent("a", "a", loc(1), vec![]).unwrap_err();
        assert!(matches!(err, LiterateError::SelfParent { .. }));
    }

    #[test]
    fn test_conflicting_parent() {
        let mut h = Hierarchy::new();
        h.set_parent("a", "b", loc(1), vec![]).unwrap();
        let err = h.set_parent("a", "c", loc(5), vec![]).unwrap_err();
        assert!(matches!(err, LiterateError::HierarchyConflict { .. }));
        assert!(err.to_string().contains("line 1"));
        assert!(err.to_string().contains("line 5"));
    }

    #[test]
    fn test_same_parent_accumulates_fetch_files() {
        let mut h = Hierarchy::new();
        assert!(h
            .set_parent("a", "b", loc(1), vec![PathBuf::from("x.h")])
            .unwrap());
        assert!(!h
            .set_parent("a", "b", loc(9), vec![PathBuf::from("x.h"), PathBuf::from("y.h")])
            .unwrap());
        assert_eq!(
            h.fetch_files("a"),
            &[PathBuf::from("x.h"), PathBuf::from("y.h")]
        );
        assert_eq!(h.get("a").unwrap().source_location.lineno, 1);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut h = Hierarchy::new();
        h.set_parent("a", "b", loc(1), vec![]).unwrap();
        h.set_parent("b", "c", loc(2), vec![]).unwrap();
        let err = h.set_parent("c", "a", loc(3), vec![]).unwrap_err();
        assert!(matches!(err, LiterateError::HierarchyCycle { .. }));
    }

    #[test]
    fn test_default_root_cannot_have_parent() {
        let mut h = Hierarchy::new();
        assert!(h.set_parent("", "b", loc(1), vec![]).is_err());
        assert!(h.set_parent("a", " ", loc(1), vec![]).is_err());
    }

    #[test]
    fn test_merge() {
        let mut a = Hierarchy::new();
        a.set_parent("x", "y", loc(1), vec![]).unwrap();
        let mut b = Hierarchy::new();
        b.set_parent("x", "y", loc(2), vec![]).unwrap();
        b.set_parent("z", "x", loc(3), vec![]).unwrap();

        let added = a.merge(&b).unwrap();
        assert_eq!(added, vec!["z".to_string()]);
        assert_eq!(a.roots(), vec!["x", "y", "z"]);

        let mut c = Hierarchy::new();
        c.set_parent("x", "other", loc(4), vec![]).unwrap();
        assert!(a.merge(&c).is_err());
    }
}
