//! `metadata.json`, written next to the tangled roots.
//!
//! Lists the named tangle roots and the digest of every generated file so
//! that external tooling can tell which roots changed between two builds.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// File name of the metadata file inside the output directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Key of the default root in [`Metadata::files`].
const DEFAULT_ROOT_KEY: &str = "";

/// Content of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub generated_at: DateTime<Utc>,
    /// Named tangle roots, each one a directory of the output directory.
    pub roots: Vec<String>,
    /// Root -> path relative to the root directory -> SHA256 digest.
    #[serde(default)]
    pub files: BTreeMap<String, BTreeMap<String, String>>,
}

impl Metadata {
    pub fn new(roots: Vec<String>) -> Self {
        Self {
            generated_at: Utc::now(),
            roots,
            files: BTreeMap::new(),
        }
    }

    /// Records the digest of a generated file.
    pub fn record(&mut self, root: Option<&str>, path: &str, digest: impl Into<String>) {
        self.files
            .entry(root.unwrap_or(DEFAULT_ROOT_KEY).to_string())
            .or_default()
            .insert(path.to_string(), digest.into());
    }

    /// Loads a metadata file, `None` when absent.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// True when both describe the same roots and files, timestamps aside.
    pub fn same_outputs(&self, other: &Metadata) -> bool {
        self.roots == other.roots && self.files == other.files
    }

    /// Named roots whose files differ from `previous`, in `roots` order.
    pub fn changed_roots(&self, previous: &Metadata) -> Vec<String> {
        self.roots
            .iter()
            .filter(|root| self.files.get(root.as_str()) != previous.files.get(root.as_str()))
            .cloned()
            .collect()
    }
}
