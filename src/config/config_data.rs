//! Configuration data structures.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::markers::Markers;
use crate::errors::{LiterateError, Result};

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Version of the configuration format.
    #[serde(default = "default_version")]
    pub version: String,

    /// Reference delimiters.
    #[serde(default)]
    pub markers: Markers,

    /// Glob patterns for source documents.
    #[serde(default = "default_source_patterns")]
    pub source_patterns: Vec<String>,

    /// Directory receiving one subdirectory per tangle root.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of documents parsed in parallel, all cores when unset.
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Whether to write `metadata.json` next to the tangled files.
    #[serde(default = "default_write_metadata")]
    pub write_metadata: bool,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_source_patterns() -> Vec<String> {
    vec!["**/*.md".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("tangled")
}

fn default_write_metadata() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            markers: Markers::default(),
            source_patterns: default_source_patterns(),
            output_dir: default_output_dir(),
            jobs: None,
            write_metadata: default_write_metadata(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks values serde cannot check.
    pub fn validate(&self) -> Result<()> {
        self.markers.validate()?;
        if self.jobs == Some(0) {
            return Err(LiterateError::Config("jobs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Returns all source patterns.
    pub fn source_patterns(&self) -> &[String] {
        &self.source_patterns
    }

    /// Returns the output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the number of parsing workers.
    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
