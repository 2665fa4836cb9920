//! Planned file operations, executed in order.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::errors::Result;

/// An action that can be executed as part of a transaction.
pub trait Action: std::fmt::Debug + Send + Sync {
    /// Returns the target file path.
    fn target(&self) -> &Path;

    /// Executes the action.
    fn execute(&self) -> Result<()>;

    /// Returns a description of this action.
    fn describe(&self) -> String;
}

/// Writes a tangled file, creating its directory.
#[derive(Debug)]
pub struct WriteFile {
    pub path: PathBuf,
    pub content: String,
}

impl WriteFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

impl Action for WriteFile {
    fn target(&self) -> &Path {
        &self.path
    }

    fn execute(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&self.path, &self.content)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("write {}", self.path.display())
    }
}

/// Copies a fetch file into a root's output directory.
#[derive(Debug)]
pub struct CopyFile {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl CopyFile {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl Action for CopyFile {
    fn target(&self) -> &Path {
        &self.target
    }

    fn execute(&self) -> Result<()> {
        if let Some(parent) = self.target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&self.source, &self.target)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("copy {} -> {}", self.source.display(), self.target.display())
    }
}

/// An ordered list of file actions.
#[derive(Debug, Default)]
pub struct Transaction {
    actions: Vec<Box<dyn Action>>,
}

impl Transaction {
    /// Creates a new empty transaction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Adds an action to the transaction.
    pub fn add(&mut self, action: impl Action + 'static) {
        self.actions.push(Box::new(action));
    }

    /// Adds a write action.
    pub fn write(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.add(WriteFile::new(path, content));
    }

    /// Adds a copy action.
    pub fn copy(&mut self, source: impl Into<PathBuf>, target: impl Into<PathBuf>) {
        self.add(CopyFile::new(source, target));
    }

    /// Returns the number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if there are no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the target paths of all actions.
    pub fn targets(&self) -> Vec<&Path> {
        self.actions.iter().map(|a| a.target()).collect()
    }

    /// Returns descriptions of all actions.
    pub fn describe(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.describe()).collect()
    }

    /// Executes all actions in order, stopping at the first failure.
    pub fn execute(&self) -> Result<()> {
        for action in &self.actions {
            debug!("{}", action.describe());
            action.execute()?;
        }
        Ok(())
    }
}

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Writes content to a file atomically using a temp file.
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let temp_path = parent.join(format!(
        ".literate-tmp-{}-{}",
        std::process::id(),
        counter,
    ));

    {
        let mut file = File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}
