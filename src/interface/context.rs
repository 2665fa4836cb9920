//! Execution context for literate operations.

use std::path::{Component, Path, PathBuf};

use crate::config::Config;
use crate::errors::Result;

/// Context for literate operations: configuration and project directory.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    /// Directory source patterns and the output directory are relative to.
    pub base_dir: PathBuf,
}

impl Context {
    /// Creates a new context with the given configuration.
    pub fn new(config: Config, base_dir: PathBuf) -> Self {
        Self { config, base_dir }
    }

    /// Creates a context with default configuration.
    pub fn default_for_dir(base_dir: PathBuf) -> Self {
        Self::new(Config::default(), base_dir)
    }

    /// Creates a context for `base_dir`, reading the configuration from
    /// `config_path` or from the nearest configuration file.
    pub fn load(base_dir: PathBuf, config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => crate::config::read_config_file(path)?,
            None => crate::config::read_config(&base_dir)?,
        };
        Ok(Self::new(config, base_dir))
    }

    /// Creates a context from the current directory.
    pub fn from_current_dir() -> Result<Self> {
        Self::load(std::env::current_dir()?, None)
    }

    /// Returns source documents matching the configured patterns, relative
    /// to the base directory, sorted and deduplicated.
    ///
    /// Files inside the output directory are skipped.
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        let output_dir = self.config.output_dir();
        let mut files = Vec::new();
        for pattern in self.config.source_patterns() {
            let full_pattern = self.base_dir.join(pattern);
            for path in glob::glob(&full_pattern.to_string_lossy())?.filter_map(|r| r.ok()) {
                if !path.is_file() {
                    continue;
                }
                let relative = path
                    .strip_prefix(&self.base_dir)
                    .map(Path::to_path_buf)
                    .unwrap_or(path);
                if !relative.starts_with(output_dir) {
                    files.push(relative);
                }
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Document name of a source file: its path relative to the base
    /// directory, without extension, `/` separated.
    pub fn docname_for(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.base_dir).unwrap_or(path);
        let stem = relative.with_extension("");
        stem.components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Returns the absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(self.config.output_dir())
    }

    /// Directory receiving the files of a tangle root.
    pub fn root_dir(&self, tangle_root: Option<&str>) -> PathBuf {
        let output_dir = self.output_dir();
        match tangle_root {
            Some(root) => output_dir.join(root),
            None => output_dir,
        }
    }

    /// Resolves a path relative to the base directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_path() {
        let dir = tempdir().unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        assert_eq!(ctx.resolve_path(Path::new("src/main.rs")), dir.path().join("src/main.rs"));
        assert_eq!(
            ctx.resolve_path(Path::new("/absolute/path")),
            PathBuf::from("/absolute/path")
        );
    }

    #[test]
    fn test_source_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("chapters")).unwrap();
        fs::create_dir_all(dir.path().join("tangled")).unwrap();
        fs::write(dir.path().join("intro.md"), "# Intro").unwrap();
        fs::write(dir.path().join("chapters/b.md"), "# B").unwrap();
        fs::write(dir.path().join("other.txt"), "text").unwrap();
        fs::write(dir.path().join("tangled/README.md"), "generated").unwrap();

        let ctx = Context::default_for_dir(dir.path().to_path_buf());
        let files = ctx.source_files().unwrap();

        assert_eq!(
            files,
            vec![PathBuf::from("chapters/b.md"), PathBuf::from("intro.md")]
        );
    }

    #[test]
    fn test_docname_and_root_dir() {
        let dir = tempdir().unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        assert_eq!(ctx.docname_for(Path::new("chapters/b.md")), "chapters/b");
        assert_eq!(ctx.docname_for(&dir.path().join("intro.md")), "intro");
        assert_eq!(ctx.root_dir(None), dir.path().join("tangled"));
        assert_eq!(ctx.root_dir(Some("step1")), dir.path().join("tangled/step1"));
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "output_dir = \"build\"\n").unwrap();

        let ctx = Context::load(dir.path().to_path_buf(), Some(&path)).unwrap();
        assert_eq!(ctx.output_dir(), dir.path().join("build"));
    }
}
