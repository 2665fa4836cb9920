//! Configuration loading and management.

mod config_data;
mod markers;

use std::fs;
use std::path::{Path, PathBuf};

pub use config_data::Config;
pub use markers::Markers;

use crate::errors::Result;

/// Standard configuration file names to search for.
const CONFIG_FILES: &[&str] = &["literate.toml", ".literate.toml"];

/// Finds the configuration file in the given directory or its parents.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        for name in CONFIG_FILES {
            let candidate = current.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Reads and validates configuration from a TOML file.
pub fn read_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Reads configuration, searching from the given directory.
///
/// If no config file is found, returns the default configuration.
pub fn read_config(start_dir: &Path) -> Result<Config> {
    match find_config_file(start_dir) {
        Some(path) => read_config_file(&path),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_find_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("literate.toml");
        fs::write(&config_path, "version = \"1.0\"").unwrap();

        let found = find_config_file(dir.path()).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_find_config_file_parent() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".literate.toml");
        fs::write(&config_path, "version = \"1.0\"").unwrap();

        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        let found = find_config_file(&subdir).unwrap();
        assert_eq!(found, config_path);
    }

    #[test]
    fn test_find_config_file_not_found() {
        let dir = tempdir().unwrap();
        assert!(find_config_file(dir.path()).is_none());
    }

    #[test]
    fn test_read_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("literate.toml");

        let mut file = fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
source_patterns = ["docs/**/*.md"]
output_dir = "build/code"
write_metadata = false

[markers]
begin = "<<"
end = ">>"
"#
        )
        .unwrap();

        let config = read_config_file(&config_path).unwrap();
        assert_eq!(config.source_patterns, vec!["docs/**/*.md"]);
        assert_eq!(config.output_dir, PathBuf::from("build/code"));
        assert!(!config.write_metadata);
        assert_eq!(config.markers, Markers::new("<<", ">>"));
    }

    #[test]
    fn test_read_config_invalid_markers() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("literate.toml");
        fs::write(&config_path, "[markers]\nbegin = \"\"\n").unwrap();

        assert!(read_config_file(&config_path).is_err());
    }

    #[test]
    fn test_read_config_default() {
        let dir = tempdir().unwrap();
        let config = read_config(dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }
}
