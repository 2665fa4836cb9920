//! Directive options.
//!
//! Options are written either as leading `:key: value` lines or as a leading
//! YAML block between `---` lines.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use crate::errors::Result;

/// Pattern for a `:key: value` option line.
static OPTION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:(?P<key>[\w-]+):\s*(?P<value>.*)$").unwrap());

const YAML_DELIMITER: &str = "---";

/// Splits the leading options of a directive body from its content.
pub fn split_options(lines: &[String]) -> Result<(IndexMap<String, Value>, &[String])> {
    let mut options = IndexMap::new();

    let body = if lines.first().map(|line| line.trim()) == Some(YAML_DELIMITER) {
        let Some(end) = lines[1..].iter().position(|line| line.trim() == YAML_DELIMITER) else {
            return Ok((options, lines));
        };
        let yaml = lines[1..=end].join("\n");
        if !yaml.trim().is_empty() {
            options = serde_yaml::from_str(&yaml)?;
        }
        &lines[end + 2..]
    } else {
        let mut count = 0;
        for line in lines {
            let Some(caps) = OPTION_LINE.captures(line) else {
                break;
            };
            options.insert(
                caps["key"].to_string(),
                Value::String(caps["value"].trim().to_string()),
            );
            count += 1;
        }
        &lines[count..]
    };

    let body = match body.first() {
        Some(line) if !options.is_empty() && line.trim().is_empty() => &body[1..],
        _ => body,
    };
    Ok((options, body))
}

/// Options of the `lit-setup` directive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SetupOptions {
    /// Root used by the following blocks of the document.
    #[serde(default)]
    pub tangle_root: Option<String>,

    /// Parent of the current root.
    #[serde(default)]
    pub parent: Option<String>,

    /// Whitespace separated string or list of paths.
    #[serde(default)]
    pub fetch_files: Option<Value>,
}

impl SetupOptions {
    /// Builds setup options from parsed directive options.
    ///
    /// Unknown options are ignored.
    pub fn from_options(options: IndexMap<String, Value>) -> Result<Self> {
        let mapping: serde_yaml::Mapping = options
            .into_iter()
            .map(|(key, value)| (Value::String(key), value))
            .collect();
        Ok(serde_yaml::from_value(Value::Mapping(mapping))?)
    }

    /// Returns the fetch files, relative paths joined to `base_dir`.
    pub fn fetch_files(&self, base_dir: &Path) -> Vec<PathBuf> {
        let mut raw: Vec<String> = Vec::new();
        match &self.fetch_files {
            Some(Value::String(files)) => {
                raw.extend(files.split_whitespace().map(str::to_string));
            }
            Some(Value::Sequence(files)) => {
                raw.extend(files.iter().filter_map(Value::as_str).map(str::to_string));
            }
            _ => {}
        }
        raw.into_iter().map(|file| base_dir.join(file)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_colon_options() {
        let input = lines(&[":tangle-root: step1", ":parent: step0", "", "content"]);
        let (options, body) = split_options(&input).unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(body, &input[3..]);

        let setup = SetupOptions::from_options(options).unwrap();
        assert_eq!(setup.tangle_root.as_deref(), Some("step1"));
        assert_eq!(setup.parent.as_deref(), Some("step0"));
    }

    #[test]
    fn test_yaml_options() {
        let input = lines(&[
            "---",
            "tangle-root: step2",
            "fetch-files:",
            "  - data/a.txt",
            "  - b.txt",
            "---",
        ]);
        let (options, body) = split_options(&input).unwrap();
        assert!(body.is_empty());

        let setup = SetupOptions::from_options(options).unwrap();
        assert_eq!(setup.tangle_root.as_deref(), Some("step2"));
        assert_eq!(
            setup.fetch_files(Path::new("docs")),
            vec![PathBuf::from("docs/data/a.txt"), PathBuf::from("docs/b.txt")]
        );
    }

    #[test]
    fn test_fetch_files_string() {
        let input = lines(&[":fetch-files: a.h  b.h"]);
        let (options, _) = split_options(&input).unwrap();
        let setup = SetupOptions::from_options(options).unwrap();
        assert_eq!(
            setup.fetch_files(Path::new("")),
            vec![PathBuf::from("a.h"), PathBuf::from("b.h")]
        );
    }

    #[test]
    fn test_no_options() {
        let input = lines(&["", "int x;"]);
        let (options, body) = split_options(&input).unwrap();
        assert!(options.is_empty());
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_unknown_options_ignored() {
        let input = lines(&[":force:", ":linenothreshold: 5"]);
        let (options, _) = split_options(&input).unwrap();
        let setup = SetupOptions::from_options(options).unwrap();
        assert_eq!(setup, SetupOptions::default());
    }
}
