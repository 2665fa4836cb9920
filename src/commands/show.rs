//! Show command implementation.

use crate::errors::Result;
use crate::interface::{build_project, Context};
use crate::model::tangle_with_context;

/// Options for the show command.
#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    /// Block name.
    pub name: String,
    /// Tangle root to tangle from, the default root when unset.
    pub tangle_root: Option<String>,
    /// Print how the block relates to other blocks instead of its content.
    pub relations: bool,
}

/// Executes the show command.
pub fn show(ctx: &Context, options: ShowOptions) -> Result<()> {
    let project = build_project(ctx)?;
    let registry = &project.registry;
    let root = options.tangle_root.as_deref().filter(|r| !r.trim().is_empty());

    let tangled = tangle_with_context(registry, &options.name, root, "")?;

    if options.relations {
        let relations = registry.relations(tangled.block);
        println!("{}", serde_json::to_string_pretty(&relations)?);
    } else {
        println!("{}", tangled.text());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LiterateError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_show_missing_block() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "```{lit} A\na\n```\n").unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        let options = ShowOptions {
            name: "B".to_string(),
            tangle_root: Some("step1".to_string()),
            relations: false,
        };
        let err = show(&ctx, options).unwrap_err();
        assert!(matches!(
            err,
            LiterateError::BlockNotFound { ref tangle_root, .. } if tangle_root.as_deref() == Some("step1")
        ));
    }

    #[test]
    fn test_show_existing_block() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "```{lit} A\na\n```\n").unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        for relations in [false, true] {
            let options = ShowOptions {
                name: "A".to_string(),
                tangle_root: None,
                relations,
            };
            show(&ctx, options).unwrap();
        }
    }
}
