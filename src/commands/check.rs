//! Check command implementation.
//!
//! Builds the project and tangles every output file and every `{tangle}`
//! request without writing anything.

use crate::errors::Result;
use crate::interface::{build_project, tangle_files, tangle_requests, Context};

/// Executes the check command.
pub fn check(ctx: &Context) -> Result<()> {
    tracing::info!("Checking documents...");

    let project = build_project(ctx)?;
    let files = tangle_files(&project.registry)?;
    let requests = tangle_requests(&project)?;

    println!(
        "OK: {} blocks in {} documents, {} output files, {} tangle requests.",
        project.registry.len(),
        project.docnames.len(),
        files.len(),
        requests.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_check_does_not_write() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.md"),
            "```{lit} file: a.txt\n{{B}}\n```\n\n```{lit} B\nb\n```\n\n```{tangle} B\n```\n",
        )
        .unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        check(&ctx).unwrap();
        assert!(!dir.path().join("tangled").exists());
    }

    #[test]
    fn test_check_reports_cycle() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.md"),
            "```{lit} file: a.txt\n{{A}}\n```\n\n```{lit} A\n{{B}}\n```\n\n```{lit} B\n{{A}}\n```\n",
        )
        .unwrap();
        let ctx = Context::default_for_dir(dir.path().to_path_buf());

        let err = check(&ctx).unwrap_err();
        assert!(matches!(err, crate::errors::LiterateError::CycleDetected(_)));
    }
}
