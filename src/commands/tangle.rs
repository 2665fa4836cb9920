//! Tangle command implementation.

use crate::errors::Result;
use crate::interface::{build_project, tangle_documents, Context};

/// Options for the tangle command.
#[derive(Debug, Clone, Default)]
pub struct TangleOptions {
    /// Dry run - show what would be done without doing it.
    pub dry_run: bool,
}

/// Executes the tangle command.
pub fn tangle(ctx: &Context, options: TangleOptions) -> Result<()> {
    tracing::info!("Tangling documents...");

    let project = build_project(ctx)?;
    let transaction = tangle_documents(ctx, &project)?;

    if transaction.is_empty() {
        println!("Everything up to date.");
        return Ok(());
    }

    if options.dry_run {
        println!("Would perform {} actions:", transaction.len());
        for desc in transaction.describe() {
            println!("  {}", desc);
        }
        return Ok(());
    }

    transaction.execute()?;
    println!("Performed {} actions.", transaction.len());

    Ok(())
}
