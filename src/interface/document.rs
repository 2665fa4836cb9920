//! Project builds: parse every document, merge, tangle.
//!
//! Documents are parsed on worker threads into independent registries,
//! which are then merged in document order so that the result does not
//! depend on scheduling.

use std::path::{Path, PathBuf};
use std::thread;

use tracing::{debug, info};

use crate::errors::{LiterateError, Result};
use crate::io::{existing_digest, hexdigest_str, Metadata, Transaction, METADATA_FILE};
use crate::model::{root_label, tangle_with_context, Registry, Tangled};
use crate::readers::{read_markdown_file, ParsedDocument, TangleRequest};

use super::context::Context;

/// The merged state of all documents of a project.
#[derive(Debug, Default)]
pub struct Project {
    pub registry: Registry,
    pub tangle_requests: Vec<TangleRequest>,
    /// Names of the merged documents, in merge order.
    pub docnames: Vec<String>,
}

/// A tangled `file:` block and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TangledFile {
    pub tangle_root: Option<String>,
    /// Path relative to the root's output directory.
    pub path: String,
    pub content: String,
}

/// Parses every source document of the context, in source file order.
pub fn load_documents(ctx: &Context) -> Result<Vec<ParsedDocument>> {
    let files: Vec<(PathBuf, String)> = ctx
        .source_files()?
        .into_iter()
        .map(|path| {
            let docname = ctx.docname_for(&path);
            (ctx.resolve_path(&path), docname)
        })
        .collect();
    if files.is_empty() {
        return Ok(Vec::new());
    }

    let jobs = ctx.config.jobs().clamp(1, files.len());
    let chunk_size = files.len().div_ceil(jobs);
    debug!("parsing {} documents with {} workers", files.len(), jobs);

    let markers = &ctx.config.markers;
    let chunks: Vec<Result<Vec<ParsedDocument>>> = thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|(path, docname)| read_markdown_file(path, docname, markers))
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(LiterateError::Other("document parser panicked".to_string())))
            })
            .collect()
    });

    let mut documents = Vec::with_capacity(files.len());
    for chunk in chunks {
        documents.extend(chunk?);
    }
    Ok(documents)
}

/// Merges parsed documents in order and checks the result is complete.
pub fn merge_documents(documents: Vec<ParsedDocument>) -> Result<Project> {
    let mut project = Project::default();
    for document in documents {
        debug!("merging document '{}'", document.docname);
        project.registry.merge(&document.registry)?;
        project.tangle_requests.extend(document.tangle_requests);
        project.docnames.push(document.docname);
    }
    project.registry.check_integrity(false)?;
    Ok(project)
}

/// Parses and merges all documents of the context.
pub fn build_project(ctx: &Context) -> Result<Project> {
    let documents = load_documents(ctx)?;
    let project = merge_documents(documents)?;
    info!(
        "loaded {} documents, {} blocks",
        project.docnames.len(),
        project.registry.len()
    );
    Ok(project)
}

/// Tangles every `file:` block visible from every tangle root.
pub fn tangle_files(registry: &Registry) -> Result<Vec<TangledFile>> {
    let mut files = Vec::new();
    for root in registry.tangle_roots() {
        for target in registry.file_targets(root)? {
            let context = format!("output file '{}', ", target.path);
            let tangled = tangle_with_context(registry, &target.name, root, &context)?;
            files.push(TangledFile {
                tangle_root: root.map(str::to_string),
                path: target.path,
                content: tangled.text(),
            });
        }
    }
    Ok(files)
}

/// Tangles every `{tangle}` request of the project.
pub fn tangle_requests(project: &Project) -> Result<Vec<Tangled>> {
    project
        .tangle_requests
        .iter()
        .map(|request| {
            let context = format!("requested in {}, ", request.source_location);
            tangle_with_context(
                &project.registry,
                &request.name,
                request.tangle_root.as_deref(),
                &context,
            )
        })
        .collect()
}

/// Plans the writes that bring the output directory up to date.
///
/// Files whose digest did not change are left alone. Fetch files are
/// copied into their root's directory. `metadata.json` is rewritten when
/// the generated files differ from the previous build.
pub fn tangle_documents(ctx: &Context, project: &Project) -> Result<Transaction> {
    let registry = &project.registry;
    let mut transaction = Transaction::new();

    let named_roots = registry
        .tangle_roots()
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    let mut metadata = Metadata::new(named_roots);

    for file in tangle_files(registry)? {
        let root = file.tangle_root.as_deref();
        let target = ctx.root_dir(root).join(&file.path);
        let digest = hexdigest_str(&file.content);

        if existing_digest(&target)?.as_deref() != Some(digest.as_str()) {
            debug!("{} changed in {}", file.path, root_label(root));
            transaction.write(target, file.content);
        }
        metadata.record(root, &file.path, digest);
    }

    for entry in registry.hierarchy().entries() {
        let root_dir = ctx.root_dir(Some(entry.root.as_str()));
        for source in &entry.fetch_files {
            plan_fetch(ctx, &mut transaction, source, &root_dir)?;
        }
    }

    if ctx.config.write_metadata {
        let metadata_path = ctx.output_dir().join(METADATA_FILE);
        let up_to_date = Metadata::load(&metadata_path)?
            .is_some_and(|previous| previous.same_outputs(&metadata));
        if !up_to_date {
            transaction.write(metadata_path, metadata.to_json()?);
        }
    }

    Ok(transaction)
}

fn plan_fetch(ctx: &Context, transaction: &mut Transaction, source: &Path, root_dir: &Path) -> Result<()> {
    let source = ctx.resolve_path(source);
    let Some(file_name) = source.file_name() else {
        return Err(LiterateError::Config(format!(
            "fetch file '{}' has no file name",
            source.display()
        )));
    };
    let target = root_dir.join(file_name);

    let digest = existing_digest(&source)?.ok_or_else(|| {
        LiterateError::Config(format!("fetch file '{}' does not exist", source.display()))
    })?;
    if existing_digest(&target)?.as_deref() != Some(digest.as_str()) {
        transaction.copy(source, target);
    }
    Ok(())
}
