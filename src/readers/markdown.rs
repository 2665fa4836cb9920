//! Markdown documents with literate directives.
//!
//! Three fenced directives are recognized:
//!
//! - `{lit} [lexer,] name [(options)]` defines a literate block,
//! - `{lit-setup}` switches the tangle root of the following blocks and
//!   declares its parent,
//! - `{tangle} name` asks for the block to be tangled.
//!
//! Every document starts in the default tangle root.

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::Markers;
use crate::errors::Result;
use crate::model::{normalize_root, Block, BlockLink, Registry};
use crate::text_location::SourceLocation;

use super::delimiters::{extract_all_tokens, DelimitedToken, ExtractResult};
use super::scanner::scan_references;
use super::setup::{split_options, SetupOptions};
use super::title::{parse_block_link, parse_block_title};

/// A `{tangle}` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TangleRequest {
    pub name: String,
    pub tangle_root: Option<String>,
    pub lexer: Option<String>,
    pub source_location: SourceLocation,
}

/// A parsed document: its own registry and the tangle requests it holds.
#[derive(Debug, Default)]
pub struct ParsedDocument {
    pub docname: String,
    pub registry: Registry,
    pub tangle_requests: Vec<TangleRequest>,
}

impl ParsedDocument {
    /// Creates a new empty parsed document.
    pub fn new(docname: impl Into<String>) -> Self {
        Self {
            docname: docname.into(),
            ..Self::default()
        }
    }
}

/// Reading state carried from one directive to the next.
struct DocumentReader<'a> {
    doc: ParsedDocument,
    base_dir: &'a Path,
    markers: &'a Markers,
    tangle_root: Option<String>,
}

/// Parses a markdown document.
///
/// `base_dir` is the directory fetch files are relative to.
pub fn parse_markdown(
    input: &str,
    docname: &str,
    base_dir: &Path,
    markers: &Markers,
) -> Result<ParsedDocument> {
    let mut reader = DocumentReader {
        doc: ParsedDocument::new(docname),
        base_dir,
        markers,
        tangle_root: None,
    };

    for result in extract_all_tokens(input) {
        match result {
            ExtractResult::Token(token) => reader.process(&token)?,
            ExtractResult::Unclosed { info, line } => {
                warn!(
                    "unclosed code fence '{}' in {}",
                    info,
                    SourceLocation::new(docname, line)
                );
            }
            ExtractResult::NotDelimited(_) => {}
        }
    }

    debug!(
        "document '{}': {} blocks, {} tangle requests",
        docname,
        reader.doc.registry.len(),
        reader.doc.tangle_requests.len()
    );
    Ok(reader.doc)
}

/// Reads a markdown file and parses it.
pub fn read_markdown_file(path: &Path, docname: &str, markers: &Markers) -> Result<ParsedDocument> {
    let content = std::fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    parse_markdown(&content, docname, base_dir, markers)
}

impl DocumentReader<'_> {
    fn process(&mut self, token: &DelimitedToken) -> Result<()> {
        let Some((directive, argument)) = token.directive() else {
            return Ok(());
        };
        let location = SourceLocation::new(self.doc.docname.as_str(), token.line);

        match directive {
            "lit" => self.process_block(token, argument, location),
            "lit-setup" => self.process_setup(token, location),
            "tangle" => {
                let title = parse_block_title(argument, self.markers)?;
                self.doc.tangle_requests.push(TangleRequest {
                    name: title.name,
                    tangle_root: self.tangle_root.clone(),
                    lexer: title.lexer,
                    source_location: location,
                });
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn process_block(
        &mut self,
        token: &DelimitedToken,
        argument: &str,
        location: SourceLocation,
    ) -> Result<()> {
        let title = parse_block_title(argument, self.markers)?;
        let (_, body) = split_options(&token.lines)?;

        let scanned = scan_references(body.iter().map(String::as_str), self.markers, &location);
        let links = scanned
            .references
            .into_iter()
            .map(|(placeholder, raw)| {
                parse_block_link(&raw, self.tangle_root.clone(), &location)
                    .map(|link| (placeholder, link))
            })
            .collect::<Result<IndexMap<String, BlockLink>>>()?;

        let mut block = Block::new(title.name, self.tangle_root.clone(), scanned.lines, location)
            .with_links(links)
            .with_hidden(title.hidden);
        if let Some(lexer) = title.lexer {
            block = block.with_lexer(lexer);
        }

        self.doc.registry.register_block(block, title.mode)?;
        Ok(())
    }

    fn process_setup(&mut self, token: &DelimitedToken, location: SourceLocation) -> Result<()> {
        let (options, _) = split_options(&token.lines)?;
        let setup = SetupOptions::from_options(options)?;

        if let Some(root) = &setup.tangle_root {
            self.tangle_root = normalize_root(Some(root.clone()));
        }

        let fetch_files = setup.fetch_files(self.base_dir);
        match &setup.parent {
            Some(parent) => {
                let root = self.tangle_root.as_deref().unwrap_or_default();
                self.doc
                    .registry
                    .set_tangle_parent(root, parent, location, fetch_files)?;
            }
            None if !fetch_files.is_empty() => {
                warn!("fetch-files in {} ignored: no parent declared", location);
            }
            None => {}
        }
        Ok(())
    }
}
