//! Shared test utilities.

use crate::config::Markers;
use crate::model::{Block, BlockId, BlockLink, RegistrationMode, Registry};
use crate::readers::scan_references;
use crate::text_location::SourceLocation;

/// Shorthand for a source location.
pub fn loc(docname: &str, lineno: usize) -> SourceLocation {
    SourceLocation::new(docname, lineno)
}

/// Creates a test block without references.
pub fn make_block(name: &str, root: Option<&str>, lines: &[&str]) -> Block {
    Block::new(
        name,
        root.map(str::to_string),
        lines.iter().map(|line| line.to_string()).collect(),
        loc("doc", 1),
    )
}

/// Creates a test block whose `{{name}}` references are scanned.
pub fn make_block_with_refs(name: &str, root: Option<&str>, lines: &[&str]) -> Block {
    let location = loc("doc", 1);
    let scanned = scan_references(lines.iter().copied(), &Markers::default(), &location);
    let links = scanned
        .references
        .into_iter()
        .map(|(placeholder, raw)| (placeholder, BlockLink::new(raw, root.map(str::to_string))))
        .collect();
    Block::new(name, root.map(str::to_string), scanned.lines, location).with_links(links)
}

/// Registers a test block and returns its id.
pub fn register(
    registry: &mut Registry,
    name: &str,
    root: Option<&str>,
    lines: &[&str],
    mode: RegistrationMode,
) -> BlockId {
    registry
        .register_block(make_block(name, root, lines), mode)
        .unwrap()
}

/// Returns the assembled content `name` resolves to from `root`.
pub fn assembled(registry: &Registry, name: &str, root: Option<&str>) -> Vec<String> {
    let id = registry.resolve_predecessor(name, root, None).unwrap();
    registry
        .all_content(id, root)
        .unwrap()
        .iter()
        .map(|line| line.text.to_string())
        .collect()
}
