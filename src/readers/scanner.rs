//! Extraction of `{{name}}` references from block content.

use indexmap::IndexMap;
use tracing::warn;
use ulid::Ulid;

use crate::config::Markers;
use crate::text_location::SourceLocation;

/// Content lines with references replaced by placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedContent {
    pub lines: Vec<String>,
    /// Placeholder -> raw reference text between the delimiters.
    pub references: IndexMap<String, String>,
}

/// Generates a placeholder: an underscore followed by a ULID.
///
/// The underscore keeps placeholders valid identifiers in most languages and
/// the ULID gives them a fixed length.
pub fn generate_placeholder() -> String {
    format!("_{}", Ulid::new())
}

/// Replaces every `begin ... end` span with a fresh placeholder.
///
/// A reference must close on the line it opens on. An unclosed delimiter
/// leaves the rest of the line as it is. Empty references are kept literal.
pub fn scan_references<'a, I>(lines: I, markers: &Markers, location: &SourceLocation) -> ScannedContent
where
    I: IntoIterator<Item = &'a str>,
{
    let lines: Vec<&str> = lines.into_iter().collect();
    let mut scanned = ScannedContent {
        lines: Vec::with_capacity(lines.len()),
        references: IndexMap::new(),
    };

    for (offset, line) in lines.iter().enumerate() {
        let mut output = String::with_capacity(line.len());
        let mut rest = *line;

        while let Some(begin) = rest.find(&markers.begin) {
            let after_begin = begin + markers.begin.len();
            let Some(length) = rest[after_begin..].find(&markers.end) else {
                warn!(
                    "unclosed reference '{}' in {}, line {} of the block; expected '{}'",
                    markers.begin,
                    location,
                    offset + 1,
                    markers.end
                );
                break;
            };
            let end = after_begin + length;
            let raw = &rest[after_begin..end];

            output.push_str(&rest[..begin]);
            if raw.trim().is_empty() {
                output.push_str(&rest[begin..end + markers.end.len()]);
            } else {
                let placeholder = fresh_placeholder(&lines, &scanned.references);
                output.push_str(&placeholder);
                scanned.references.insert(placeholder, raw.to_string());
            }
            rest = &rest[end + markers.end.len()..];
        }

        output.push_str(rest);
        scanned.lines.push(output);
    }

    scanned
}

fn fresh_placeholder(lines: &[&str], taken: &IndexMap<String, String>) -> String {
    loop {
        let candidate = generate_placeholder();
        if !taken.contains_key(&candidate) && !lines.iter().any(|line| line.contains(&candidate)) {
            return candidate;
        }
    }
}
