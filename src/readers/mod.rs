//! Readers for markdown documents with literate directives.

mod delimiters;
mod markdown;
mod scanner;
mod setup;
mod title;

pub use delimiters::{extract_all_tokens, DelimitedToken, DelimitedTokenGetter, ExtractResult};
pub use markdown::{parse_markdown, read_markdown_file, ParsedDocument, TangleRequest};
pub use scanner::{generate_placeholder, scan_references, ScannedContent};
pub use setup::{split_options, SetupOptions};
pub use title::{parse_block_link, parse_block_title, ParsedTitle};
