//! literate - block registry and tangler for literate documents
//!
//! Documents define named code blocks that reference each other with
//! `{{name}}`. Blocks live in tangle roots; a root may declare a parent and
//! then inherits its blocks, overriding them by appending, prepending,
//! replacing or inserting lines. Tangling a `file:` block from a root
//! expands its references as seen from that root.
//!
//! # Example
//!
//! ```
//! use literate::model::{Block, Registry, RegistrationMode};
//! use literate::text_location::SourceLocation;
//!
//! let mut registry = Registry::new();
//! let block = Block::new("Main", None, vec!["fn main() {}".to_string()], SourceLocation::new("intro", 1));
//! registry.register_block(block, RegistrationMode::New).unwrap();
//!
//! let tangled = literate::tangle(&registry, "Main", None).unwrap();
//! assert_eq!(tangled.text(), "fn main() {}");
//! ```

pub mod commands;
pub mod config;
pub mod errors;
pub mod interface;
pub mod io;
pub mod model;
pub mod readers;
pub mod text_location;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use errors::{LiterateError, Result};
pub use interface::Context;
pub use model::{tangle, Block, Registry};
