//! Core model types: blocks, the registry and tangling.

mod block;
mod block_key;
mod block_link;
mod content;
mod hierarchy;
mod registry;
mod tangle;
mod uid;

pub use block::{Block, BlockId, InsertLocation, Placement, RegistrationMode, Relation};
pub use block_key::{file_path, is_file_target, normalize_root, root_label, BlockKey, FILE_PREFIX, KEY_SEPARATOR};
pub use block_link::{BlockLink, LinkOption};
pub use content::ContentLine;
pub use hierarchy::{Hierarchy, HierarchyEntry};
pub use registry::{BlockRelations, FileTarget, RelatedBlock, Registry};
pub use tangle::{tangle, tangle_with_context, CycleDetector, Tangled};
pub use uid::Uid;
