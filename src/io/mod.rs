//! File output: digests, planned writes and build metadata.

mod digest;
mod metadata;
mod transaction;

pub use digest::{existing_digest, hexdigest_file, hexdigest_str};
pub use metadata::{Metadata, METADATA_FILE};
pub use transaction::{Action, CopyFile, Transaction, WriteFile};
