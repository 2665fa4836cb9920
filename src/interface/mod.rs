//! High-level interface for literate project builds.

mod context;
mod document;

pub use context::Context;
pub use document::{
    build_project, load_documents, merge_documents, tangle_documents, tangle_files,
    tangle_requests, Project, TangledFile,
};
