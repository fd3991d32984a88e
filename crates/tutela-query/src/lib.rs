//! Query rewriting for access-scoped list reads
//!
//! The rewrite conjoins a caller's filter with access criteria derived from
//! the caller's readable-workspace set and ownership. One criteria tree is
//! built, then rendered per storage backend: evaluated in process, or
//! rendered to a document-store `$match` filter.

pub mod docstore;
pub mod eval;
pub mod rewrite;

#[cfg(test)]
mod tests;

pub use docstore::{apply_to_pipeline, to_filter, to_match_stage};
pub use eval::matches;
pub use rewrite::{access_criteria, check_user_filter, check_workspace_filter};
