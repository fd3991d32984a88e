//! Access-control decision layer for Tutela
//!
//! The policy engine answers "may this principal do this to that resource"
//! for documents, workspaces, and preferences. Business operations authorize
//! explicitly through [`PolicyEngine::authorize`] or a named predicate before
//! touching storage, so the check is visible at every call site.

pub mod documents;
pub mod engine;
pub mod groups;
pub mod permissions;
pub mod workspace;


pub use documents::{DocumentQuery, DocumentService};
pub use engine::PolicyEngine;
pub use groups::GroupRegistry;
pub use permissions::PermissionStore;
pub use workspace::WorkspaceService;
