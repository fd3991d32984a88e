//! In-process evaluation of criteria trees
//!
//! This is the attribute-predicate backend used by the in-memory store.

use tutela_core::{Criteria, Document};

/// Evaluate a criteria tree against a single document
pub fn matches(criteria: &Criteria, document: &Document) -> bool {
    match criteria {
        Criteria::All => true,
        Criteria::And(parts) => parts.iter().all(|part| matches(part, document)),
        Criteria::Or(parts) => parts.iter().any(|part| matches(part, document)),
        Criteria::OwnerIs(owner) => document.owner == *owner,
        Criteria::WorkspaceIs(workspace) => document.workspace == *workspace,
        Criteria::WorkspaceIn(workspaces) => workspaces.contains(&document.workspace),
        Criteria::KindIs(kind) => document.kind == *kind,
        Criteria::TitleContains(needle) => document.title.contains(needle.as_str()),
    }
}
