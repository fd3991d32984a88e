//! Query criteria shared by the storage backends
//!
//! A single filter tree is built once by the query-rewriting layer and then
//! rendered per backend: evaluated in process against documents, or rendered
//! to a document-store `$match` filter.

use crate::ids::{UserId, WorkspaceId};
use crate::models::DocumentKind;
use serde::{Deserialize, Serialize};

/// Filter tree applied to document queries.
///
/// A workspace entry of `None` selects documents that live outside any
/// workspace, not a literal null id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Criteria {
    /// Matches every document
    All,
    And(Vec<Criteria>),
    Or(Vec<Criteria>),
    OwnerIs(UserId),
    WorkspaceIs(Option<WorkspaceId>),
    WorkspaceIn(Vec<Option<WorkspaceId>>),
    KindIs(DocumentKind),
    TitleContains(String),
}

impl Criteria {
    /// Conjoin with another criteria tree, flattening nested conjunctions
    pub fn and(self, other: Criteria) -> Criteria {
        match (self, other) {
            (Criteria::All, c) | (c, Criteria::All) => c,
            (Criteria::And(mut left), Criteria::And(right)) => {
                left.extend(right);
                Criteria::And(left)
            }
            (Criteria::And(mut left), c) => {
                left.push(c);
                Criteria::And(left)
            }
            (c, Criteria::And(mut right)) => {
                right.insert(0, c);
                Criteria::And(right)
            }
            (a, b) => Criteria::And(vec![a, b]),
        }
    }

    /// Disjoin with another criteria tree
    pub fn or(self, other: Criteria) -> Criteria {
        match (self, other) {
            (Criteria::All, _) | (_, Criteria::All) => Criteria::All,
            (Criteria::Or(mut left), Criteria::Or(right)) => {
                left.extend(right);
                Criteria::Or(left)
            }
            (Criteria::Or(mut left), c) => {
                left.push(c);
                Criteria::Or(left)
            }
            (a, b) => Criteria::Or(vec![a, b]),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Criteria::All)
    }
}

impl Default for Criteria {
    fn default() -> Self {
        Criteria::All
    }
}
