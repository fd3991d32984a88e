//! Document-store rendering of criteria trees
//!
//! Renders the same criteria evaluated by [`crate::eval`] as the
//! `$match`/`$in`/`$or` filter documents understood by aggregation
//! pipelines. A workspace entry of `None` renders as `"workspace": null`
//! (the document has no workspace), never as a literal id.

use serde_json::{json, Value};
use tutela_core::Criteria;

/// Render a criteria tree as a filter document
pub fn to_filter(criteria: &Criteria) -> Value {
    match criteria {
        Criteria::All => json!({}),
        Criteria::And(parts) => {
            json!({ "$and": parts.iter().map(to_filter).collect::<Vec<_>>() })
        }
        Criteria::Or(parts) => {
            json!({ "$or": parts.iter().map(to_filter).collect::<Vec<_>>() })
        }
        Criteria::OwnerIs(owner) => json!({ "user_id": owner.to_string() }),
        Criteria::WorkspaceIs(Some(workspace)) => json!({ "workspace": workspace.to_string() }),
        Criteria::WorkspaceIs(None) => json!({ "workspace": null }),
        Criteria::WorkspaceIn(workspaces) => {
            let ids: Vec<Value> = workspaces
                .iter()
                .flatten()
                .map(|id| Value::String(id.to_string()))
                .collect();
            if workspaces.iter().any(Option::is_none) {
                json!({ "$or": [
                    { "workspace": { "$in": ids } },
                    { "workspace": null },
                ]})
            } else {
                json!({ "workspace": { "$in": ids } })
            }
        }
        Criteria::KindIs(kind) => json!({ "kind": kind.to_string() }),
        Criteria::TitleContains(needle) => json!({ "title": { "$regex": needle } }),
    }
}

/// Wrap a criteria tree as a `$match` pipeline stage
pub fn to_match_stage(criteria: &Criteria) -> Value {
    json!({ "$match": to_filter(criteria) })
}

/// Conjoin a criteria tree into an aggregation pipeline.
///
/// Merges into the first `$match` stage when the pipeline already has one,
/// otherwise prepends a new `$match` stage.
pub fn apply_to_pipeline(pipeline: &mut Vec<Value>, criteria: &Criteria) {
    if criteria.is_unrestricted() {
        return;
    }
    let filter = to_filter(criteria);

    for stage in pipeline.iter_mut() {
        if let Some(existing) = stage.as_object_mut().and_then(|obj| obj.get_mut("$match")) {
            let prior = existing.take();
            *existing = json!({ "$and": [prior, filter] });
            return;
        }
    }

    pipeline.insert(0, json!({ "$match": filter }));
}
