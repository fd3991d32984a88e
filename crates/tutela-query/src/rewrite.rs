//! Access-criteria construction for list queries
//!
//! Callers may pass explicit workspace/user filters (e.g. from REST query
//! parameters). Those are validated against the acting principal, then the
//! query is conjoined with the access restriction: documents must sit in a
//! readable workspace or belong to the caller.

use std::collections::HashSet;
use tracing::debug;
use tutela_core::{Criteria, Principal, Result, TutelaError, UserId, WorkspaceId};

/// Reject an explicit user filter naming anyone but the caller.
///
/// Superusers may query by arbitrary user id.
pub fn check_user_filter(principal: &Principal, user_filter: Option<&UserId>) -> Result<()> {
    if principal.is_superuser {
        return Ok(());
    }
    match user_filter {
        Some(requested) if !principal.owns(requested) => Err(TutelaError::permission_denied(
            "filter by user",
            format!("user {requested}"),
        )),
        _ => Ok(()),
    }
}

/// Every concrete workspace id in an explicit filter must be accessible to
/// the caller. An empty filter requests no restriction. `None` entries
/// ("documents outside any workspace") are not checked against the set:
/// private documents are reachable only through the ownership branch of the
/// access criteria.
pub fn check_workspace_filter(
    principal: &Principal,
    requested: &[Option<WorkspaceId>],
    accessible: &HashSet<WorkspaceId>,
) -> Result<()> {
    if principal.is_superuser {
        return Ok(());
    }
    for id in requested.iter().flatten() {
        if !accessible.contains(id) {
            return Err(TutelaError::permission_denied(
                "filter by workspace",
                format!("workspace {id}"),
            ));
        }
    }
    Ok(())
}

/// Conjoin the caller's query with the access restriction.
///
/// For superusers the explicit filters are honored verbatim and no ownership
/// restriction is layered on top. For everyone else the result is
/// `base AND filters AND (workspace ∈ readable OR owner = caller)`; anonymous
/// principals get no ownership branch. Conjoining an equivalent restriction a
/// second time does not narrow the result set further.
pub fn access_criteria(
    base: Criteria,
    principal: &Principal,
    readable: &HashSet<WorkspaceId>,
    workspace_filter: Option<&[Option<WorkspaceId>]>,
    user_filter: Option<&UserId>,
) -> Result<Criteria> {
    check_user_filter(principal, user_filter)?;
    if let Some(requested) = workspace_filter {
        check_workspace_filter(principal, requested, readable)?;
    }

    let mut criteria = base;
    if let Some(requested) = workspace_filter {
        if !requested.is_empty() {
            criteria = criteria.and(Criteria::WorkspaceIn(requested.to_vec()));
        }
    }
    if let Some(user) = user_filter {
        criteria = criteria.and(Criteria::OwnerIs(*user));
    }

    if principal.is_superuser {
        return Ok(criteria);
    }

    let mut accessible: Vec<Option<WorkspaceId>> = readable.iter().copied().map(Some).collect();
    accessible.sort();
    let mut access = Criteria::WorkspaceIn(accessible);
    if let Some(id) = principal.id {
        access = access.or(Criteria::OwnerIs(id));
    }
    debug!(caller = %principal.describe(), readable = readable.len(), "scoping query");

    Ok(criteria.and(access))
}
