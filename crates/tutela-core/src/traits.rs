//! Storage traits consumed by the access-control layer
//!
//! The durable engine behind these traits is a collaborator, not part of
//! this workspace; `tutela-store` ships in-memory reference implementations.

use crate::{
    config::DocumentOrder, criteria::Criteria, error::Result, ids::*, models::*,
};
use async_trait::async_trait;
use std::collections::HashSet;

// =============================================================================
// Permission storage
// =============================================================================

/// Permission rows plus their user/group grant tables.
///
/// Grant mutations are idempotent: granting an already-held permission or
/// revoking an absent one succeeds silently.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Insert a permission; fails with `NotUnique` when the
    /// (content_type, codename) pair already exists
    async fn create(&self, permission: &Permission) -> Result<Permission>;

    async fn get_by_id(&self, id: PermissionId) -> Result<Option<Permission>>;

    async fn get_by_codename(
        &self,
        content_type: &str,
        codename: &str,
    ) -> Result<Option<Permission>>;

    async fn list_by_content_type(&self, content_type: &str) -> Result<Vec<Permission>>;

    /// Delete the row and every grant referencing it
    async fn delete(&self, id: PermissionId) -> Result<()>;

    async fn grant_to_user(&self, user_id: UserId, permission_id: PermissionId) -> Result<()>;

    async fn revoke_from_user(&self, user_id: UserId, permission_id: PermissionId) -> Result<()>;

    async fn grant_to_group(&self, group_id: GroupId, permission_id: PermissionId) -> Result<()>;

    async fn revoke_from_group(&self, group_id: GroupId, permission_id: PermissionId)
        -> Result<()>;

    /// Permissions granted to the user directly (group grants not included)
    async fn permissions_for_user(&self, user_id: UserId) -> Result<HashSet<PermissionId>>;

    async fn permissions_for_group(&self, group_id: GroupId) -> Result<HashSet<PermissionId>>;
}

// =============================================================================
// Group storage
// =============================================================================

#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Insert a group; fails with `NotUnique` when the name is taken
    async fn create(&self, group: &Group) -> Result<Group>;

    async fn get_by_id(&self, id: GroupId) -> Result<Option<Group>>;

    /// Absence is `Ok(None)`, not an error
    async fn get_by_name(&self, name: &str) -> Result<Option<Group>>;

    async fn add_member(&self, group_id: GroupId, user_id: UserId) -> Result<()>;

    async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> Result<()>;

    async fn groups_for_user(&self, user_id: UserId) -> Result<Vec<Group>>;
}

// =============================================================================
// Workspace storage
// =============================================================================

#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Insert a workspace; fails with `NotUnique` when the owner already has
    /// a workspace of that title
    async fn create(&self, workspace: &Workspace) -> Result<Workspace>;

    async fn get_by_id(&self, id: WorkspaceId) -> Result<Option<Workspace>>;

    async fn get_by_title_and_owner(
        &self,
        title: &str,
        owner: Option<&UserId>,
    ) -> Result<Option<Workspace>>;

    async fn list(&self) -> Result<Vec<Workspace>>;

    async fn list_public(&self) -> Result<Vec<Workspace>>;

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Workspace>>;

    /// The distinguished ownerless workspace, if one has been created
    async fn get_global(&self) -> Result<Option<Workspace>>;

    async fn update(&self, workspace: &Workspace) -> Result<Workspace>;

    async fn delete(&self, id: WorkspaceId) -> Result<()>;
}

// =============================================================================
// Document storage
// =============================================================================

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: &Document) -> Result<Document>;

    async fn get_by_id(&self, id: DocumentId) -> Result<Option<Document>>;

    async fn update(&self, document: &Document) -> Result<Document>;

    async fn delete(&self, id: DocumentId) -> Result<()>;

    /// Evaluate a criteria tree and return matching documents in the given
    /// order
    async fn query(&self, criteria: &Criteria, order: DocumentOrder) -> Result<Vec<Document>>;
}

// =============================================================================
// Preferences storage
// =============================================================================

#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    async fn get_by_owner(&self, owner: UserId) -> Result<Option<UserPreferences>>;

    async fn upsert(&self, preferences: &UserPreferences) -> Result<UserPreferences>;

    async fn delete_by_owner(&self, owner: UserId) -> Result<()>;
}
