//! Workspace lifecycle and rights management
//!
//! A workspace and its read/write permission pair are created together. When
//! the workspace insert fails after the permissions were created, the
//! permissions are rolled back best-effort before the original error
//! surfaces; an extremely narrow race can still leak a permission row, which
//! is an accepted limitation of the compensating-delete sequence.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};

use tutela_core::{
    GroupId, Principal, Result, TutelaError, UserId, Workspace, WorkspaceId, WorkspaceRepository,
};

use crate::engine::PolicyEngine;
use crate::groups::GroupRegistry;
use crate::permissions::PermissionStore;

#[derive(Clone)]
pub struct WorkspaceService {
    engine: Arc<PolicyEngine>,
    permissions: PermissionStore,
    groups: GroupRegistry,
    workspaces: Arc<dyn WorkspaceRepository>,
}

impl WorkspaceService {
    pub fn new(
        engine: Arc<PolicyEngine>,
        permissions: PermissionStore,
        groups: GroupRegistry,
        workspaces: Arc<dyn WorkspaceRepository>,
    ) -> Self {
        Self {
            engine,
            permissions,
            groups,
            workspaces,
        }
    }

    /// Guarded entry point: a registered caller creates a private workspace
    /// they own
    pub async fn create_workspace(&self, principal: &Principal, title: &str) -> Result<Workspace> {
        let Some(owner) = principal.id else {
            return Err(TutelaError::permission_denied("create", "workspace"));
        };
        self.create_and_save(title, Some(owner), false).await
    }

    /// Create the permission pair, then the workspace row. The owner, if any,
    /// is granted both permissions.
    #[instrument(skip(self))]
    pub async fn create_and_save(
        &self,
        title: &str,
        owner: Option<UserId>,
        is_public: bool,
    ) -> Result<Workspace> {
        let read_perm = self.permissions.create_read_perm(title, owner.as_ref()).await?;
        let write_perm = match self.permissions.create_write_perm(title, owner.as_ref()).await {
            Ok(perm) => perm,
            Err(err) => {
                self.permissions.delete_permission(read_perm.id).await;
                return Err(err);
            }
        };

        let workspace = Workspace::new(title.trim(), owner, is_public, read_perm.id, write_perm.id);
        let created = match self.workspaces.create(&workspace).await {
            Ok(created) => created,
            Err(err) => {
                // Roll back the freshly minted pair; the original failure is
                // the one the caller sees
                self.permissions.delete_permission(read_perm.id).await;
                self.permissions.delete_permission(write_perm.id).await;
                return Err(err);
            }
        };

        if let Some(owner) = owner {
            self.permissions
                .add_permission_to_user(owner, read_perm.id)
                .await?;
            self.permissions
                .add_permission_to_user(owner, write_perm.id)
                .await?;
        }
        if is_public {
            self.share_read_with_well_known_groups(&created).await?;
        }

        info!(workspace = %created.id, title = %created.title, "created workspace");
        Ok(created)
    }

    /// The distinguished ownerless, publicly readable workspace
    pub async fn create_global(&self, title: &str) -> Result<Workspace> {
        if self.workspaces.get_global().await?.is_some() {
            return Err(TutelaError::model_violation(
                "a global workspace already exists",
            ));
        }
        self.create_and_save(title, None, true).await
    }

    /// Rename a workspace. Permission codenames stay derived from the
    /// creation title.
    #[instrument(skip(self, principal))]
    pub async fn rename(
        &self,
        id: WorkspaceId,
        new_title: &str,
        principal: &Principal,
    ) -> Result<Workspace> {
        let mut workspace = self.get(id).await?;
        if workspace.is_global() {
            return Err(TutelaError::model_violation(
                "the global workspace cannot be renamed",
            ));
        }
        self.engine.check_is_workspace_owner(&workspace, principal)?;
        workspace.title = new_title.trim().to_string();
        workspace.updated_at = Utc::now();
        self.workspaces.update(&workspace).await
    }

    /// Make a workspace public and grant its read permission to the
    /// well-known groups
    #[instrument(skip(self, principal))]
    pub async fn set_public(&self, id: WorkspaceId, principal: &Principal) -> Result<Workspace> {
        let mut workspace = self.get(id).await?;
        self.engine
            .check_can_set_workspace_public(&workspace, principal)
            .await?;
        workspace.is_public = true;
        workspace.updated_at = Utc::now();
        let updated = self.workspaces.update(&workspace).await?;
        self.share_read_with_well_known_groups(&updated).await?;
        info!(workspace = %updated.id, "workspace set public");
        Ok(updated)
    }

    /// Make a workspace private again and revoke the well-known groups' read
    /// access. Only allowed while un-publishing is enabled.
    #[instrument(skip(self, principal))]
    pub async fn set_private(&self, id: WorkspaceId, principal: &Principal) -> Result<Workspace> {
        let mut workspace = self.get(id).await?;
        if !self.engine.config().can_set_public_data_to_private {
            return Err(TutelaError::model_violation(
                "public data cannot be made private",
            ));
        }
        if workspace.is_global() {
            return Err(TutelaError::model_violation(
                "the global workspace cannot be made private",
            ));
        }
        self.engine.check_is_workspace_owner(&workspace, principal)?;
        workspace.is_public = false;
        workspace.updated_at = Utc::now();
        let updated = self.workspaces.update(&workspace).await?;
        for group in self.well_known_groups().await? {
            self.permissions
                .remove_permission_from_group(group, updated.read_perm)
                .await?;
        }
        info!(workspace = %updated.id, "workspace set private");
        Ok(updated)
    }

    /// Delete a workspace and cascade to its permission pair. The permission
    /// deletes are best-effort; the rows may already be gone.
    #[instrument(skip(self, principal))]
    pub async fn delete(&self, id: WorkspaceId, principal: &Principal) -> Result<()> {
        let workspace = self.get(id).await?;
        self.engine
            .check_can_delete_workspace(&workspace, principal)
            .await?;
        self.workspaces.delete(workspace.id).await?;
        self.permissions.delete_permission(workspace.read_perm).await;
        self.permissions.delete_permission(workspace.write_perm).await;
        info!(workspace = %workspace.id, "deleted workspace");
        Ok(())
    }

    // =========================================================================
    // Rights management
    // =========================================================================
    //
    // All eight operations are gated on workspace ownership. Write-access
    // mutation on the global workspace is a domain rule violation for every
    // caller, superusers included.

    pub async fn add_user_read_access(
        &self,
        id: WorkspaceId,
        user: UserId,
        principal: &Principal,
    ) -> Result<()> {
        let workspace = self.owned(id, principal).await?;
        self.permissions
            .add_permission_to_user(user, workspace.read_perm)
            .await
    }

    pub async fn remove_user_read_access(
        &self,
        id: WorkspaceId,
        user: UserId,
        principal: &Principal,
    ) -> Result<()> {
        let workspace = self.owned(id, principal).await?;
        self.permissions
            .remove_permission_from_user(user, workspace.read_perm)
            .await
    }

    pub async fn add_user_write_access(
        &self,
        id: WorkspaceId,
        user: UserId,
        principal: &Principal,
    ) -> Result<()> {
        let workspace = self.owned(id, principal).await?;
        check_not_global_write(&workspace)?;
        self.permissions
            .add_permission_to_user(user, workspace.write_perm)
            .await
    }

    pub async fn remove_user_write_access(
        &self,
        id: WorkspaceId,
        user: UserId,
        principal: &Principal,
    ) -> Result<()> {
        let workspace = self.owned(id, principal).await?;
        check_not_global_write(&workspace)?;
        self.permissions
            .remove_permission_from_user(user, workspace.write_perm)
            .await
    }

    pub async fn add_group_read_access(
        &self,
        id: WorkspaceId,
        group: GroupId,
        principal: &Principal,
    ) -> Result<()> {
        let workspace = self.owned(id, principal).await?;
        self.permissions
            .add_permission_to_group(group, workspace.read_perm)
            .await
    }

    pub async fn remove_group_read_access(
        &self,
        id: WorkspaceId,
        group: GroupId,
        principal: &Principal,
    ) -> Result<()> {
        let workspace = self.owned(id, principal).await?;
        self.permissions
            .remove_permission_from_group(group, workspace.read_perm)
            .await
    }

    pub async fn add_group_write_access(
        &self,
        id: WorkspaceId,
        group: GroupId,
        principal: &Principal,
    ) -> Result<()> {
        let workspace = self.owned(id, principal).await?;
        check_not_global_write(&workspace)?;
        self.permissions
            .add_permission_to_group(group, workspace.write_perm)
            .await
    }

    pub async fn remove_group_write_access(
        &self,
        id: WorkspaceId,
        group: GroupId,
        principal: &Principal,
    ) -> Result<()> {
        let workspace = self.owned(id, principal).await?;
        check_not_global_write(&workspace)?;
        self.permissions
            .remove_permission_from_group(group, workspace.write_perm)
            .await
    }

    // =========================================================================
    // Accessible sets
    // =========================================================================

    pub async fn workspaces_user_can_read(
        &self,
        principal: &Principal,
    ) -> Result<HashSet<WorkspaceId>> {
        self.engine.readable_workspaces(principal).await
    }

    pub async fn workspaces_user_can_write(
        &self,
        principal: &Principal,
    ) -> Result<HashSet<WorkspaceId>> {
        self.engine.writable_workspaces(principal).await
    }

    pub async fn get(&self, id: WorkspaceId) -> Result<Workspace> {
        self.workspaces
            .get_by_id(id)
            .await?
            .ok_or_else(|| TutelaError::not_found("Workspace", id.to_string()))
    }

    async fn owned(&self, id: WorkspaceId, principal: &Principal) -> Result<Workspace> {
        let workspace = self.get(id).await?;
        self.engine.check_is_workspace_owner(&workspace, principal)?;
        Ok(workspace)
    }

    async fn well_known_groups(&self) -> Result<Vec<GroupId>> {
        let mut found = Vec::new();
        if let Some(group) = self.groups.get_anonymous_group().await? {
            found.push(group.id);
        }
        if let Some(group) = self.groups.get_default_group().await? {
            found.push(group.id);
        }
        Ok(found)
    }

    async fn share_read_with_well_known_groups(&self, workspace: &Workspace) -> Result<()> {
        for group in self.well_known_groups().await? {
            self.permissions
                .add_permission_to_group(group, workspace.read_perm)
                .await?;
        }
        Ok(())
    }
}

fn check_not_global_write(workspace: &Workspace) -> Result<()> {
    if workspace.is_global() {
        return Err(TutelaError::model_violation(
            "write access on the global workspace cannot be changed",
        ));
    }
    Ok(())
}
