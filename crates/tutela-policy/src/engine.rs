//! Access-control predicates and the explicit authorization entry point
//!
//! Superusers short-circuit every predicate except the global-workspace
//! protection rules, which are domain rules rather than authorization
//! failures and reject every caller.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use tutela_core::{
    AccessConfig, Action, Document, GroupId, Principal, ResourceRef, Result, TutelaError,
    UserPreferences, Workspace, WorkspaceId, WorkspaceRepository, PUBLISH_WORKSPACE,
};

use crate::permissions::PermissionStore;

/// Stateless per-call policy decisions over the permission store and the
/// workspace registry
#[derive(Clone)]
pub struct PolicyEngine {
    config: AccessConfig,
    permissions: PermissionStore,
    workspaces: Arc<dyn WorkspaceRepository>,
}

impl PolicyEngine {
    pub fn new(
        config: AccessConfig,
        permissions: PermissionStore,
        workspaces: Arc<dyn WorkspaceRepository>,
    ) -> Self {
        Self {
            config,
            permissions,
            workspaces,
        }
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    pub fn permissions(&self) -> &PermissionStore {
        &self.permissions
    }

    // =========================================================================
    // Workspace predicates
    // =========================================================================

    /// Public workspaces are readable by everyone; otherwise the caller must
    /// own the workspace or hold its read permission, directly or via a group
    pub async fn can_user_read_workspace(
        &self,
        principal: &Principal,
        workspace: &Workspace,
    ) -> Result<bool> {
        if principal.is_superuser || workspace.is_public {
            return Ok(true);
        }
        if workspace
            .owner
            .as_ref()
            .map_or(false, |owner| principal.owns(owner))
        {
            return Ok(true);
        }
        let readable = self
            .permissions
            .workspace_permissions_user_can_read(principal)
            .await?;
        Ok(readable.contains(&workspace.read_perm))
    }

    /// Being public grants no write access; the caller must own the
    /// workspace or hold its write permission
    pub async fn can_user_write_workspace(
        &self,
        principal: &Principal,
        workspace: &Workspace,
    ) -> Result<bool> {
        if principal.is_superuser {
            return Ok(true);
        }
        if workspace
            .owner
            .as_ref()
            .map_or(false, |owner| principal.owns(owner))
        {
            return Ok(true);
        }
        let writable = self
            .permissions
            .workspace_permissions_user_can_write(principal)
            .await?;
        Ok(writable.contains(&workspace.write_perm))
    }

    pub async fn can_group_read_workspace(
        &self,
        group_id: GroupId,
        workspace: &Workspace,
    ) -> Result<bool> {
        if workspace.is_public {
            return Ok(true);
        }
        self.permissions
            .group_has_permission(group_id, workspace.read_perm)
            .await
    }

    pub async fn can_group_write_workspace(
        &self,
        group_id: GroupId,
        workspace: &Workspace,
    ) -> Result<bool> {
        self.permissions
            .group_has_permission(group_id, workspace.write_perm)
            .await
    }

    /// Owner-or-superuser gate for workspace administration, including
    /// granting or revoking someone else's access
    pub fn check_is_workspace_owner(
        &self,
        workspace: &Workspace,
        principal: &Principal,
    ) -> Result<()> {
        if principal.is_superuser {
            return Ok(());
        }
        let owns = workspace
            .owner
            .as_ref()
            .map_or(false, |owner| principal.owns(owner));
        if owns {
            Ok(())
        } else {
            Err(TutelaError::permission_denied(
                "administer",
                format!("workspace {}", workspace.id),
            ))
        }
    }

    /// Owner-only, and the owner must hold the workspace publish capability
    pub async fn check_can_set_workspace_public(
        &self,
        workspace: &Workspace,
        principal: &Principal,
    ) -> Result<()> {
        if !self.config.can_set_workspace_public {
            return Err(TutelaError::model_violation(
                "making workspaces public is disabled",
            ));
        }
        if principal.is_superuser {
            return Ok(());
        }
        self.check_is_workspace_owner(workspace, principal)?;
        self.has_perm_publish(principal, PUBLISH_WORKSPACE).await
    }

    /// The global workspace is never deletable; a public workspace is only
    /// deletable while un-publishing is allowed; otherwise owner-or-superuser
    pub async fn check_can_delete_workspace(
        &self,
        workspace: &Workspace,
        principal: &Principal,
    ) -> Result<()> {
        if workspace.is_global() {
            return Err(TutelaError::model_violation(
                "the global workspace cannot be deleted",
            ));
        }
        if principal.is_superuser {
            return Ok(());
        }
        self.check_is_workspace_owner(workspace, principal)?;
        if workspace.is_public && !self.config.can_set_public_data_to_private {
            return Err(TutelaError::model_violation(
                "public workspaces cannot be deleted while un-publishing is disabled",
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Document predicates
    // =========================================================================

    /// Anonymous callers only pass when the deployment allows anonymous
    /// access to public documents
    pub fn check_anonymous_access(&self, principal: &Principal) -> Result<()> {
        if !principal.is_anonymous || self.config.can_anonymous_access_public_document {
            Ok(())
        } else {
            Err(TutelaError::permission_denied(
                "read",
                "public documents".to_string(),
            ))
        }
    }

    #[instrument(skip(self, document, principal))]
    pub async fn check_can_read(&self, document: &Document, principal: &Principal) -> Result<()> {
        if principal.is_superuser {
            return Ok(());
        }
        self.check_anonymous_access(principal)?;
        if principal.owns(&document.owner) {
            return Ok(());
        }
        match document.workspace {
            Some(workspace_id) => {
                let workspace = self.workspace(workspace_id).await?;
                if self.can_user_read_workspace(principal, &workspace).await? {
                    Ok(())
                } else {
                    Err(self.denied("read", document))
                }
            }
            // A foreign document outside any workspace is private to its owner
            None => Err(self.denied("read", document)),
        }
    }

    #[instrument(skip(self, document, principal))]
    pub async fn check_can_write(&self, document: &Document, principal: &Principal) -> Result<()> {
        if principal.is_superuser {
            return Ok(());
        }
        if principal.is_anonymous {
            return Err(self.denied("write", document));
        }
        match document.workspace {
            Some(workspace_id) => {
                let workspace = self.workspace(workspace_id).await?;
                if workspace.is_public && principal.owns(&document.owner) {
                    // Even the owner needs the publish capability to keep
                    // editing a document that is already public
                    self.has_perm_publish(principal, document.kind.publish_codename())
                        .await
                } else if self.can_user_write_workspace(principal, &workspace).await? {
                    Ok(())
                } else {
                    Err(self.denied("write", document))
                }
            }
            None => {
                if principal.owns(&document.owner) {
                    Ok(())
                } else {
                    Err(self.denied("write", document))
                }
            }
        }
    }

    /// Coarse whole-list check: every foreign document must sit in a readable
    /// workspace. Intended as a defensive pass after a query has already been
    /// scoped.
    #[instrument(skip(self, documents, principal))]
    pub async fn check_can_read_list(
        &self,
        documents: &[Document],
        principal: &Principal,
    ) -> Result<()> {
        if principal.is_superuser {
            return Ok(());
        }
        let readable = self.readable_workspaces(principal).await?;
        for document in documents {
            if principal.owns(&document.owner) {
                continue;
            }
            match document.workspace {
                Some(workspace_id) if readable.contains(&workspace_id) => {}
                Some(workspace_id) => {
                    return Err(TutelaError::permission_denied(
                        "read",
                        format!("workspace {workspace_id}"),
                    ));
                }
                None => return Err(self.denied("read", document)),
            }
        }
        Ok(())
    }

    /// Moving a document: a public target needs the publish capability, a
    /// private target ordinary write access; the current state must be
    /// writable; and while un-publishing is disabled a document cannot leave
    /// a public workspace for a private destination.
    #[instrument(skip(self, document, target, principal))]
    pub async fn can_write_in_workspace(
        &self,
        document: &Document,
        target: Option<&Workspace>,
        principal: &Principal,
        publish_codename: &str,
    ) -> Result<()> {
        if principal.is_superuser {
            return Ok(());
        }
        if let Some(target) = target {
            if target.is_public {
                self.has_perm_publish(principal, publish_codename).await?;
            } else if !self.can_user_write_workspace(principal, target).await? {
                return Err(TutelaError::permission_denied(
                    "write",
                    format!("workspace {}", target.id),
                ));
            }
        }
        self.check_can_write(document, principal).await?;
        if !self.config.can_set_public_data_to_private {
            if let Some(current_id) = document.workspace {
                let current = self.workspace(current_id).await?;
                let target_public = target.map_or(false, |ws| ws.is_public);
                if current.is_public && !target_public {
                    return Err(self.denied("unpublish", document));
                }
            }
        }
        Ok(())
    }

    /// Kind-bound specialization of [`Self::can_write_in_workspace`]
    pub async fn can_assign_workspace(
        &self,
        document: &Document,
        target: Option<&Workspace>,
        principal: &Principal,
    ) -> Result<()> {
        self.can_write_in_workspace(
            document,
            target,
            principal,
            document.kind.publish_codename(),
        )
        .await
    }

    pub async fn can_read_or_write_in_workspace(
        &self,
        workspace: &Workspace,
        principal: &Principal,
    ) -> Result<()> {
        if principal.is_superuser {
            return Ok(());
        }
        if self.can_user_read_workspace(principal, workspace).await?
            || self.can_user_write_workspace(principal, workspace).await?
        {
            Ok(())
        } else {
            Err(TutelaError::permission_denied(
                "access",
                format!("workspace {}", workspace.id),
            ))
        }
    }

    /// Only the current owner may hand a document over
    pub fn check_can_change_owner(
        &self,
        document: &Document,
        principal: &Principal,
    ) -> Result<()> {
        if principal.is_superuser {
            return Ok(());
        }
        if principal.owns(&document.owner) {
            Ok(())
        } else {
            Err(self.denied("change owner of", document))
        }
    }

    pub fn check_preferences_access(
        &self,
        preferences: &UserPreferences,
        principal: &Principal,
    ) -> Result<()> {
        if principal.is_superuser {
            return Ok(());
        }
        if principal.owns(&preferences.owner) {
            Ok(())
        } else {
            Err(TutelaError::permission_denied(
                "access",
                format!("preferences {}", preferences.id),
            ))
        }
    }

    /// Capability gate for publish actions. The permission must exist and the
    /// principal must carry its label; a failing lookup is treated as denied.
    pub async fn has_perm_publish(
        &self,
        principal: &Principal,
        codename: &str,
    ) -> Result<()> {
        if principal.is_superuser {
            return Ok(());
        }
        let label = match self.permissions.get_by_codename(codename).await {
            Ok(permission) => permission.label(),
            Err(err) => {
                warn!(codename, "publish capability lookup failed: {err}");
                return Err(TutelaError::permission_denied(
                    "publish",
                    codename.to_string(),
                ));
            }
        };
        if principal.has_permission(&label) {
            Ok(())
        } else {
            Err(TutelaError::permission_denied(
                "publish",
                codename.to_string(),
            ))
        }
    }

    // =========================================================================
    // Accessible workspace sets
    // =========================================================================

    /// Workspace ids the principal may read from: permission-derived, owned,
    /// and every public workspace
    pub async fn readable_workspaces(&self, principal: &Principal) -> Result<HashSet<WorkspaceId>> {
        if principal.is_superuser {
            return Ok(self
                .workspaces
                .list()
                .await?
                .into_iter()
                .map(|ws| ws.id)
                .collect());
        }
        let granted = self
            .permissions
            .workspace_permissions_user_can_read(principal)
            .await?;
        let mut result = HashSet::new();
        for workspace in self.workspaces.list().await? {
            let owned = workspace
                .owner
                .as_ref()
                .map_or(false, |owner| principal.owns(owner));
            if workspace.is_public || owned || granted.contains(&workspace.read_perm) {
                result.insert(workspace.id);
            }
        }
        Ok(result)
    }

    /// Workspace ids the principal may write into: permission-derived and
    /// owned. Public workspaces are not included by virtue of being public.
    pub async fn writable_workspaces(&self, principal: &Principal) -> Result<HashSet<WorkspaceId>> {
        if principal.is_superuser {
            return Ok(self
                .workspaces
                .list()
                .await?
                .into_iter()
                .map(|ws| ws.id)
                .collect());
        }
        let granted = self
            .permissions
            .workspace_permissions_user_can_write(principal)
            .await?;
        let mut result = HashSet::new();
        for workspace in self.workspaces.list().await? {
            let owned = workspace
                .owner
                .as_ref()
                .map_or(false, |owner| principal.owns(owner));
            if owned || granted.contains(&workspace.write_perm) {
                result.insert(workspace.id);
            }
        }
        Ok(result)
    }

    // =========================================================================
    // Explicit entry point
    // =========================================================================

    /// Authorize an action on a resource, or fail with the reason
    #[instrument(skip(self, principal, resource))]
    pub async fn authorize(
        &self,
        principal: &Principal,
        action: Action,
        resource: ResourceRef<'_>,
    ) -> Result<()> {
        debug!(caller = %principal.describe(), %action, resource = %resource.describe(), "authorizing");
        match (action, resource) {
            (Action::Read, ResourceRef::Document(doc)) => {
                self.check_can_read(doc, principal).await
            }
            (Action::Write | Action::Delete, ResourceRef::Document(doc)) => {
                self.check_can_write(doc, principal).await
            }
            (Action::Publish, ResourceRef::Document(doc)) => {
                self.has_perm_publish(principal, doc.kind.publish_codename())
                    .await
            }
            (Action::ChangeOwner, ResourceRef::Document(doc)) => {
                self.check_can_change_owner(doc, principal)
            }
            (Action::Read, ResourceRef::Workspace(ws)) => {
                if self.can_user_read_workspace(principal, ws).await? {
                    Ok(())
                } else {
                    Err(TutelaError::permission_denied(
                        "read",
                        format!("workspace {}", ws.id),
                    ))
                }
            }
            (Action::Write, ResourceRef::Workspace(ws)) => {
                if self.can_user_write_workspace(principal, ws).await? {
                    Ok(())
                } else {
                    Err(TutelaError::permission_denied(
                        "write",
                        format!("workspace {}", ws.id),
                    ))
                }
            }
            (Action::Delete, ResourceRef::Workspace(ws)) => {
                self.check_can_delete_workspace(ws, principal).await
            }
            (Action::Publish, ResourceRef::Workspace(ws)) => {
                self.check_can_set_workspace_public(ws, principal).await
            }
            (Action::ManageAccess, ResourceRef::Workspace(ws)) => {
                self.check_is_workspace_owner(ws, principal)
            }
            (Action::Read | Action::Write | Action::Delete, ResourceRef::Preferences(prefs)) => {
                self.check_preferences_access(prefs, principal)
            }
            (action, resource) => Err(TutelaError::permission_denied(
                action.to_string(),
                resource.describe(),
            )),
        }
    }

    fn denied(&self, action: &str, document: &Document) -> TutelaError {
        TutelaError::permission_denied(action, format!("{} {}", document.kind, document.id))
    }

    async fn workspace(&self, id: WorkspaceId) -> Result<Workspace> {
        self.workspaces
            .get_by_id(id)
            .await?
            .ok_or_else(|| TutelaError::not_found("Workspace", id.to_string()))
    }
}
