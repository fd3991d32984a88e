//! Workspace permission store
//!
//! Mints the per-workspace read/write permission pair and manages grants to
//! users and groups. Codenames are derived deterministically from the
//! workspace title and owner, so the same title can coexist across owners
//! without colliding.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{instrument, warn};

use tutela_core::{
    DocumentKind, GroupId, GroupRepository, Permission, PermissionId, PermissionRepository,
    Principal, Result, TutelaError, UserId, ANONYMOUS_GROUP, APP_CONTENT_TYPE,
    PUBLISH_WORKSPACE, READ_WORKSPACE_PREFIX, WRITE_WORKSPACE_PREFIX,
};

/// Owner segment embedded in codenames of ownerless workspace permissions
const GLOBAL_OWNER_SEGMENT: &str = "global";

/// Normalize a workspace title for embedding in a codename:
/// trim, lowercase, spaces to underscores
fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase().replace(' ', "_")
}

fn owner_segment(owner: Option<&UserId>) -> String {
    owner.map_or_else(|| GLOBAL_OWNER_SEGMENT.to_string(), |id| id.to_string())
}

/// Permission store scoped to the application's own content-type namespace
#[derive(Clone)]
pub struct PermissionStore {
    permissions: Arc<dyn PermissionRepository>,
    groups: Arc<dyn GroupRepository>,
}

impl PermissionStore {
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        groups: Arc<dyn GroupRepository>,
    ) -> Self {
        Self {
            permissions,
            groups,
        }
    }

    /// Codename of the read permission for a workspace title/owner pair
    pub fn read_codename(title: &str, owner: Option<&UserId>) -> String {
        format!(
            "{}{}({})",
            READ_WORKSPACE_PREFIX,
            normalize_title(title),
            owner_segment(owner)
        )
    }

    /// Codename of the write permission for a workspace title/owner pair
    pub fn write_codename(title: &str, owner: Option<&UserId>) -> String {
        format!(
            "{}{}({})",
            WRITE_WORKSPACE_PREFIX,
            normalize_title(title),
            owner_segment(owner)
        )
    }

    #[instrument(skip(self))]
    pub async fn create_read_perm(
        &self,
        title: &str,
        owner: Option<&UserId>,
    ) -> Result<Permission> {
        let name = format!("Can read workspace {}", title.trim());
        self.insert(name, Self::read_codename(title, owner)).await
    }

    #[instrument(skip(self))]
    pub async fn create_write_perm(
        &self,
        title: &str,
        owner: Option<&UserId>,
    ) -> Result<Permission> {
        let name = format!("Can write workspace {}", title.trim());
        self.insert(name, Self::write_codename(title, owner)).await
    }

    /// Duplicate codenames surface as NotUnique; any other persistence
    /// failure becomes a domain error
    async fn insert(&self, name: String, codename: String) -> Result<Permission> {
        let permission = Permission::new(name, codename, APP_CONTENT_TYPE);
        match self.permissions.create(&permission).await {
            Ok(created) => Ok(created),
            Err(err @ TutelaError::NotUnique { .. }) => Err(err),
            Err(err) => Err(TutelaError::model_violation(format!(
                "could not create permission: {err}"
            ))),
        }
    }

    pub async fn get_by_id(&self, id: PermissionId) -> Result<Permission> {
        self.permissions
            .get_by_id(id)
            .await?
            .ok_or_else(|| TutelaError::not_found("Permission", id.to_string()))
    }

    pub async fn get_by_codename(&self, codename: &str) -> Result<Permission> {
        self.permissions
            .get_by_codename(APP_CONTENT_TYPE, codename)
            .await?
            .ok_or_else(|| TutelaError::not_found("Permission", codename.to_string()))
    }

    /// Fully qualified label (`namespace.codename`) for capability checks
    pub async fn label_of(&self, id: PermissionId) -> Result<String> {
        Ok(self.get_by_id(id).await?.label())
    }

    pub async fn add_permission_to_user(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
    ) -> Result<()> {
        self.permissions.grant_to_user(user_id, permission_id).await
    }

    pub async fn remove_permission_from_user(
        &self,
        user_id: UserId,
        permission_id: PermissionId,
    ) -> Result<()> {
        self.permissions
            .revoke_from_user(user_id, permission_id)
            .await
    }

    pub async fn add_permission_to_group(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<()> {
        self.permissions
            .grant_to_group(group_id, permission_id)
            .await
    }

    pub async fn remove_permission_from_group(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<()> {
        self.permissions
            .revoke_from_group(group_id, permission_id)
            .await
    }

    pub async fn group_has_permission(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<bool> {
        Ok(self
            .permissions
            .permissions_for_group(group_id)
            .await?
            .contains(&permission_id))
    }

    /// Workspace read-permission ids reachable by the principal: all of them
    /// for superusers, the anonymous group's grants for anonymous callers,
    /// direct plus group grants for registered users.
    #[instrument(skip(self, principal))]
    pub async fn workspace_permissions_user_can_read(
        &self,
        principal: &Principal,
    ) -> Result<HashSet<PermissionId>> {
        self.reachable(principal, READ_WORKSPACE_PREFIX).await
    }

    /// Workspace write-permission ids reachable by the principal. Anonymous
    /// callers never hold write permissions.
    #[instrument(skip(self, principal))]
    pub async fn workspace_permissions_user_can_write(
        &self,
        principal: &Principal,
    ) -> Result<HashSet<PermissionId>> {
        if principal.is_anonymous && !principal.is_superuser {
            return Ok(HashSet::new());
        }
        self.reachable(principal, WRITE_WORKSPACE_PREFIX).await
    }

    async fn reachable(
        &self,
        principal: &Principal,
        prefix: &str,
    ) -> Result<HashSet<PermissionId>> {
        if principal.is_superuser {
            return self.all_workspace_permissions(prefix).await;
        }
        if principal.is_anonymous {
            let Some(anonymous) = self.groups.get_by_name(ANONYMOUS_GROUP).await? else {
                return Ok(HashSet::new());
            };
            let granted = self.permissions.permissions_for_group(anonymous.id).await?;
            return self.retain_prefixed(granted, prefix).await;
        }
        let Some(user_id) = principal.id else {
            return Ok(HashSet::new());
        };
        let mut granted = self.permissions.permissions_for_user(user_id).await?;
        for group in self.groups.groups_for_user(user_id).await? {
            granted.extend(self.permissions.permissions_for_group(group.id).await?);
        }
        self.retain_prefixed(granted, prefix).await
    }

    async fn all_workspace_permissions(&self, prefix: &str) -> Result<HashSet<PermissionId>> {
        Ok(self
            .permissions
            .list_by_content_type(APP_CONTENT_TYPE)
            .await?
            .into_iter()
            .filter(|perm| perm.codename.starts_with(prefix))
            .map(|perm| perm.id)
            .collect())
    }

    async fn retain_prefixed(
        &self,
        granted: HashSet<PermissionId>,
        prefix: &str,
    ) -> Result<HashSet<PermissionId>> {
        let mut result = HashSet::new();
        for id in granted {
            if let Some(perm) = self.permissions.get_by_id(id).await? {
                if perm.content_type == APP_CONTENT_TYPE && perm.codename.starts_with(prefix) {
                    result.insert(id);
                }
            }
        }
        Ok(result)
    }

    /// Best-effort delete: the row may already be gone, and a failed cleanup
    /// must not block the caller's larger workflow.
    #[instrument(skip(self))]
    pub async fn delete_permission(&self, id: PermissionId) {
        if let Err(err) = self.permissions.delete(id).await {
            warn!(permission = %id, "failed to delete permission: {err}");
        }
    }

    /// Idempotently create the application's publish capability rows
    pub async fn ensure_builtin(&self) -> Result<()> {
        let builtin = [
            ("Can publish data", DocumentKind::Data.publish_codename()),
            (
                "Can publish templates",
                DocumentKind::Template.publish_codename(),
            ),
            ("Can publish blobs", DocumentKind::Blob.publish_codename()),
            ("Can publish workspaces", PUBLISH_WORKSPACE),
        ];
        for (name, codename) in builtin {
            let existing = self
                .permissions
                .get_by_codename(APP_CONTENT_TYPE, codename)
                .await?;
            if existing.is_none() {
                self.permissions
                    .create(&Permission::new(name, codename, APP_CONTENT_TYPE))
                    .await?;
            }
        }
        Ok(())
    }
}
