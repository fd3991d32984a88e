//! Permission repository implementation

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::instrument;

use tutela_core::{
    GroupId, Permission, PermissionId, PermissionRepository, Result, TutelaError, UserId,
};

#[derive(Default)]
struct PermissionState {
    permissions: HashMap<PermissionId, Permission>,
    user_grants: HashMap<UserId, HashSet<PermissionId>>,
    group_grants: HashMap<GroupId, HashSet<PermissionId>>,
}

/// In-memory implementation of PermissionRepository
#[derive(Default)]
pub struct MemoryPermissionRepository {
    state: RwLock<PermissionState>,
}

impl MemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionRepository for MemoryPermissionRepository {
    #[instrument(skip(self, permission))]
    async fn create(&self, permission: &Permission) -> Result<Permission> {
        let mut state = self.state.write().await;
        let duplicate = state.permissions.values().any(|existing| {
            existing.content_type == permission.content_type
                && existing.codename == permission.codename
        });
        if duplicate {
            return Err(TutelaError::not_unique(
                "Permission",
                format!("{}.{}", permission.content_type, permission.codename),
            ));
        }
        state.permissions.insert(permission.id, permission.clone());
        Ok(permission.clone())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: PermissionId) -> Result<Option<Permission>> {
        let state = self.state.read().await;
        Ok(state.permissions.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_by_codename(
        &self,
        content_type: &str,
        codename: &str,
    ) -> Result<Option<Permission>> {
        let state = self.state.read().await;
        Ok(state
            .permissions
            .values()
            .find(|perm| perm.content_type == content_type && perm.codename == codename)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn list_by_content_type(&self, content_type: &str) -> Result<Vec<Permission>> {
        let state = self.state.read().await;
        let mut found: Vec<Permission> = state
            .permissions
            .values()
            .filter(|perm| perm.content_type == content_type)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.codename.cmp(&b.codename));
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: PermissionId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.permissions.remove(&id).is_none() {
            return Err(TutelaError::not_found("Permission", id.to_string()));
        }
        for grants in state.user_grants.values_mut() {
            grants.remove(&id);
        }
        for grants in state.group_grants.values_mut() {
            grants.remove(&id);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn grant_to_user(&self, user_id: UserId, permission_id: PermissionId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.permissions.contains_key(&permission_id) {
            return Err(TutelaError::not_found(
                "Permission",
                permission_id.to_string(),
            ));
        }
        state
            .user_grants
            .entry(user_id)
            .or_default()
            .insert(permission_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_from_user(&self, user_id: UserId, permission_id: PermissionId) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(grants) = state.user_grants.get_mut(&user_id) {
            grants.remove(&permission_id);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn grant_to_group(&self, group_id: GroupId, permission_id: PermissionId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.permissions.contains_key(&permission_id) {
            return Err(TutelaError::not_found(
                "Permission",
                permission_id.to_string(),
            ));
        }
        state
            .group_grants
            .entry(group_id)
            .or_default()
            .insert(permission_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_from_group(
        &self,
        group_id: GroupId,
        permission_id: PermissionId,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(grants) = state.group_grants.get_mut(&group_id) {
            grants.remove(&permission_id);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn permissions_for_user(&self, user_id: UserId) -> Result<HashSet<PermissionId>> {
        let state = self.state.read().await;
        Ok(state.user_grants.get(&user_id).cloned().unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn permissions_for_group(&self, group_id: GroupId) -> Result<HashSet<PermissionId>> {
        let state = self.state.read().await;
        Ok(state
            .group_grants
            .get(&group_id)
            .cloned()
            .unwrap_or_default())
    }
}
