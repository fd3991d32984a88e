//! Well-known group registry
//!
//! Looks up the `anonymous` and `default` groups. Absence of a well-known
//! group means "no grants through it", never an error.

use std::sync::Arc;
use tracing::instrument;

use tutela_core::{
    Group, GroupRepository, PermissionRepository, Result, ANONYMOUS_GROUP, APP_CONTENT_TYPE,
    DEFAULT_GROUP,
};

#[derive(Clone)]
pub struct GroupRegistry {
    groups: Arc<dyn GroupRepository>,
    permissions: Arc<dyn PermissionRepository>,
}

impl GroupRegistry {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        permissions: Arc<dyn PermissionRepository>,
    ) -> Self {
        Self {
            groups,
            permissions,
        }
    }

    pub async fn get_anonymous_group(&self) -> Result<Option<Group>> {
        self.groups.get_by_name(ANONYMOUS_GROUP).await
    }

    pub async fn get_default_group(&self) -> Result<Option<Group>> {
        self.groups.get_by_name(DEFAULT_GROUP).await
    }

    /// The group matching the name, provided it holds a permission with the
    /// given codename
    #[instrument(skip(self))]
    pub async fn get_by_name_and_permission(
        &self,
        name: &str,
        codename: &str,
    ) -> Result<Option<Group>> {
        let Some(group) = self.groups.get_by_name(name).await? else {
            return Ok(None);
        };
        for id in self.permissions.permissions_for_group(group.id).await? {
            if let Some(perm) = self.permissions.get_by_id(id).await? {
                if perm.content_type == APP_CONTENT_TYPE && perm.codename == codename {
                    return Ok(Some(group));
                }
            }
        }
        Ok(None)
    }

    /// Idempotent bootstrap of the two well-known groups
    pub async fn ensure_well_known(&self) -> Result<()> {
        for name in [ANONYMOUS_GROUP, DEFAULT_GROUP] {
            if self.groups.get_by_name(name).await?.is_none() {
                self.groups.create(&Group::new(name)).await?;
            }
        }
        Ok(())
    }
}
