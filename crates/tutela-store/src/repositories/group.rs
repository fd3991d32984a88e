//! Group repository implementation

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::instrument;

use tutela_core::{Group, GroupId, GroupRepository, Result, TutelaError, UserId};

#[derive(Default)]
struct GroupState {
    groups: HashMap<GroupId, Group>,
    members: HashMap<GroupId, HashSet<UserId>>,
}

/// In-memory implementation of GroupRepository
#[derive(Default)]
pub struct MemoryGroupRepository {
    state: RwLock<GroupState>,
}

impl MemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupRepository for MemoryGroupRepository {
    #[instrument(skip(self, group))]
    async fn create(&self, group: &Group) -> Result<Group> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|existing| existing.name == group.name) {
            return Err(TutelaError::not_unique("Group", group.name.clone()));
        }
        state.groups.insert(group.id, group.clone());
        Ok(group.clone())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: GroupId) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_by_name(&self, name: &str) -> Result<Option<Group>> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .values()
            .find(|group| group.name == name)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn add_member(&self, group_id: GroupId, user_id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(&group_id) {
            return Err(TutelaError::not_found("Group", group_id.to_string()));
        }
        state.members.entry(group_id).or_default().insert(user_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(members) = state.members.get_mut(&group_id) {
            members.remove(&user_id);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn groups_for_user(&self, user_id: UserId) -> Result<Vec<Group>> {
        let state = self.state.read().await;
        let mut found: Vec<Group> = state
            .members
            .iter()
            .filter(|(_, members)| members.contains(&user_id))
            .filter_map(|(group_id, _)| state.groups.get(group_id).cloned())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }
}
