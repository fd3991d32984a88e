//! Workspace repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

use tutela_core::{
    Result, TutelaError, UserId, Workspace, WorkspaceId, WorkspaceRepository,
};

/// In-memory implementation of WorkspaceRepository
#[derive(Default)]
pub struct MemoryWorkspaceRepository {
    state: RwLock<HashMap<WorkspaceId, Workspace>>,
}

impl MemoryWorkspaceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn title_taken(workspaces: &HashMap<WorkspaceId, Workspace>, candidate: &Workspace) -> bool {
    workspaces.values().any(|existing| {
        existing.id != candidate.id
            && existing.title == candidate.title
            && existing.owner == candidate.owner
    })
}

#[async_trait]
impl WorkspaceRepository for MemoryWorkspaceRepository {
    #[instrument(skip(self, workspace))]
    async fn create(&self, workspace: &Workspace) -> Result<Workspace> {
        let mut state = self.state.write().await;
        if title_taken(&state, workspace) {
            return Err(TutelaError::not_unique("Workspace", workspace.title.clone()));
        }
        state.insert(workspace.id, workspace.clone());
        Ok(workspace.clone())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: WorkspaceId) -> Result<Option<Workspace>> {
        let state = self.state.read().await;
        Ok(state.get(&id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_by_title_and_owner(
        &self,
        title: &str,
        owner: Option<&UserId>,
    ) -> Result<Option<Workspace>> {
        let state = self.state.read().await;
        Ok(state
            .values()
            .find(|ws| ws.title == title && ws.owner.as_ref() == owner)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Workspace>> {
        let state = self.state.read().await;
        let mut found: Vec<Workspace> = state.values().cloned().collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn list_public(&self) -> Result<Vec<Workspace>> {
        let state = self.state.read().await;
        let mut found: Vec<Workspace> = state.values().filter(|ws| ws.is_public).cloned().collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Workspace>> {
        let state = self.state.read().await;
        let mut found: Vec<Workspace> = state
            .values()
            .filter(|ws| ws.owner.as_ref() == Some(owner))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn get_global(&self) -> Result<Option<Workspace>> {
        let state = self.state.read().await;
        Ok(state.values().find(|ws| ws.is_global()).cloned())
    }

    #[instrument(skip(self, workspace))]
    async fn update(&self, workspace: &Workspace) -> Result<Workspace> {
        let mut state = self.state.write().await;
        if !state.contains_key(&workspace.id) {
            return Err(TutelaError::not_found("Workspace", workspace.id.to_string()));
        }
        if title_taken(&state, workspace) {
            return Err(TutelaError::not_unique("Workspace", workspace.title.clone()));
        }
        state.insert(workspace.id, workspace.clone());
        Ok(workspace.clone())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: WorkspaceId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.remove(&id).is_none() {
            return Err(TutelaError::not_found("Workspace", id.to_string()));
        }
        Ok(())
    }
}
