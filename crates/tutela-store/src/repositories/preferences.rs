//! User preferences repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

use tutela_core::{PreferencesRepository, Result, UserId, UserPreferences};

/// In-memory implementation of PreferencesRepository
#[derive(Default)]
pub struct MemoryPreferencesRepository {
    state: RwLock<HashMap<UserId, UserPreferences>>,
}

impl MemoryPreferencesRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferencesRepository for MemoryPreferencesRepository {
    #[instrument(skip(self))]
    async fn get_by_owner(&self, owner: UserId) -> Result<Option<UserPreferences>> {
        let state = self.state.read().await;
        Ok(state.get(&owner).cloned())
    }

    #[instrument(skip(self, preferences))]
    async fn upsert(&self, preferences: &UserPreferences) -> Result<UserPreferences> {
        let mut state = self.state.write().await;
        state.insert(preferences.owner, preferences.clone());
        Ok(preferences.clone())
    }

    #[instrument(skip(self))]
    async fn delete_by_owner(&self, owner: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        state.remove(&owner);
        Ok(())
    }
}
