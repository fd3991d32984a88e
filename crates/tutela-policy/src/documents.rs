//! Guarded document operations
//!
//! Every operation authorizes through the policy engine before touching
//! storage. List reads go through the query rewrite; the whole-list
//! verification pass only runs when the deployment asks for it.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use tutela_core::{
    Criteria, Document, DocumentId, DocumentKind, DocumentRepository, PreferencesRepository,
    Principal, Result, TutelaError, UserId, UserPreferences, Workspace, WorkspaceId,
    WorkspaceRepository,
};
use tutela_query::{access_criteria, apply_to_pipeline};

use crate::engine::PolicyEngine;

/// Caller-supplied list parameters, e.g. parsed from REST query strings.
///
/// A workspace filter entry of `None` requests documents outside any
/// workspace.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub criteria: Criteria,
    pub workspace_filter: Option<Vec<Option<WorkspaceId>>>,
    pub user_filter: Option<UserId>,
}

#[derive(Clone)]
pub struct DocumentService {
    engine: Arc<PolicyEngine>,
    documents: Arc<dyn DocumentRepository>,
    workspaces: Arc<dyn WorkspaceRepository>,
    preferences: Arc<dyn PreferencesRepository>,
}

impl DocumentService {
    pub fn new(
        engine: Arc<PolicyEngine>,
        documents: Arc<dyn DocumentRepository>,
        workspaces: Arc<dyn WorkspaceRepository>,
        preferences: Arc<dyn PreferencesRepository>,
    ) -> Self {
        Self {
            engine,
            documents,
            workspaces,
            preferences,
        }
    }

    /// Fetch a document the caller may read. A missing document surfaces as
    /// NotFound, never as a permission failure.
    pub async fn get_by_id(&self, id: DocumentId, principal: &Principal) -> Result<Document> {
        let document = self.fetch(id).await?;
        self.engine.check_can_read(&document, principal).await?;
        Ok(document)
    }

    /// Create a document owned by the caller, optionally placed straight
    /// into a workspace
    #[instrument(skip(self, principal))]
    pub async fn create(
        &self,
        kind: DocumentKind,
        title: &str,
        workspace: Option<WorkspaceId>,
        principal: &Principal,
    ) -> Result<Document> {
        let Some(owner) = principal.id else {
            return Err(TutelaError::permission_denied("create", "document"));
        };
        let mut document = Document::new(kind, title, owner, None);
        if let Some(workspace_id) = workspace {
            let target = self.workspace(workspace_id).await?;
            self.engine
                .can_assign_workspace(&document, Some(&target), principal)
                .await?;
            document.workspace = workspace;
        }
        let created = self.documents.create(&document).await?;
        info!(document = %created.id, kind = %created.kind, "created document");
        Ok(created)
    }

    /// Update document content. Ownership and placement are frozen here;
    /// they change through [`Self::change_owner`] and
    /// [`Self::assign_workspace`].
    pub async fn update(&self, document: &Document, principal: &Principal) -> Result<Document> {
        let current = self.fetch(document.id).await?;
        self.engine.check_can_write(&current, principal).await?;
        let mut updated = document.clone();
        updated.owner = current.owner;
        updated.workspace = current.workspace;
        updated.updated_at = Utc::now();
        self.documents.update(&updated).await
    }

    pub async fn delete(&self, id: DocumentId, principal: &Principal) -> Result<()> {
        let document = self.fetch(id).await?;
        self.engine.check_can_write(&document, principal).await?;
        self.documents.delete(id).await
    }

    /// Move a document into another workspace, or out of workspaces entirely
    #[instrument(skip(self, principal))]
    pub async fn assign_workspace(
        &self,
        id: DocumentId,
        target: Option<WorkspaceId>,
        principal: &Principal,
    ) -> Result<Document> {
        let mut document = self.fetch(id).await?;
        let target_workspace = match target {
            Some(workspace_id) => Some(self.workspace(workspace_id).await?),
            None => None,
        };
        self.engine
            .can_assign_workspace(&document, target_workspace.as_ref(), principal)
            .await?;
        document.workspace = target;
        document.updated_at = Utc::now();
        self.documents.update(&document).await
    }

    pub async fn change_owner(
        &self,
        id: DocumentId,
        new_owner: UserId,
        principal: &Principal,
    ) -> Result<Document> {
        let mut document = self.fetch(id).await?;
        self.engine.check_can_change_owner(&document, principal)?;
        document.owner = new_owner;
        document.updated_at = Utc::now();
        self.documents.update(&document).await
    }

    /// List documents visible to the caller. Explicit filters are validated,
    /// the access restriction is conjoined, and the result is re-verified
    /// when the deployment enables the defensive pass.
    #[instrument(skip(self, principal, query))]
    pub async fn list(&self, principal: &Principal, query: DocumentQuery) -> Result<Vec<Document>> {
        self.engine.check_anonymous_access(principal)?;
        let readable = self.engine.readable_workspaces(principal).await?;
        let criteria = access_criteria(
            query.criteria,
            principal,
            &readable,
            query.workspace_filter.as_deref(),
            query.user_filter.as_ref(),
        )?;
        let found = self
            .documents
            .query(&criteria, self.engine.config().default_order)
            .await?;
        if self.engine.config().verify_document_access {
            self.engine.check_can_read_list(&found, principal).await?;
        }
        Ok(found)
    }

    /// Document-store variant of [`Self::list`]: returns the aggregation
    /// pipeline with the access restriction merged into its `$match` stage
    /// (or prepended as one), ready for a document-store backend to execute
    #[instrument(skip(self, principal, pipeline, query))]
    pub async fn scoped_pipeline(
        &self,
        principal: &Principal,
        mut pipeline: Vec<Value>,
        query: DocumentQuery,
    ) -> Result<Vec<Value>> {
        self.engine.check_anonymous_access(principal)?;
        let readable = self.engine.readable_workspaces(principal).await?;
        let criteria = access_criteria(
            query.criteria,
            principal,
            &readable,
            query.workspace_filter.as_deref(),
            query.user_filter.as_ref(),
        )?;
        apply_to_pipeline(&mut pipeline, &criteria);
        Ok(pipeline)
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    pub async fn get_preferences(&self, principal: &Principal) -> Result<UserPreferences> {
        let Some(owner) = principal.id else {
            return Err(TutelaError::permission_denied("read", "preferences"));
        };
        let preferences = self
            .preferences
            .get_by_owner(owner)
            .await?
            .ok_or_else(|| TutelaError::not_found("UserPreferences", owner.to_string()))?;
        self.engine.check_preferences_access(&preferences, principal)?;
        Ok(preferences)
    }

    pub async fn save_preferences(
        &self,
        preferences: &UserPreferences,
        principal: &Principal,
    ) -> Result<UserPreferences> {
        self.engine.check_preferences_access(preferences, principal)?;
        let mut stored = preferences.clone();
        stored.updated_at = Utc::now();
        self.preferences.upsert(&stored).await
    }

    async fn fetch(&self, id: DocumentId) -> Result<Document> {
        self.documents
            .get_by_id(id)
            .await?
            .ok_or_else(|| TutelaError::not_found("Document", id.to_string()))
    }

    async fn workspace(&self, id: WorkspaceId) -> Result<Workspace> {
        self.workspaces
            .get_by_id(id)
            .await?
            .ok_or_else(|| TutelaError::not_found("Workspace", id.to_string()))
    }
}
