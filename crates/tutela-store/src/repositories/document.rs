//! Document repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::instrument;

use tutela_core::{
    Criteria, Document, DocumentId, DocumentOrder, DocumentRepository, Result, TutelaError,
};
use tutela_query::matches;

/// In-memory implementation of DocumentRepository
#[derive(Default)]
pub struct MemoryDocumentRepository {
    state: RwLock<HashMap<DocumentId, Document>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    #[instrument(skip(self, document))]
    async fn create(&self, document: &Document) -> Result<Document> {
        let mut state = self.state.write().await;
        state.insert(document.id, document.clone());
        Ok(document.clone())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: DocumentId) -> Result<Option<Document>> {
        let state = self.state.read().await;
        Ok(state.get(&id).cloned())
    }

    #[instrument(skip(self, document))]
    async fn update(&self, document: &Document) -> Result<Document> {
        let mut state = self.state.write().await;
        if !state.contains_key(&document.id) {
            return Err(TutelaError::not_found("Document", document.id.to_string()));
        }
        state.insert(document.id, document.clone());
        Ok(document.clone())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: DocumentId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.remove(&id).is_none() {
            return Err(TutelaError::not_found("Document", id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, criteria))]
    async fn query(&self, criteria: &Criteria, order: DocumentOrder) -> Result<Vec<Document>> {
        let state = self.state.read().await;
        let mut found: Vec<Document> = state
            .values()
            .filter(|doc| matches(criteria, doc))
            .cloned()
            .collect();
        match order {
            DocumentOrder::NewestFirst => {
                found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)))
            }
            DocumentOrder::OldestFirst => {
                found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            }
            DocumentOrder::TitleAsc => {
                found.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)))
            }
        }
        Ok(found)
    }
}
