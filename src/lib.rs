//! Shared fixtures for the Tutela integration suite

use std::sync::Arc;

use tutela_core::AccessConfig;
use tutela_policy::{
    DocumentService, GroupRegistry, PermissionStore, PolicyEngine, WorkspaceService,
};
use tutela_store::{
    MemoryDocumentRepository, MemoryGroupRepository, MemoryPermissionRepository,
    MemoryPreferencesRepository, MemoryWorkspaceRepository,
};

/// A fully wired platform over in-memory storage
pub struct Platform {
    pub engine: Arc<PolicyEngine>,
    pub workspaces: WorkspaceService,
    pub documents: DocumentService,
    pub permissions: PermissionStore,
    pub groups: GroupRegistry,
}

/// Assemble the platform with the given deployment configuration, with the
/// builtin capability rows and well-known groups bootstrapped
pub async fn platform(config: AccessConfig) -> Platform {
    let permission_repo = Arc::new(MemoryPermissionRepository::new());
    let group_repo = Arc::new(MemoryGroupRepository::new());
    let workspace_repo = Arc::new(MemoryWorkspaceRepository::new());
    let document_repo = Arc::new(MemoryDocumentRepository::new());
    let preferences_repo = Arc::new(MemoryPreferencesRepository::new());

    let permissions = PermissionStore::new(permission_repo.clone(), group_repo.clone());
    let groups = GroupRegistry::new(group_repo.clone(), permission_repo.clone());
    permissions
        .ensure_builtin()
        .await
        .expect("builtin permissions");
    groups.ensure_well_known().await.expect("well-known groups");

    let engine = Arc::new(PolicyEngine::new(
        config,
        permissions.clone(),
        workspace_repo.clone(),
    ));
    let workspaces = WorkspaceService::new(
        engine.clone(),
        permissions.clone(),
        groups.clone(),
        workspace_repo.clone(),
    );
    let documents = DocumentService::new(
        engine.clone(),
        document_repo,
        workspace_repo,
        preferences_repo,
    );

    Platform {
        engine,
        workspaces,
        documents,
        permissions,
        groups,
    }
}
