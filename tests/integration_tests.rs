//! Integration tests for the Tutela access-control platform
//!
//! End-to-end flows across the policy, query, and storage crates: workspace
//! sharing, publishing, query scoping, and the workspace lifecycle.

use tutela_core::{permission_label, AccessConfig, DocumentKind, Principal, UserId, PUBLISH_WORKSPACE};
use tutela_integration_tests::platform;
use tutela_policy::{DocumentQuery, PermissionStore};

// =============================================================================
// Sharing Flows
// =============================================================================

#[tokio::test]
async fn test_private_workspace_document_is_closed_to_strangers() {
    let p = platform(AccessConfig::default()).await;
    let alice = UserId::new();
    let bob = Principal::user(UserId::new());

    let reports = p
        .workspaces
        .create_and_save("Reports", Some(alice), false)
        .await
        .unwrap();
    let record = p
        .documents
        .create(
            DocumentKind::Data,
            "quarterly",
            Some(reports.id),
            &Principal::user(alice),
        )
        .await
        .unwrap();

    let err = p.documents.get_by_id(record.id, &bob).await.unwrap_err();
    assert!(err.is_permission_denied());
}

#[tokio::test]
async fn test_granting_read_access_opens_the_workspace() {
    let p = platform(AccessConfig::default()).await;
    let alice = UserId::new();
    let bob = UserId::new();

    let reports = p
        .workspaces
        .create_and_save("Reports", Some(alice), false)
        .await
        .unwrap();
    let record = p
        .documents
        .create(
            DocumentKind::Data,
            "quarterly",
            Some(reports.id),
            &Principal::user(alice),
        )
        .await
        .unwrap();

    p.workspaces
        .add_user_read_access(reports.id, bob, &Principal::user(alice))
        .await
        .unwrap();

    let fetched = p
        .documents
        .get_by_id(record.id, &Principal::user(bob))
        .await
        .unwrap();
    assert_eq!(fetched.id, record.id);

    // Read access is not write access
    let err = p
        .documents
        .delete(record.id, &Principal::user(bob))
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());
}

// =============================================================================
// Publishing Flows
// =============================================================================

#[tokio::test]
async fn test_anonymous_read_of_published_documents() {
    let alice = UserId::new();
    let owner = Principal::user(alice)
        .with_permission(permission_label(PUBLISH_WORKSPACE))
        .with_permission(permission_label(DocumentKind::Data.publish_codename()));

    // With anonymous access enabled, publishing opens the document
    let p = platform(AccessConfig {
        can_anonymous_access_public_document: true,
        ..AccessConfig::default()
    })
    .await;
    let reports = p
        .workspaces
        .create_and_save("Reports", Some(alice), false)
        .await
        .unwrap();
    let record = p
        .documents
        .create(DocumentKind::Data, "quarterly", Some(reports.id), &owner)
        .await
        .unwrap();

    assert!(p
        .documents
        .get_by_id(record.id, &Principal::anonymous())
        .await
        .unwrap_err()
        .is_permission_denied());

    p.workspaces.set_public(reports.id, &owner).await.unwrap();
    let fetched = p
        .documents
        .get_by_id(record.id, &Principal::anonymous())
        .await
        .unwrap();
    assert_eq!(fetched.id, record.id);

    // With the switch off, the same state stays closed to anonymous readers
    let p = platform(AccessConfig::default()).await;
    let reports = p
        .workspaces
        .create_and_save("Reports", Some(alice), true)
        .await
        .unwrap();
    let record = p
        .documents
        .create(DocumentKind::Data, "quarterly", Some(reports.id), &owner)
        .await
        .unwrap();
    assert!(p
        .documents
        .get_by_id(record.id, &Principal::anonymous())
        .await
        .unwrap_err()
        .is_permission_denied());
}

#[tokio::test]
async fn test_unpublish_guard_keeps_document_in_public_workspace() {
    let p = platform(AccessConfig {
        can_set_public_data_to_private: false,
        ..AccessConfig::default()
    })
    .await;
    let alice = UserId::new();
    let owner = Principal::user(alice)
        .with_permission(permission_label(DocumentKind::Data.publish_codename()));

    let reports = p
        .workspaces
        .create_and_save("Reports", Some(alice), true)
        .await
        .unwrap();
    let record = p
        .documents
        .create(DocumentKind::Data, "quarterly", Some(reports.id), &owner)
        .await
        .unwrap();

    let err = p
        .documents
        .assign_workspace(record.id, None, &owner)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let stored = p.documents.get_by_id(record.id, &owner).await.unwrap();
    assert_eq!(stored.workspace, Some(reports.id));
}

// =============================================================================
// Workspace Lifecycle
// =============================================================================

#[tokio::test]
async fn test_duplicate_workspace_creation_leaves_one_pair() {
    let p = platform(AccessConfig::default()).await;
    let alice = UserId::new();

    p.workspaces
        .create_and_save("Reports", Some(alice), false)
        .await
        .unwrap();
    let err = p
        .workspaces
        .create_and_save("Reports", Some(alice), false)
        .await
        .unwrap_err();
    assert!(err.is_not_unique());

    // The surviving pair is the original one
    p.permissions
        .get_by_codename(&PermissionStore::read_codename("Reports", Some(&alice)))
        .await
        .unwrap();
    p.permissions
        .get_by_codename(&PermissionStore::write_codename("Reports", Some(&alice)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_deleting_workspace_revokes_derived_access() {
    let p = platform(AccessConfig::default()).await;
    let alice = UserId::new();
    let bob = UserId::new();

    let reports = p
        .workspaces
        .create_and_save("Reports", Some(alice), false)
        .await
        .unwrap();
    p.workspaces
        .add_user_read_access(reports.id, bob, &Principal::user(alice))
        .await
        .unwrap();

    p.workspaces
        .delete(reports.id, &Principal::user(alice))
        .await
        .unwrap();

    // The permission pair went with the workspace
    assert!(p
        .permissions
        .get_by_id(reports.read_perm)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(p
        .permissions
        .get_by_id(reports.write_perm)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(p
        .workspaces
        .workspaces_user_can_read(&Principal::user(bob))
        .await
        .unwrap()
        .is_empty());
}

// =============================================================================
// Query Scoping
// =============================================================================

#[tokio::test]
async fn test_superuser_filter_is_honored_verbatim() {
    let p = platform(AccessConfig::default()).await;
    let alice = UserId::new();

    let reports = p
        .workspaces
        .create_and_save("Reports", Some(alice), false)
        .await
        .unwrap();
    let inside = p
        .documents
        .create(
            DocumentKind::Data,
            "inside",
            Some(reports.id),
            &Principal::user(alice),
        )
        .await
        .unwrap();
    p.documents
        .create(DocumentKind::Data, "outside", None, &Principal::user(alice))
        .await
        .unwrap();

    let query = DocumentQuery {
        workspace_filter: Some(vec![Some(reports.id)]),
        ..DocumentQuery::default()
    };
    let found = p
        .documents
        .list(&Principal::superuser(UserId::new()), query)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, inside.id);
}

#[tokio::test]
async fn test_listing_stays_within_accessible_workspaces() {
    let p = platform(AccessConfig::default()).await;
    let alice = UserId::new();
    let bob = UserId::new();

    let reports = p
        .workspaces
        .create_and_save("Reports", Some(alice), false)
        .await
        .unwrap();
    let drafts = p
        .workspaces
        .create_and_save("Drafts", Some(alice), false)
        .await
        .unwrap();
    p.workspaces
        .add_user_read_access(reports.id, bob, &Principal::user(alice))
        .await
        .unwrap();

    let shared = p
        .documents
        .create(
            DocumentKind::Data,
            "shared",
            Some(reports.id),
            &Principal::user(alice),
        )
        .await
        .unwrap();
    p.documents
        .create(
            DocumentKind::Data,
            "hidden",
            Some(drafts.id),
            &Principal::user(alice),
        )
        .await
        .unwrap();

    let found = p
        .documents
        .list(&Principal::user(bob), DocumentQuery::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, shared.id);

    // Asking for the unshared workspace explicitly is rejected outright
    let query = DocumentQuery {
        workspace_filter: Some(vec![Some(drafts.id)]),
        ..DocumentQuery::default()
    };
    assert!(p
        .documents
        .list(&Principal::user(bob), query)
        .await
        .unwrap_err()
        .is_permission_denied());
}

#[tokio::test]
async fn test_aggregation_pipeline_gets_access_match_merged() {
    let p = platform(AccessConfig::default()).await;
    let alice = UserId::new();

    let pipeline = vec![
        serde_json::json!({ "$match": { "kind": "data" } }),
        serde_json::json!({ "$sort": { "created_at": -1 } }),
    ];
    let scoped = p
        .documents
        .scoped_pipeline(&Principal::user(alice), pipeline, DocumentQuery::default())
        .await
        .unwrap();

    // The access restriction was conjoined into the existing $match stage
    assert_eq!(scoped.len(), 2);
    let merged = scoped[0].get("$match").unwrap();
    assert!(merged.get("$and").is_some());
}
