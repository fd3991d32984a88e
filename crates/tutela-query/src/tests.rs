//! Unit tests for tutela-query

use super::*;
use serde_json::json;
use std::collections::HashSet;
use tutela_core::{Criteria, Document, DocumentKind, Principal, UserId, WorkspaceId};

fn doc(owner: UserId, workspace: Option<WorkspaceId>) -> Document {
    Document::new(DocumentKind::Data, "record", owner, workspace)
}

// =============================================================================
// Evaluation Tests
// =============================================================================

#[cfg(test)]
mod eval_tests {
    use super::*;

    #[test]
    fn test_owner_criteria() {
        let owner = UserId::new();
        let mine = doc(owner, None);
        let theirs = doc(UserId::new(), None);

        let criteria = Criteria::OwnerIs(owner);
        assert!(matches(&criteria, &mine));
        assert!(!matches(&criteria, &theirs));
    }

    #[test]
    fn test_workspace_is_none_selects_workspaceless() {
        let owner = UserId::new();
        let private = doc(owner, None);
        let shared = doc(owner, Some(WorkspaceId::new()));

        let criteria = Criteria::WorkspaceIs(None);
        assert!(matches(&criteria, &private));
        assert!(!matches(&criteria, &shared));
    }

    #[test]
    fn test_workspace_in() {
        let ws = WorkspaceId::new();
        let inside = doc(UserId::new(), Some(ws));
        let outside = doc(UserId::new(), Some(WorkspaceId::new()));
        let private = doc(UserId::new(), None);

        let criteria = Criteria::WorkspaceIn(vec![Some(ws)]);
        assert!(matches(&criteria, &inside));
        assert!(!matches(&criteria, &outside));
        assert!(!matches(&criteria, &private));

        let with_null = Criteria::WorkspaceIn(vec![Some(ws), None]);
        assert!(matches(&with_null, &private));
    }

    #[test]
    fn test_empty_workspace_in_matches_nothing() {
        let criteria = Criteria::WorkspaceIn(vec![]);
        assert!(!matches(&criteria, &doc(UserId::new(), None)));
        assert!(!matches(&criteria, &doc(UserId::new(), Some(WorkspaceId::new()))));
    }

    #[test]
    fn test_and_or_composition() {
        let owner = UserId::new();
        let ws = WorkspaceId::new();
        let mine_shared = doc(owner, Some(ws));
        let theirs_shared = doc(UserId::new(), Some(ws));
        let theirs_private = doc(UserId::new(), None);

        let access = Criteria::WorkspaceIn(vec![Some(ws)]).or(Criteria::OwnerIs(owner));
        assert!(matches(&access, &mine_shared));
        assert!(matches(&access, &theirs_shared));
        assert!(!matches(&access, &theirs_private));

        let narrowed = access.and(Criteria::OwnerIs(owner));
        assert!(matches(&narrowed, &mine_shared));
        assert!(!matches(&narrowed, &theirs_shared));
    }

    #[test]
    fn test_kind_and_title() {
        let mut record = doc(UserId::new(), None);
        record.title = "yearly report".to_string();

        assert!(matches(&Criteria::KindIs(DocumentKind::Data), &record));
        assert!(!matches(&Criteria::KindIs(DocumentKind::Blob), &record));
        assert!(matches(&Criteria::TitleContains("report".into()), &record));
        assert!(!matches(&Criteria::TitleContains("invoice".into()), &record));
    }
}

// =============================================================================
// Document-store Rendering Tests
// =============================================================================

#[cfg(test)]
mod docstore_tests {
    use super::*;

    #[test]
    fn test_owner_renders_as_user_id() {
        let owner = UserId::new();
        assert_eq!(
            to_filter(&Criteria::OwnerIs(owner)),
            json!({ "user_id": owner.to_string() })
        );
    }

    #[test]
    fn test_workspace_none_renders_as_null() {
        assert_eq!(
            to_filter(&Criteria::WorkspaceIs(None)),
            json!({ "workspace": null })
        );
    }

    #[test]
    fn test_workspace_in_renders_as_in() {
        let ws = WorkspaceId::new();
        assert_eq!(
            to_filter(&Criteria::WorkspaceIn(vec![Some(ws)])),
            json!({ "workspace": { "$in": [ws.to_string()] } })
        );
    }

    #[test]
    fn test_workspace_in_with_null_renders_as_or() {
        let ws = WorkspaceId::new();
        assert_eq!(
            to_filter(&Criteria::WorkspaceIn(vec![Some(ws), None])),
            json!({ "$or": [
                { "workspace": { "$in": [ws.to_string()] } },
                { "workspace": null },
            ]})
        );
    }

    #[test]
    fn test_conjunction_renders_as_and() {
        let owner = UserId::new();
        let criteria = Criteria::OwnerIs(owner).and(Criteria::WorkspaceIs(None));
        assert_eq!(
            to_filter(&criteria),
            json!({ "$and": [
                { "user_id": owner.to_string() },
                { "workspace": null },
            ]})
        );
    }

    #[test]
    fn test_match_stage_wrapping() {
        let owner = UserId::new();
        assert_eq!(
            to_match_stage(&Criteria::OwnerIs(owner)),
            json!({ "$match": { "user_id": owner.to_string() } })
        );
    }

    #[test]
    fn test_pipeline_prepends_match_when_absent() {
        let owner = UserId::new();
        let mut pipeline = vec![json!({ "$sort": { "created_at": -1 } })];

        apply_to_pipeline(&mut pipeline, &Criteria::OwnerIs(owner));

        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline[0],
            json!({ "$match": { "user_id": owner.to_string() } })
        );
    }

    #[test]
    fn test_pipeline_merges_into_existing_match() {
        let owner = UserId::new();
        let mut pipeline = vec![
            json!({ "$match": { "kind": "data" } }),
            json!({ "$sort": { "created_at": -1 } }),
        ];

        apply_to_pipeline(&mut pipeline, &Criteria::OwnerIs(owner));

        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline[0],
            json!({ "$match": { "$and": [
                { "kind": "data" },
                { "user_id": owner.to_string() },
            ]}})
        );
    }

    #[test]
    fn test_unrestricted_leaves_pipeline_unchanged() {
        let mut pipeline = vec![json!({ "$sort": { "created_at": -1 } })];
        apply_to_pipeline(&mut pipeline, &Criteria::All);
        assert_eq!(pipeline.len(), 1);
    }
}

// =============================================================================
// Rewrite Tests
// =============================================================================

#[cfg(test)]
mod rewrite_tests {
    use super::*;

    #[test]
    fn test_user_filter_own_id_accepted() {
        let id = UserId::new();
        let principal = Principal::user(id);
        assert!(check_user_filter(&principal, Some(&id)).is_ok());
        assert!(check_user_filter(&principal, None).is_ok());
    }

    #[test]
    fn test_user_filter_foreign_id_rejected() {
        let principal = Principal::user(UserId::new());
        let other = UserId::new();
        let err = check_user_filter(&principal, Some(&other)).unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_user_filter_superuser_may_name_anyone() {
        let principal = Principal::superuser(UserId::new());
        let other = UserId::new();
        assert!(check_user_filter(&principal, Some(&other)).is_ok());
    }

    #[test]
    fn test_workspace_filter_rejects_inaccessible_id() {
        let principal = Principal::user(UserId::new());
        let accessible: HashSet<WorkspaceId> = [WorkspaceId::new()].into_iter().collect();
        let foreign = WorkspaceId::new();

        let err = check_workspace_filter(&principal, &[Some(foreign)], &accessible).unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[test]
    fn test_workspace_filter_accepts_accessible_and_empty() {
        let principal = Principal::user(UserId::new());
        let ws = WorkspaceId::new();
        let accessible: HashSet<WorkspaceId> = [ws].into_iter().collect();

        assert!(check_workspace_filter(&principal, &[Some(ws)], &accessible).is_ok());
        assert!(check_workspace_filter(&principal, &[], &accessible).is_ok());
        // "no workspace" entries are resolved by the ownership branch
        assert!(check_workspace_filter(&principal, &[None], &accessible).is_ok());
    }

    #[test]
    fn test_access_criteria_scopes_to_readable_or_owned() {
        let me = UserId::new();
        let principal = Principal::user(me);
        let shared = WorkspaceId::new();
        let readable: HashSet<WorkspaceId> = [shared].into_iter().collect();

        let criteria =
            access_criteria(Criteria::All, &principal, &readable, None, None).unwrap();

        assert!(matches(&criteria, &doc(UserId::new(), Some(shared))));
        assert!(matches(&criteria, &doc(me, None)));
        assert!(!matches(&criteria, &doc(UserId::new(), None)));
        assert!(!matches(&criteria, &doc(UserId::new(), Some(WorkspaceId::new()))));
    }

    #[test]
    fn test_access_criteria_anonymous_has_no_ownership_branch() {
        let principal = Principal::anonymous();
        let public = WorkspaceId::new();
        let readable: HashSet<WorkspaceId> = [public].into_iter().collect();

        let criteria =
            access_criteria(Criteria::All, &principal, &readable, None, None).unwrap();

        assert!(matches(&criteria, &doc(UserId::new(), Some(public))));
        assert!(!matches(&criteria, &doc(UserId::new(), None)));
    }

    #[test]
    fn test_access_criteria_superuser_filters_verbatim() {
        let principal = Principal::superuser(UserId::new());
        let ws = WorkspaceId::new();
        let readable = HashSet::new();

        let criteria = access_criteria(
            Criteria::All,
            &principal,
            &readable,
            Some(&[Some(ws)]),
            None,
        )
        .unwrap();

        // Honored verbatim: inside the filter passes, everything else fails,
        // and no ownership restriction is layered on top.
        assert!(matches(&criteria, &doc(UserId::new(), Some(ws))));
        assert!(!matches(&criteria, &doc(UserId::new(), None)));
    }

    #[test]
    fn test_access_criteria_superuser_unfiltered_is_unrestricted() {
        let principal = Principal::superuser(UserId::new());
        let criteria =
            access_criteria(Criteria::All, &principal, &HashSet::new(), None, None).unwrap();
        assert!(criteria.is_unrestricted());
    }

    #[test]
    fn test_access_criteria_explicit_filter_narrows() {
        let me = UserId::new();
        let principal = Principal::user(me);
        let a = WorkspaceId::new();
        let b = WorkspaceId::new();
        let readable: HashSet<WorkspaceId> = [a, b].into_iter().collect();

        let criteria =
            access_criteria(Criteria::All, &principal, &readable, Some(&[Some(a)]), None)
                .unwrap();

        assert!(matches(&criteria, &doc(UserId::new(), Some(a))));
        assert!(!matches(&criteria, &doc(UserId::new(), Some(b))));
    }

    #[test]
    fn test_access_criteria_rewrite_is_idempotent() {
        let me = UserId::new();
        let principal = Principal::user(me);
        let shared = WorkspaceId::new();
        let readable: HashSet<WorkspaceId> = [shared].into_iter().collect();

        let once = access_criteria(Criteria::All, &principal, &readable, None, None).unwrap();
        let twice =
            access_criteria(once.clone(), &principal, &readable, None, None).unwrap();

        let samples = vec![
            doc(me, None),
            doc(me, Some(shared)),
            doc(UserId::new(), Some(shared)),
            doc(UserId::new(), Some(WorkspaceId::new())),
            doc(UserId::new(), None),
        ];
        for sample in &samples {
            assert_eq!(matches(&once, sample), matches(&twice, sample));
        }
    }
}
