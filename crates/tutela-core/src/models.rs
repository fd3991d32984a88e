//! Domain models for the Tutela content platform
//!
//! Accessibility of a document is derived entirely from its owner and its
//! optional workspace; documents never own workspaces. A workspace carries
//! exactly one read permission and one write permission, created together
//! with it.

use crate::ids::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// Well-known names and capability codenames
// =============================================================================

/// Content-type namespace for permissions minted by this application
pub const APP_CONTENT_TYPE: &str = "tutela";

/// Well-known group whose grants apply to unauthenticated callers
pub const ANONYMOUS_GROUP: &str = "anonymous";

/// Baseline group for registered users
pub const DEFAULT_GROUP: &str = "default";

/// Codename prefix for workspace read permissions
pub const READ_WORKSPACE_PREFIX: &str = "read_workspace_";

/// Codename prefix for workspace write permissions
pub const WRITE_WORKSPACE_PREFIX: &str = "write_workspace_";

/// Capability required to make a workspace public
pub const PUBLISH_WORKSPACE: &str = "publish_workspace";

/// Fully qualified permission label (`namespace.codename`) as consumed by
/// [`Principal::has_permission`]
pub fn permission_label(codename: &str) -> String {
    format!("{}.{}", APP_CONTENT_TYPE, codename)
}

// =============================================================================
// Principal
// =============================================================================

/// Read-only identity of the acting caller, handed over by the
/// authentication layer.
///
/// Anonymous principals carry no id. Capability labels are resolved by the
/// authentication subsystem at login time; superusers implicitly hold every
/// capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Option<UserId>,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub is_anonymous: bool,
    labels: HashSet<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            is_superuser: false,
            is_staff: false,
            is_anonymous: true,
            labels: HashSet::new(),
        }
    }

    pub fn user(id: UserId) -> Self {
        Self {
            id: Some(id),
            is_superuser: false,
            is_staff: false,
            is_anonymous: false,
            labels: HashSet::new(),
        }
    }

    pub fn staff(id: UserId) -> Self {
        Self {
            is_staff: true,
            ..Self::user(id)
        }
    }

    pub fn superuser(id: UserId) -> Self {
        Self {
            is_superuser: true,
            is_staff: true,
            ..Self::user(id)
        }
    }

    /// Attach a capability label (e.g. `tutela.publish_data`)
    pub fn with_permission(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn has_permission(&self, label: &str) -> bool {
        self.is_superuser || self.labels.contains(label)
    }

    /// True if the given owner id is this caller
    pub fn owns(&self, owner: &UserId) -> bool {
        self.id.as_ref() == Some(owner)
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match &self.id {
            Some(id) => format!("user {id}"),
            None => "anonymous".to_string(),
        }
    }
}

// =============================================================================
// Permission & Group
// =============================================================================

/// A named grantable capability, assignable to users or groups.
///
/// The (content_type, codename) pair is unique across the deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub codename: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(
        name: impl Into<String>,
        codename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            id: PermissionId::new(),
            name: name.into(),
            codename: codename.into(),
            content_type: content_type.into(),
            created_at: Utc::now(),
        }
    }

    /// Fully qualified label used in capability checks
    pub fn label(&self) -> String {
        format!("{}.{}", self.content_type, self.codename)
    }
}

/// A named collection of users sharing granted permissions.
///
/// Names are unique; `anonymous` and `default` are well-known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Workspace
// =============================================================================

/// A shareable container for documents.
///
/// `owner == None` marks the global workspace: publicly readable,
/// non-deletable, and closed to write-access grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub title: String,
    pub owner: Option<UserId>,
    pub is_public: bool,
    pub read_perm: PermissionId,
    pub write_perm: PermissionId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    pub fn new(
        title: impl Into<String>,
        owner: Option<UserId>,
        is_public: bool,
        read_perm: PermissionId,
        write_perm: PermissionId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: WorkspaceId::new(),
            title: title.into(),
            owner,
            is_public,
            read_perm,
            write_perm,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_global(&self) -> bool {
        self.owner.is_none()
    }
}

// =============================================================================
// Documents
// =============================================================================

/// The kinds of owned, optionally workspace-scoped resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Data,
    Template,
    Blob,
}

impl DocumentKind {
    /// Capability codename required to publish documents of this kind, or
    /// to keep editing one that already sits in a public workspace
    pub fn publish_codename(&self) -> &'static str {
        match self {
            Self::Data => "publish_data",
            Self::Template => "publish_template",
            Self::Blob => "publish_blob",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::Template => write!(f, "template"),
            Self::Blob => write!(f, "blob"),
        }
    }
}

/// An owned resource. `workspace == None` means private, owner-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub title: String,
    pub owner: UserId,
    pub workspace: Option<WorkspaceId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        kind: DocumentKind,
        title: impl Into<String>,
        owner: UserId,
        workspace: Option<WorkspaceId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            kind,
            title: title.into(),
            owner,
            workspace,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-user settings. Never workspace-scoped; strictly private to the owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub id: PreferencesId,
    pub owner: UserId,
    pub timezone: Option<String>,
    pub settings: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    pub fn new(owner: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: PreferencesId::new(),
            owner,
            timezone: None,
            settings: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Policy entry-point descriptors
// =============================================================================

/// What the caller wants to do, as seen by the policy engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Write,
    Delete,
    Publish,
    ChangeOwner,
    ManageAccess,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::Delete => write!(f, "delete"),
            Self::Publish => write!(f, "publish"),
            Self::ChangeOwner => write!(f, "change_owner"),
            Self::ManageAccess => write!(f, "manage_access"),
        }
    }
}

/// The resource a policy decision is about
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef<'a> {
    Document(&'a Document),
    Workspace(&'a Workspace),
    Preferences(&'a UserPreferences),
}

impl ResourceRef<'_> {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Document(d) => format!("{} {}", d.kind, d.id),
            Self::Workspace(w) => format!("workspace {}", w.id),
            Self::Preferences(p) => format!("preferences {}", p.id),
        }
    }
}
