//! Deployment configuration for the access-control layer
//!
//! Flags are read once at startup and treated as fixed for the process
//! lifetime.

use crate::error::Result;
use serde::Deserialize;

/// Sort applied to document list queries when the caller does not specify one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    TitleAsc,
}

/// Process-wide access-control switches
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Whether public data may be turned private again. When off, public
    /// workspaces cannot be deleted or privatized and documents cannot be
    /// moved out of a public workspace into a private one.
    #[serde(default = "default_true")]
    pub can_set_public_data_to_private: bool,

    /// Whether anonymous callers may read documents in public workspaces
    #[serde(default)]
    pub can_anonymous_access_public_document: bool,

    /// Whether workspaces may be made public at all
    #[serde(default = "default_true")]
    pub can_set_workspace_public: bool,

    /// Re-verify whole result lists after the query rewrite. The rewrite is
    /// the correctness guarantee; this pass is defense in depth.
    #[serde(default)]
    pub verify_document_access: bool,

    #[serde(default)]
    pub default_order: DocumentOrder,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            can_set_public_data_to_private: true,
            can_anonymous_access_public_document: false,
            can_set_workspace_public: true,
            verify_document_access: false,
            default_order: DocumentOrder::NewestFirst,
        }
    }
}

fn default_true() -> bool {
    true
}

impl AccessConfig {
    /// Load from the environment with `TUTELA`-prefixed overrides, e.g.
    /// `TUTELA__CAN_SET_WORKSPACE_PUBLIC=false`
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .set_default("can_set_public_data_to_private", true)?
            .set_default("can_set_workspace_public", true)?
            .add_source(config::Environment::with_prefix("TUTELA").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
