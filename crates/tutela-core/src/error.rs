//! Error types for the Tutela platform

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TutelaError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Permission denied: {action} on {resource}")]
    PermissionDenied { action: String, resource: String },

    #[error("Duplicate {entity_type}: {value}")]
    NotUnique { entity_type: String, value: String },

    #[error("Domain rule violation: {message}")]
    ModelViolation { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TutelaError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn permission_denied(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
            resource: resource.into(),
        }
    }

    pub fn not_unique(entity_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NotUnique {
            entity_type: entity_type.into(),
            value: value.into(),
        }
    }

    pub fn model_violation(message: impl Into<String>) -> Self {
        Self::ModelViolation {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::DatabaseError {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True if this is an authorization failure (the caller lacks rights),
    /// as opposed to a missing entity or a domain rule violation.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_not_unique(&self) -> bool {
        matches!(self, Self::NotUnique { .. })
    }

    pub fn is_model_violation(&self) -> bool {
        matches!(self, Self::ModelViolation { .. })
    }
}

impl From<config::ConfigError> for TutelaError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TutelaError>;
