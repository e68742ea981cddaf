//! Error types for registry operations
//!
//! Every failure in this crate is a local validation failure reported as a
//! typed value; nothing panics. Mutations are all-or-nothing per call: a
//! rejected permit/revoke leaves the grant table unchanged and a rejected
//! parent edge leaves the edge set unchanged.

use thiserror::Error;

/// Registry error types.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A permission with this ID is already registered
    #[error("permission {0} is already registered")]
    DuplicatePermission(String),

    /// A role with this ID is already registered
    #[error("role {0} is already registered")]
    DuplicateRole(String),

    /// No role with this ID exists
    #[error("role {0} is not registered")]
    RoleNotFound(String),

    /// The referenced permission is not in this registry's catalog
    #[error("permission {0} is not registered")]
    PermissionNotRegistered(String),

    /// The action is not in the permission's allowed set
    #[error("action {action} is not registered for permission {permission}")]
    UnknownAction {
        /// The rejected action tag
        action: String,
        /// The permission whose allowed set was consulted
        permission: String,
    },

    /// The parent edge already exists
    #[error("parent role {parent} is already defined for role {role}")]
    DuplicateParent {
        /// The child role
        role: String,
        /// The parent role
        parent: String,
    },

    /// The parent edge does not exist
    #[error("parent role {parent} is not defined for role {role}")]
    ParentNotFound {
        /// The child role
        role: String,
        /// The parent role
        parent: String,
    },

    /// Adding the edge would let a role reach itself through ancestry
    #[error("adding parent {parent} to role {role} would create a cycle")]
    CycleDetected {
        /// The child role
        role: String,
        /// The rejected parent role
        parent: String,
    },

    /// Snapshot encoding or decoding failed
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Reading or writing a snapshot stream failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    /// Get a stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::DuplicatePermission(_) => "DUPLICATE_PERMISSION",
            RegistryError::DuplicateRole(_) => "DUPLICATE_ROLE",
            RegistryError::RoleNotFound(_) => "ROLE_NOT_FOUND",
            RegistryError::PermissionNotRegistered(_) => "PERMISSION_NOT_REGISTERED",
            RegistryError::UnknownAction { .. } => "UNKNOWN_ACTION",
            RegistryError::DuplicateParent { .. } => "DUPLICATE_PARENT",
            RegistryError::ParentNotFound { .. } => "PARENT_NOT_FOUND",
            RegistryError::CycleDetected { .. } => "CYCLE_DETECTED",
            RegistryError::Snapshot(_) => "SNAPSHOT_ERROR",
            RegistryError::Io(_) => "IO_ERROR",
        }
    }
}
