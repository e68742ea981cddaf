//! Diagnostics boundary
//!
//! The registry reports notable events (registration conflicts, invalid
//! actions, cycle rejections, grant-table cleanup) to a caller-supplied sink
//! instead of a process-wide logger. The sink is injected at construction and
//! shared by clones; there is no global state.
//!
//! [`NullSink`] discards everything and is the default. [`TracingSink`]
//! forwards events to the `tracing` dispatcher.

use std::fmt;

/// A structured event the registry wants to surface.
///
/// Events mirror the failure kinds of [`RegistryError`](crate::RegistryError)
/// plus a few debug-level notifications with no error counterpart (cleanup,
/// denied grant checks). Read queries never fail; they emit one of these and
/// return false/empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A permission registration collided with an existing ID.
    DuplicatePermission {
        /// The colliding permission ID
        id: String,
    },

    /// A role registration collided with an existing ID.
    DuplicateRole {
        /// The colliding role ID
        id: String,
    },

    /// An operation referenced a role that is not registered.
    RoleMissing {
        /// The missing role ID
        id: String,
    },

    /// An operation referenced a permission that is not in the catalog.
    PermissionMissing {
        /// The missing permission ID
        id: String,
    },

    /// An action outside the permission's allowed set was requested.
    UnknownAction {
        /// The rejected action tag
        action: String,
        /// The permission whose allowed set was consulted
        permission: String,
    },

    /// A parent edge was rejected because it already exists.
    DuplicateParent {
        /// The child role
        role: String,
        /// The parent role
        parent: String,
    },

    /// A parent-edge removal referenced an edge that does not exist.
    ParentMissing {
        /// The child role
        role: String,
        /// The parent role
        parent: String,
    },

    /// A parent edge was rejected because it would create a cycle.
    CycleRejected {
        /// The child role
        role: String,
        /// The rejected parent role
        parent: String,
    },

    /// A grant check did not find the requested actions in any scope.
    GrantDenied {
        /// The role that was checked
        role: String,
        /// The permission that was checked
        permission: String,
    },

    /// Every action flag for a permission went false, so the entry was
    /// dropped from the role's grant table.
    GrantTableCleaned {
        /// The role whose table was cleaned
        role: String,
        /// The permission entry that was dropped
        permission: String,
    },
}

impl Diagnostic {
    /// Whether this event reflects a rejected mutation (as opposed to a
    /// debug-level notification).
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Diagnostic::GrantDenied { .. } | Diagnostic::GrantTableCleaned { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicatePermission { id } => {
                write!(f, "permission {id} is already registered")
            }
            Diagnostic::DuplicateRole { id } => write!(f, "role {id} is already registered"),
            Diagnostic::RoleMissing { id } => write!(f, "role {id} is not registered"),
            Diagnostic::PermissionMissing { id } => {
                write!(f, "permission {id} is not registered")
            }
            Diagnostic::UnknownAction { action, permission } => {
                write!(f, "action {action} is not registered for permission {permission}")
            }
            Diagnostic::DuplicateParent { role, parent } => {
                write!(f, "parent role {parent} is already defined for role {role}")
            }
            Diagnostic::ParentMissing { role, parent } => {
                write!(f, "parent role {parent} is not defined for role {role}")
            }
            Diagnostic::CycleRejected { role, parent } => {
                write!(f, "adding parent {parent} to role {role} would create a cycle")
            }
            Diagnostic::GrantDenied { role, permission } => {
                write!(f, "permission {permission} is not granted to role {role}")
            }
            Diagnostic::GrantTableCleaned { role, permission } => {
                write!(
                    f,
                    "dropping permission {permission} from role {role}, no granted action left"
                )
            }
        }
    }
}

/// Destination for registry diagnostics.
///
/// Implementations must be cheap: sinks are called synchronously on the
/// query path.
pub trait DiagnosticsSink: Send + Sync {
    /// Receive one event.
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Sink that discards all events. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _diagnostic: &Diagnostic) {}
}

/// Sink that forwards events to the `tracing` dispatcher.
///
/// Rejected mutations are emitted at error level, debug-level notifications
/// at debug level, with the event text as the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        if diagnostic.is_error() {
            tracing::error!(event = ?diagnostic, "{diagnostic}");
        } else {
            tracing::debug!(event = ?diagnostic, "{diagnostic}");
        }
    }
}
