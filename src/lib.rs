//! # rolekit
//!
//! Embeddable role and permission registry with role inheritance.
//!
//! ## Overview
//!
//! This crate is an in-process authorization registry. A host application
//! declares a catalog of permissions (resources and the actions valid on
//! them), organizes roles into an inheritance graph, grants or revokes
//! actions on permissions to roles, and asks "is action A on permission P
//! allowed for role R, directly or via ancestry?" at request time.
//!
//! It is a library, not a service: there is no network layer and no storage
//! engine, only a JSON snapshot of the in-memory state for callers that want
//! to persist or ship it.
//!
//! ## Architecture
//!
//! ```text
//! Registry
//! ├── PermissionCatalog     append-only: ID -> Permission (allowed actions)
//! └── RoleGraph             arena: ID -> Role, parent edges form a DAG
//!     └── Role              grant table (permission -> action flags)
//!                           + direct parent-role IDs
//! ```
//!
//! Every store is independently synchronized, so a `Registry` behind an
//! `Arc` can be mutated and queried from many threads without external
//! locking. Parent-edge mutations serialize on one graph-wide lock, which
//! makes the cycle check atomic: the parent graph is acyclic, always.
//!
//! ## Usage
//!
//! Usage has two phases. During development, register a permission for each
//! resource with the actions valid on it:
//!
//! ```
//! use rolekit::{Action, Registry};
//!
//! let registry = Registry::new();
//!
//! // Action::CRUD expands to create+read+update+delete.
//! let users = registry
//!     .register_permission("users", "User resource", &[Action::CRUD])
//!     .unwrap();
//!
//! // Caller-defined tags extend the vocabulary.
//! let approve = Action::new("approve");
//! let posts = registry
//!     .register_permission("posts", "Post resource", &[Action::CRUD, approve.clone()])
//!     .unwrap();
//!
//! // At runtime, define roles, wire inheritance, and grant actions.
//! registry.register_role("viewer", "Viewer role").unwrap();
//! registry.register_role("admin", "Admin role").unwrap();
//! registry.add_parent("admin", "viewer").unwrap();
//! registry.permit("viewer", &posts, &[Action::READ]).unwrap();
//! registry.permit("admin", &users, &[Action::CRUD]).unwrap();
//!
//! // Hot path: grant checks, directly or through parents.
//! assert!(registry.is_granted("admin", &users, &[Action::DELETE]));
//! assert!(registry.is_granted("admin", &posts, &[Action::READ]));
//! assert!(!registry.is_granted("viewer", &users, &[Action::READ]));
//!
//! // Aggregate over a caller's role list.
//! assert!(registry.any_granted(&["viewer", "admin"], &users, &[Action::CREATE]));
//! assert!(!registry.all_granted(&["viewer", "admin"], &users, &[Action::CREATE]));
//! ```
//!
//! Granting an action a permission never declared is always rejected:
//!
//! ```
//! use rolekit::{Action, Registry, RegistryError};
//!
//! let registry = Registry::new();
//! let users = registry
//!     .register_permission("users", "User resource", &[Action::CRUD])
//!     .unwrap();
//! registry.register_role("admin", "Admin role").unwrap();
//!
//! let err = registry
//!     .permit("admin", &users, &[Action::new("approve")])
//!     .unwrap_err();
//! assert!(matches!(err, RegistryError::UnknownAction { .. }));
//! ```
//!
//! ## Snapshot and restore
//!
//! [`Registry::serialize`] produces a JSON document with the full catalog
//! and, per role, the currently-granted actions and direct parent IDs.
//! [`Registry::deserialize`] replays it into a registry whose catalog
//! already contains the referenced permissions — typically a
//! [`Registry::clone_with`] of the original:
//!
//! ```
//! # use rolekit::{Action, Registry};
//! # let registry = Registry::new();
//! # let users = registry
//! #     .register_permission("users", "User resource", &[Action::CRUD])
//! #     .unwrap();
//! # registry.register_role("admin", "Admin role").unwrap();
//! # registry.permit("admin", &users, &[Action::CRUD]).unwrap();
//! let bytes = registry.serialize().unwrap();
//!
//! let replica = registry.clone_with(false);
//! replica.deserialize(&bytes).unwrap();
//! assert!(replica.is_granted("admin", &users, &[Action::DELETE]));
//! ```
//!
//! ## Diagnostics
//!
//! Read queries never fail: missing roles, unknown actions, and denied
//! checks come back as `false` and are reported as structured
//! [`Diagnostic`] events to the sink passed at construction
//! ([`NullSink`] by default, [`TracingSink`] to forward to `tracing`).
//! There is no process-wide logger.

pub mod actions;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod permissions;
pub mod registry;
pub mod roles;
pub mod snapshot;

// Re-export main types for convenience
pub use actions::Action;
pub use diagnostics::{Diagnostic, DiagnosticsSink, NullSink, TracingSink};
pub use error::{RegistryError, RegistryResult};
pub use graph::RoleGraph;
pub use permissions::{Permission, PermissionCatalog};
pub use registry::Registry;
pub use roles::Role;
pub use snapshot::{RoleGrants, Snapshot};
