//! # Permissions
//!
//! A permission names a resource and fixes, at registration time, the set of
//! actions that are meaningful for it. The catalog is the append-only
//! registry of permission definitions.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::actions::Action;
use crate::error::{RegistryError, RegistryResult};

/// A named resource plus the closed set of actions meaningful on it.
///
/// The allowed-action set is exactly the set supplied at creation (with
/// `crud` pre-expanded) and is immutable afterwards; there is no way to add
/// or remove allowed actions on a registered permission.
///
/// # Example
///
/// ```
/// use rolekit::{Action, Permission};
///
/// let users = Permission::new("users", "User resource", &[Action::CRUD]);
/// assert!(users.allows(&Action::DELETE));
/// assert!(!users.allows(&Action::new("approve")));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    id: String,
    description: String,
    actions: BTreeSet<Action>,
}

impl Permission {
    /// Create a permission definition.
    ///
    /// `crud` in the action list expands to the four base actions before
    /// being stored.
    pub fn new(id: impl Into<String>, description: impl Into<String>, actions: &[Action]) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            actions: Action::expand(actions).into_iter().collect(),
        }
    }

    /// The unique, caller-chosen identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The allowed-action set, sorted.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// The allowed-action tags as sorted strings.
    pub fn action_names(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.as_str().to_string()).collect()
    }

    /// Check whether an action is in the allowed set.
    ///
    /// [`Action::NONE`] is the wildcard: it is allowed by every permission.
    pub fn allows(&self, action: &Action) -> bool {
        action.is_none() || self.actions.contains(action)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permission{{id: {}, description: {}}}", self.id, self.description)
    }
}

/// Registry of permission definitions.
///
/// The catalog is an independently-synchronized map, safe for concurrent
/// registration and lookup. It is append-only: permissions are never removed
/// for the lifetime of the registry.
#[derive(Debug, Default)]
pub struct PermissionCatalog {
    permissions: DashMap<String, Arc<Permission>>,
}

impl PermissionCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define and register a permission.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicatePermission`] if the ID is already taken;
    /// the existing definition is left untouched.
    pub fn register(
        &self,
        id: impl Into<String>,
        description: impl Into<String>,
        actions: &[Action],
    ) -> RegistryResult<Arc<Permission>> {
        let id = id.into();
        let permission = Arc::new(Permission::new(id.clone(), description, actions));
        self.insert_shared(permission.clone())?;
        Ok(permission)
    }

    /// Insert an already-built permission, sharing the allocation.
    ///
    /// Same duplicate rule as [`register`](Self::register). The insert must
    /// be atomic with the duplicate check: two racing registrations of one
    /// ID admit exactly one.
    pub(crate) fn insert_shared(&self, permission: Arc<Permission>) -> RegistryResult<()> {
        match self.permissions.entry(permission.id().to_string()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicatePermission(
                permission.id().to_string(),
            )),
            Entry::Vacant(entry) => {
                entry.insert(permission);
                Ok(())
            }
        }
    }

    /// Check whether a permission with this ID (and action) is defined.
    ///
    /// [`Action::NONE`] checks only that the ID exists; any other action must
    /// also be in the permission's allowed set.
    pub fn exists(&self, id: &str, action: &Action) -> bool {
        match self.permissions.get(id) {
            Some(permission) => permission.allows(action),
            None => false,
        }
    }

    /// Look up a permission by ID.
    pub fn get(&self, id: &str) -> Option<Arc<Permission>> {
        self.permissions.get(id).map(|p| p.clone())
    }

    /// All registered permissions, unordered.
    pub fn all(&self) -> Vec<Arc<Permission>> {
        self.permissions.iter().map(|p| p.clone()).collect()
    }

    /// Number of registered permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if no permission is registered.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crud_expands_at_creation() {
        let perm = Permission::new("test", "Test", &[Action::CRUD]);
        assert_eq!(perm.actions().count(), 4);
        assert!(perm.allows(&Action::CREATE));
        assert!(perm.allows(&Action::READ));
        assert!(perm.allows(&Action::UPDATE));
        assert!(perm.allows(&Action::DELETE));
        // The composite itself is never stored.
        assert!(!perm.actions().any(|a| a.is_crud()));
    }

    #[test]
    fn test_allows_wildcard() {
        let perm = Permission::new("docs", "Documents", &[Action::READ]);
        assert!(perm.allows(&Action::NONE));
        assert!(perm.allows(&Action::READ));
        assert!(!perm.allows(&Action::DELETE));
    }

    #[test]
    fn test_action_names_sorted() {
        let perm = Permission::new("test", "Test", &[Action::CRUD]);
        assert_eq!(perm.action_names(), vec!["create", "delete", "read", "update"]);
    }

    #[test]
    fn test_display() {
        let perm = Permission::new("users", "User resource", &[Action::READ]);
        assert_eq!(
            perm.to_string(),
            "Permission{id: users, description: User resource}"
        );
    }

    #[test]
    fn test_register_and_exists() {
        let catalog = PermissionCatalog::new();
        let users = catalog
            .register("users", "User resource", &[Action::CRUD])
            .unwrap();

        assert!(catalog.exists(users.id(), &Action::NONE));
        for action in Action::CRUD_ACTIONS {
            assert!(catalog.exists(users.id(), &action));
        }
        assert!(!catalog.exists(users.id(), &Action::new("approve")));
        assert!(!catalog.exists("ghost", &Action::NONE));
    }

    #[test]
    fn test_duplicate_rejected_and_state_unchanged() {
        let catalog = PermissionCatalog::new();
        catalog
            .register("users", "User resource", &[Action::READ])
            .unwrap();

        let err = catalog
            .register("users", "Other description", &[Action::DELETE])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePermission(ref id) if id == "users"));

        // Original definition survives.
        let users = catalog.get("users").unwrap();
        assert_eq!(users.description(), "User resource");
        assert!(!users.allows(&Action::DELETE));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_all_lists_every_permission() {
        let catalog = PermissionCatalog::new();
        catalog.register("users", "Users", &[Action::CRUD]).unwrap();
        catalog
            .register("post", "Posts", &[Action::CRUD, Action::new("approve")])
            .unwrap();
        catalog.register("view", "View", &[Action::READ]).unwrap();
        assert_eq!(catalog.all().len(), 3);
        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_permission_json_shape() {
        let perm = Permission::new("users", "User resource", &[Action::CRUD]);
        let json = serde_json::to_value(&perm).unwrap();
        assert_eq!(json["id"], "users");
        assert_eq!(json["description"], "User resource");
        assert_eq!(
            json["actions"],
            serde_json::json!(["create", "delete", "read", "update"])
        );
    }
}
