//! # Registry
//!
//! The top-level facade coordinating the permission catalog and the role
//! graph: registration, grant and revocation, direct and inherited grant
//! queries, multi-role aggregation, and snapshot/restore.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::actions::Action;
use crate::diagnostics::{Diagnostic, DiagnosticsSink, NullSink};
use crate::error::{RegistryError, RegistryResult};
use crate::graph::RoleGraph;
use crate::permissions::{Permission, PermissionCatalog};
use crate::roles::Role;
use crate::snapshot::{RoleGrants, Snapshot};

/// In-process authorization registry.
///
/// Usage has two phases. During development the permission catalog is
/// populated: every resource is registered with the actions that are valid
/// for it. At runtime roles are registered, wired to parents, granted
/// actions, and queried on the hot path.
///
/// ```
/// use rolekit::{Action, Registry};
///
/// let registry = Registry::new();
///
/// // Development phase: declare the catalog.
/// let users = registry
///     .register_permission("users", "User resource", &[Action::CRUD])
///     .unwrap();
///
/// // Runtime phase: roles, edges, grants.
/// registry.register_role("admin", "Admin role").unwrap();
/// registry.permit("admin", &users, &[Action::CRUD]).unwrap();
///
/// assert!(registry.is_granted("admin", &users, &[Action::CREATE, Action::DELETE]));
/// assert!(!registry.is_granted("admin", &users, &[Action::new("approve")]));
/// ```
///
/// Every store inside the registry is independently synchronized; the
/// registry can be shared across threads behind an `Arc` with no external
/// locking.
pub struct Registry {
    catalog: PermissionCatalog,
    graph: RoleGraph,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("permissions", &self.catalog.len())
            .field("roles", &self.graph.len())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry that discards diagnostics.
    pub fn new() -> Self {
        Self::with_diagnostics(Arc::new(NullSink))
    }

    /// Create an empty registry with an explicit diagnostics sink.
    ///
    /// The sink receives structured events for registration conflicts,
    /// invalid actions, cycle rejections, and denied grant checks. It is
    /// shared with clones of this registry.
    pub fn with_diagnostics(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            catalog: PermissionCatalog::new(),
            graph: RoleGraph::new(),
            diagnostics: sink,
        }
    }

    fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.emit(&diagnostic);
    }

    /// The permission catalog.
    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// The role graph.
    pub fn graph(&self) -> &RoleGraph {
        &self.graph
    }

    // ------------------------------------------------------------------
    // Permission catalog
    // ------------------------------------------------------------------

    /// Define and register a permission with its allowed actions.
    ///
    /// `crud` in the action list expands to the four base actions. The
    /// allowed set is immutable after registration and permissions are never
    /// removed.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicatePermission`] if the ID is already taken.
    pub fn register_permission(
        &self,
        id: impl Into<String>,
        description: impl Into<String>,
        actions: &[Action],
    ) -> RegistryResult<Arc<Permission>> {
        let id = id.into();
        self.catalog.register(id.clone(), description, actions).map_err(|err| {
            self.emit(Diagnostic::DuplicatePermission { id });
            err
        })
    }

    /// Check whether a permission with this ID (and action) is defined.
    ///
    /// [`Action::NONE`] checks only that the ID exists.
    pub fn permission_exists(&self, id: &str, action: &Action) -> bool {
        self.catalog.exists(id, action)
    }

    /// Look up a permission by ID.
    pub fn permission(&self, id: &str) -> Option<Arc<Permission>> {
        self.catalog.get(id)
    }

    /// All registered permissions, unordered.
    pub fn permissions(&self) -> Vec<Arc<Permission>> {
        self.catalog.all()
    }

    // ------------------------------------------------------------------
    // Role graph
    // ------------------------------------------------------------------

    /// Define and register a role.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateRole`] if the ID is already taken.
    pub fn register_role(
        &self,
        id: impl Into<String>,
        description: impl Into<String>,
    ) -> RegistryResult<Arc<Role>> {
        let id = id.into();
        self.graph.register(id.clone(), description).map_err(|err| {
            self.emit(Diagnostic::DuplicateRole { id });
            err
        })
    }

    /// Look up a role by ID. Emits a diagnostic when the role is missing.
    pub fn role(&self, id: &str) -> Option<Arc<Role>> {
        let role = self.graph.get(id);
        if role.is_none() {
            self.emit(Diagnostic::RoleMissing { id: id.to_string() });
        }
        role
    }

    /// Check whether a role with this ID is registered.
    pub fn role_exists(&self, id: &str) -> bool {
        self.graph.contains(id)
    }

    /// All registered roles, unordered.
    pub fn roles(&self) -> Vec<Arc<Role>> {
        self.graph.all()
    }

    /// Delete a role and sever it as a parent from every remaining role.
    ///
    /// # Errors
    ///
    /// [`RegistryError::RoleNotFound`] if the ID is not registered.
    pub fn remove_role(&self, id: &str) -> RegistryResult<()> {
        self.graph.remove(id).map_err(|err| {
            self.emit(Diagnostic::RoleMissing { id: id.to_string() });
            err
        })
    }

    /// Add a direct parent edge from `child` to `parent`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::RoleNotFound`], [`RegistryError::DuplicateParent`],
    /// or [`RegistryError::CycleDetected`]; the child is left unchanged on
    /// any of them.
    pub fn add_parent(&self, child: &str, parent: &str) -> RegistryResult<()> {
        self.graph.add_parent(child, parent).map_err(|err| {
            self.emit(match &err {
                RegistryError::DuplicateParent { role, parent } => Diagnostic::DuplicateParent {
                    role: role.clone(),
                    parent: parent.clone(),
                },
                RegistryError::CycleDetected { role, parent } => Diagnostic::CycleRejected {
                    role: role.clone(),
                    parent: parent.clone(),
                },
                _ => Diagnostic::RoleMissing {
                    id: child.to_string(),
                },
            });
            err
        })
    }

    /// Remove the direct parent edge from `child` to `parent`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::RoleNotFound`] or [`RegistryError::ParentNotFound`].
    pub fn remove_parent(&self, child: &str, parent: &str) -> RegistryResult<()> {
        self.graph.remove_parent(child, parent).map_err(|err| {
            self.emit(match &err {
                RegistryError::ParentNotFound { role, parent } => Diagnostic::ParentMissing {
                    role: role.clone(),
                    parent: parent.clone(),
                },
                _ => Diagnostic::RoleMissing {
                    id: child.to_string(),
                },
            });
            err
        })
    }

    /// Check whether `ancestor` is reachable from `role` through parent
    /// edges. For the direct-edge check use [`Role::has_parent`].
    pub fn has_ancestor(&self, role: &str, ancestor: &str) -> bool {
        self.graph.has_ancestor(role, ancestor)
    }

    /// The direct parents of a role (not transitive).
    pub fn parents(&self, role: &str) -> Vec<Arc<Role>> {
        self.graph.parents(role)
    }

    // ------------------------------------------------------------------
    // Grant resolution
    // ------------------------------------------------------------------

    /// Grant actions on a permission to a role.
    ///
    /// `crud` in the action list expands first. Every action is validated
    /// against the catalog's allowed set for this permission before any flag
    /// is written; a rejected call has no partial effect.
    ///
    /// # Errors
    ///
    /// [`RegistryError::RoleNotFound`],
    /// [`RegistryError::PermissionNotRegistered`], or
    /// [`RegistryError::UnknownAction`].
    pub fn permit(
        &self,
        role_id: &str,
        permission: &Permission,
        actions: &[Action],
    ) -> RegistryResult<()> {
        self.permit_id(role_id, permission.id(), actions)
    }

    /// By-ID variant of [`permit`](Self::permit).
    pub fn permit_id(
        &self,
        role_id: &str,
        permission_id: &str,
        actions: &[Action],
    ) -> RegistryResult<()> {
        let actions = Action::expand(actions);
        let role = self.require_role(role_id)?;
        self.require_valid_actions(permission_id, &actions)?;
        role.grant(permission_id, &actions);
        Ok(())
    }

    /// Revoke actions on a permission from a role.
    ///
    /// Same validation as [`permit`](Self::permit). Flags are kept as
    /// explicit `false` entries unless no action remains granted for the
    /// permission, in which case the whole entry is dropped.
    ///
    /// # Errors
    ///
    /// Same set as [`permit`](Self::permit); a rejected call has no partial
    /// effect, even when nothing would change.
    pub fn revoke(
        &self,
        role_id: &str,
        permission: &Permission,
        actions: &[Action],
    ) -> RegistryResult<()> {
        self.revoke_id(role_id, permission.id(), actions)
    }

    /// By-ID variant of [`revoke`](Self::revoke).
    pub fn revoke_id(
        &self,
        role_id: &str,
        permission_id: &str,
        actions: &[Action],
    ) -> RegistryResult<()> {
        let actions = Action::expand(actions);
        let role = self.require_role(role_id)?;
        self.require_valid_actions(permission_id, &actions)?;
        if role.revoke(permission_id, &actions) {
            self.emit(Diagnostic::GrantTableCleaned {
                role: role_id.to_string(),
                permission: permission_id.to_string(),
            });
        }
        Ok(())
    }

    /// Check whether a role has all listed actions granted on a permission,
    /// directly or via a single direct parent.
    ///
    /// All requested actions must be satisfied within the same scope: the
    /// role's own grant table, or one direct parent's own table. Grants are
    /// not unioned across scopes, and grandparents are not consulted — for
    /// the full ancestor walk use
    /// [`is_grant_inherited`](Self::is_grant_inherited).
    ///
    /// Never fails: a missing role, unregistered permission, or invalid
    /// action yields `false` plus a diagnostic.
    pub fn is_granted(&self, role_id: &str, permission: &Permission, actions: &[Action]) -> bool {
        self.is_granted_id(role_id, permission.id(), actions)
    }

    /// By-ID variant of [`is_granted`](Self::is_granted).
    pub fn is_granted_id(&self, role_id: &str, permission_id: &str, actions: &[Action]) -> bool {
        let Some((role, actions)) = self.query_scope(role_id, permission_id, actions) else {
            return false;
        };
        if role.has_all(permission_id, &actions) {
            return true;
        }
        for parent in self.graph.parents(role_id) {
            if parent.has_all(permission_id, &actions) {
                return true;
            }
        }
        self.emit(Diagnostic::GrantDenied {
            role: role_id.to_string(),
            permission: permission_id.to_string(),
        });
        false
    }

    /// Like [`is_granted`](Self::is_granted), but the satisfying scope may
    /// be any node in the full ancestor closure (parents, grandparents, and
    /// so on).
    pub fn is_grant_inherited(
        &self,
        role_id: &str,
        permission: &Permission,
        actions: &[Action],
    ) -> bool {
        self.is_grant_inherited_id(role_id, permission.id(), actions)
    }

    /// By-ID variant of [`is_grant_inherited`](Self::is_grant_inherited).
    pub fn is_grant_inherited_id(
        &self,
        role_id: &str,
        permission_id: &str,
        actions: &[Action],
    ) -> bool {
        let Some((role, actions)) = self.query_scope(role_id, permission_id, actions) else {
            return false;
        };
        if role.has_all(permission_id, &actions) {
            return true;
        }
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack = role.parent_ids();
        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(ancestor) = self.graph.get(&id) {
                if ancestor.has_all(permission_id, &actions) {
                    return true;
                }
                stack.extend(ancestor.parent_ids());
            }
        }
        self.emit(Diagnostic::GrantDenied {
            role: role_id.to_string(),
            permission: permission_id.to_string(),
        });
        false
    }

    /// Check whether any of the roles has the grant
    /// (short-circuiting [`is_granted`](Self::is_granted)).
    pub fn any_granted(&self, role_ids: &[&str], permission: &Permission, actions: &[Action]) -> bool {
        role_ids
            .iter()
            .any(|role_id| self.is_granted(role_id, permission, actions))
    }

    /// Check whether every role has the grant
    /// (short-circuiting [`is_granted`](Self::is_granted);
    /// trivially true for an empty list).
    pub fn all_granted(&self, role_ids: &[&str], permission: &Permission, actions: &[Action]) -> bool {
        role_ids
            .iter()
            .all(|role_id| self.is_granted(role_id, permission, actions))
    }

    /// [`any_granted`](Self::any_granted) over the full ancestor closure.
    pub fn any_grant_inherited(
        &self,
        role_ids: &[&str],
        permission: &Permission,
        actions: &[Action],
    ) -> bool {
        role_ids
            .iter()
            .any(|role_id| self.is_grant_inherited(role_id, permission, actions))
    }

    /// [`all_granted`](Self::all_granted) over the full ancestor closure.
    pub fn all_grant_inherited(
        &self,
        role_ids: &[&str],
        permission: &Permission,
        actions: &[Action],
    ) -> bool {
        role_ids
            .iter()
            .all(|role_id| self.is_grant_inherited(role_id, permission, actions))
    }

    /// Flatten the granted permissions of the listed roles.
    ///
    /// For each role, its own grants and its direct parents' grants (not
    /// deeper ancestors) are merged; the result is one de-duplicated action
    /// set per permission ID, unioned across all requested roles. Missing
    /// roles contribute nothing beyond a diagnostic.
    pub fn all_permissions(&self, role_ids: &[&str]) -> HashMap<String, BTreeSet<Action>> {
        let mut merged: HashMap<String, BTreeSet<Action>> = HashMap::new();
        let mut absorb = |granted: std::collections::BTreeMap<String, BTreeSet<Action>>| {
            for (permission_id, actions) in granted {
                merged.entry(permission_id).or_default().extend(actions);
            }
        };
        for role_id in role_ids {
            let Some(role) = self.graph.get(role_id) else {
                self.emit(Diagnostic::RoleMissing {
                    id: role_id.to_string(),
                });
                continue;
            };
            absorb(role.granted());
            for parent in self.graph.parents(role_id) {
                absorb(parent.granted());
            }
        }
        merged
    }

    /// Look up the role and validate + expand the action list for a read
    /// query. `None` means the query is answered `false`; the relevant
    /// diagnostic has already been emitted.
    fn query_scope(
        &self,
        role_id: &str,
        permission_id: &str,
        actions: &[Action],
    ) -> Option<(Arc<Role>, Vec<Action>)> {
        let Some(role) = self.graph.get(role_id) else {
            self.emit(Diagnostic::RoleMissing {
                id: role_id.to_string(),
            });
            return None;
        };
        if !self.catalog.exists(permission_id, &Action::NONE) {
            self.emit(Diagnostic::PermissionMissing {
                id: permission_id.to_string(),
            });
            return None;
        }
        let actions = Action::expand(actions);
        for action in &actions {
            if !self.catalog.exists(permission_id, action) {
                self.emit(Diagnostic::UnknownAction {
                    action: action.as_str().to_string(),
                    permission: permission_id.to_string(),
                });
                return None;
            }
        }
        Some((role, actions))
    }

    fn require_role(&self, role_id: &str) -> RegistryResult<Arc<Role>> {
        self.graph.get(role_id).ok_or_else(|| {
            self.emit(Diagnostic::RoleMissing {
                id: role_id.to_string(),
            });
            RegistryError::RoleNotFound(role_id.to_string())
        })
    }

    /// Validate a mutation's action list against the catalog. The permission
    /// must be registered and every action must be in its allowed set.
    fn require_valid_actions(&self, permission_id: &str, actions: &[Action]) -> RegistryResult<()> {
        if !self.catalog.exists(permission_id, &Action::NONE) {
            self.emit(Diagnostic::PermissionMissing {
                id: permission_id.to_string(),
            });
            return Err(RegistryError::PermissionNotRegistered(
                permission_id.to_string(),
            ));
        }
        for action in actions {
            if !self.catalog.exists(permission_id, action) {
                self.emit(Diagnostic::UnknownAction {
                    action: action.as_str().to_string(),
                    permission: permission_id.to_string(),
                });
                return Err(RegistryError::UnknownAction {
                    action: action.as_str().to_string(),
                    permission: permission_id.to_string(),
                });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Snapshot / restore / clone
    // ------------------------------------------------------------------

    /// Produce the portable dump of the whole registry state.
    ///
    /// Permissions carry their full allowed-action sets; roles carry only
    /// currently-granted actions and direct parent IDs. Entries are sorted
    /// by ID so the output is deterministic.
    pub fn snapshot(&self) -> Snapshot {
        let mut permissions: Vec<Permission> = self
            .catalog
            .all()
            .iter()
            .map(|p| (**p).clone())
            .collect();
        permissions.sort_by(|a, b| a.id().cmp(b.id()));

        let mut roles: Vec<RoleGrants> = self
            .graph
            .all()
            .iter()
            .map(|role| RoleGrants {
                id: role.id().to_string(),
                description: role.description().to_string(),
                grants: role.granted(),
                parents: role.parent_ids(),
            })
            .collect();
        roles.sort_by(|a, b| a.id.cmp(&b.id));

        Snapshot { permissions, roles }
    }

    /// Encode the registry state as pretty-printed JSON bytes.
    pub fn serialize(&self) -> RegistryResult<Vec<u8>> {
        self.snapshot().to_json()
    }

    /// Replay a snapshot's roles, grants, and parent edges into this
    /// registry.
    ///
    /// Runs in two passes: first every role is registered and its grants are
    /// replayed (each referenced permission must already be in this
    /// registry's catalog), then every parent edge is re-established. The
    /// two passes exist because a role's parents may appear later in the
    /// role list.
    ///
    /// # Errors
    ///
    /// The first failing record aborts the operation and is named in the
    /// error; records applied before it remain. Colliding role IDs fail with
    /// [`RegistryError::DuplicateRole`].
    pub fn restore(&self, snapshot: &Snapshot) -> RegistryResult<()> {
        for record in &snapshot.roles {
            self.register_role(record.id.clone(), record.description.clone())?;
            for (permission_id, actions) in &record.grants {
                let actions: Vec<Action> = actions.iter().cloned().collect();
                self.permit_id(&record.id, permission_id, &actions)?;
            }
        }
        for record in &snapshot.roles {
            for parent in &record.parents {
                self.add_parent(&record.id, parent)?;
            }
        }
        Ok(())
    }

    /// Decode JSON bytes and [`restore`](Self::restore) them.
    pub fn deserialize(&self, bytes: &[u8]) -> RegistryResult<()> {
        self.restore(&Snapshot::from_json(bytes)?)
    }

    /// Write the registry state as JSON to a writer.
    pub fn save_json<W: Write>(&self, writer: &mut W) -> RegistryResult<()> {
        writer.write_all(&self.serialize()?)?;
        Ok(())
    }

    /// Read JSON from a reader and [`restore`](Self::restore) it.
    pub fn load_json<R: Read>(&self, reader: &mut R) -> RegistryResult<()> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.deserialize(&bytes)
    }

    /// Create a registry sharing this one's permission definitions.
    ///
    /// Permissions are immutable, so catalog entries are aliased, not
    /// copied. With `include_roles` the role entries are aliased as well
    /// (the clone then observes and affects the same grant tables). The
    /// diagnostics sink is shared either way.
    pub fn clone_with(&self, include_roles: bool) -> Registry {
        let clone = Registry::with_diagnostics(self.diagnostics.clone());
        for permission in self.catalog.all() {
            // Fresh maps never collide.
            let _ = clone.catalog.insert_shared(permission);
        }
        if include_roles {
            for role in self.graph.all() {
                let _ = clone.graph.insert_shared(role);
            }
        }
        clone
    }
}
