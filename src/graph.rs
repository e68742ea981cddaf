//! # Role graph
//!
//! The arena owning every role, plus the parent-edge relation over them.
//! Parent edges form a directed acyclic graph; every edge mutation runs under
//! a single graph-wide lock so the cycle check is atomic and acyclicity is a
//! hard invariant, not a best-effort one.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{RegistryError, RegistryResult};
use crate::roles::Role;

/// Arena of roles keyed by ID, with the parent-edge DAG over them.
///
/// Role lookup and grant mutation are lock-free reads/writes on the
/// underlying concurrent map. Only parent-edge mutations (and role removal,
/// which severs edges) serialize on the internal edge lock; grant queries
/// never take it.
#[derive(Debug, Default)]
pub struct RoleGraph {
    roles: DashMap<String, Arc<Role>>,
    /// Guards all parent-edge mutations across the whole graph. The cycle
    /// check and the edge insert must be atomic with respect to a concurrent
    /// reverse edge.
    edge_lock: RwLock<()>,
}

impl RoleGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define and register a role.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateRole`] if the ID is already taken; the
    /// existing role is left untouched.
    pub fn register(
        &self,
        id: impl Into<String>,
        description: impl Into<String>,
    ) -> RegistryResult<Arc<Role>> {
        let id = id.into();
        let role = Arc::new(Role::new(id.clone(), description));
        self.insert_shared(role.clone())?;
        Ok(role)
    }

    /// Insert an already-built role, sharing the allocation.
    ///
    /// Same duplicate rule as [`register`](Self::register). The insert is
    /// atomic with the duplicate check, so racing registrations of one ID
    /// admit exactly one.
    pub(crate) fn insert_shared(&self, role: Arc<Role>) -> RegistryResult<()> {
        match self.roles.entry(role.id().to_string()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateRole(role.id().to_string())),
            Entry::Vacant(entry) => {
                entry.insert(role);
                Ok(())
            }
        }
    }

    /// Look up a role by ID.
    pub fn get(&self, id: &str) -> Option<Arc<Role>> {
        self.roles.get(id).map(|r| r.clone())
    }

    /// Check whether a role with this ID is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.roles.contains_key(id)
    }

    /// All registered roles, unordered.
    pub fn all(&self) -> Vec<Arc<Role>> {
        self.roles.iter().map(|r| r.clone()).collect()
    }

    /// Number of registered roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Check if no role is registered.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Delete a role and sever it as a parent from every remaining role.
    ///
    /// Roles that listed the removed role keep their other parents and their
    /// own grants.
    ///
    /// # Errors
    ///
    /// [`RegistryError::RoleNotFound`] if the ID is not registered.
    pub fn remove(&self, id: &str) -> RegistryResult<()> {
        let _guard = self.edge_lock.write();
        if self.roles.remove(id).is_none() {
            return Err(RegistryError::RoleNotFound(id.to_string()));
        }
        for role in self.roles.iter() {
            role.delete_parent(id);
        }
        Ok(())
    }

    /// Add a direct parent edge from `child` to `parent`.
    ///
    /// The edge is rejected, and the child left unchanged, when it already
    /// exists, when it is a self-edge, or when `child` is already reachable
    /// from `parent` through parent edges (the edge would close a cycle).
    ///
    /// # Errors
    ///
    /// [`RegistryError::RoleNotFound`], [`RegistryError::DuplicateParent`],
    /// or [`RegistryError::CycleDetected`].
    pub fn add_parent(&self, child: &str, parent: &str) -> RegistryResult<()> {
        let _guard = self.edge_lock.write();
        let child_role = self
            .get(child)
            .ok_or_else(|| RegistryError::RoleNotFound(child.to_string()))?;
        if !self.contains(parent) {
            return Err(RegistryError::RoleNotFound(parent.to_string()));
        }
        if child_role.has_parent(parent) {
            return Err(RegistryError::DuplicateParent {
                role: child.to_string(),
                parent: parent.to_string(),
            });
        }
        if child == parent || self.reachable(parent, child) {
            return Err(RegistryError::CycleDetected {
                role: child.to_string(),
                parent: parent.to_string(),
            });
        }
        child_role.insert_parent(parent);
        Ok(())
    }

    /// Remove the direct parent edge from `child` to `parent`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::RoleNotFound`] if `child` is not registered,
    /// [`RegistryError::ParentNotFound`] if the edge does not exist.
    pub fn remove_parent(&self, child: &str, parent: &str) -> RegistryResult<()> {
        let _guard = self.edge_lock.write();
        let child_role = self
            .get(child)
            .ok_or_else(|| RegistryError::RoleNotFound(child.to_string()))?;
        if !child_role.delete_parent(parent) {
            return Err(RegistryError::ParentNotFound {
                role: child.to_string(),
                parent: parent.to_string(),
            });
        }
        Ok(())
    }

    /// Check whether `ancestor` is reachable from `role` through parent
    /// edges (parents, grandparents, and so on).
    ///
    /// For the direct-edge check see [`Role::has_parent`].
    pub fn has_ancestor(&self, role: &str, ancestor: &str) -> bool {
        self.reachable(role, ancestor)
    }

    /// The direct parents of a role, resolved through the arena.
    pub fn parents(&self, role: &str) -> Vec<Arc<Role>> {
        match self.get(role) {
            Some(role) => role
                .parent_ids()
                .iter()
                .filter_map(|id| self.get(id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Depth-first walk of the parent-edge relation from `start`, looking
    /// for `target`. The visited set covers diamond-shaped ancestry.
    fn reachable(&self, start: &str, target: &str) -> bool {
        let Some(start_role) = self.get(start) else {
            return false;
        };
        let mut stack: Vec<String> = start_role.parent_ids();
        let mut visited: HashSet<String> = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(role) = self.get(&id) {
                stack.extend(role.parent_ids());
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> RoleGraph {
        // viewer <- admin <- sysadmin
        let graph = RoleGraph::new();
        graph.register("viewer", "Viewer role").unwrap();
        graph.register("admin", "Admin role").unwrap();
        graph.register("sysadmin", "System admin role").unwrap();
        graph.add_parent("admin", "viewer").unwrap();
        graph.add_parent("sysadmin", "admin").unwrap();
        graph
    }

    #[test]
    fn test_register_and_get() {
        let graph = RoleGraph::new();
        assert!(graph.get("admin").is_none());
        graph.register("admin", "Admin role").unwrap();
        assert_eq!(graph.get("admin").unwrap().description(), "Admin role");
        assert!(graph.contains("admin"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let graph = RoleGraph::new();
        graph.register("admin", "Admin role").unwrap();
        let err = graph.register("admin", "Other").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRole(ref id) if id == "admin"));
        // First registration survives.
        assert_eq!(graph.get("admin").unwrap().description(), "Admin role");
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let graph = chain();
        let err = graph.add_parent("sysadmin", "admin").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateParent { .. }));
    }

    #[test]
    fn test_missing_roles_rejected() {
        let graph = RoleGraph::new();
        graph.register("admin", "Admin role").unwrap();
        assert!(matches!(
            graph.add_parent("ghost", "admin"),
            Err(RegistryError::RoleNotFound(_))
        ));
        assert!(matches!(
            graph.add_parent("admin", "ghost"),
            Err(RegistryError::RoleNotFound(_))
        ));
        assert!(matches!(
            graph.remove("ghost"),
            Err(RegistryError::RoleNotFound(_))
        ));
    }

    #[test]
    fn test_reverse_edge_rejected_and_state_unchanged() {
        let graph = chain();
        let err = graph.add_parent("viewer", "sysadmin").unwrap_err();
        assert!(matches!(err, RegistryError::CycleDetected { .. }));
        assert!(graph.get("viewer").unwrap().parent_ids().is_empty());
    }

    #[test]
    fn test_self_edge_rejected() {
        let graph = RoleGraph::new();
        graph.register("admin", "Admin role").unwrap();
        let err = graph.add_parent("admin", "admin").unwrap_err();
        assert!(matches!(err, RegistryError::CycleDetected { .. }));
        assert!(graph.get("admin").unwrap().parent_ids().is_empty());
    }

    #[test]
    fn test_has_parent_is_direct_only() {
        let graph = chain();
        let admin = graph.get("admin").unwrap();
        let sysadmin = graph.get("sysadmin").unwrap();

        assert!(admin.has_parent("viewer"));
        assert!(graph.has_ancestor("admin", "viewer"));

        // Grandparent: reachable, but not a direct parent.
        assert!(!sysadmin.has_parent("viewer"));
        assert!(graph.has_ancestor("sysadmin", "viewer"));

        // Unrelated role is neither.
        graph.register("noparent", "Stand-alone role").unwrap();
        assert!(!sysadmin.has_parent("noparent"));
        assert!(!graph.has_ancestor("sysadmin", "noparent"));
    }

    #[test]
    fn test_diamond_ancestry() {
        let graph = RoleGraph::new();
        for id in ["base", "left", "right", "top"] {
            graph.register(id, "role").unwrap();
        }
        graph.add_parent("left", "base").unwrap();
        graph.add_parent("right", "base").unwrap();
        graph.add_parent("top", "left").unwrap();
        graph.add_parent("top", "right").unwrap();

        assert!(graph.has_ancestor("top", "base"));
        // Closing the diamond downward is still a cycle.
        assert!(matches!(
            graph.add_parent("base", "top"),
            Err(RegistryError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_remove_parent() {
        let graph = chain();
        graph.remove_parent("sysadmin", "admin").unwrap();
        assert!(!graph.get("sysadmin").unwrap().has_parent("admin"));

        let err = graph.remove_parent("sysadmin", "admin").unwrap_err();
        assert!(matches!(err, RegistryError::ParentNotFound { .. }));

        // Edge can be re-established after removal.
        graph.add_parent("sysadmin", "admin").unwrap();
        assert!(graph.get("sysadmin").unwrap().has_parent("admin"));
    }

    #[test]
    fn test_remove_role_severs_parent_edges() {
        let graph = chain();
        let admin = graph.get("admin").unwrap();
        assert!(admin.has_parent("viewer"));

        graph.remove("viewer").unwrap();

        assert!(graph.get("viewer").is_none());
        // The removed role, not the iterated one, is severed everywhere.
        assert!(!admin.has_parent("viewer"));
        assert!(!graph.has_ancestor("sysadmin", "viewer"));
        // Other parents and the rest of the chain survive.
        assert!(graph.get("sysadmin").unwrap().has_parent("admin"));
    }

    #[test]
    fn test_parents_resolves_through_arena() {
        let graph = chain();
        let parents = graph.parents("sysadmin");
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].id(), "admin");
        assert!(graph.parents("ghost").is_empty());
    }
}
