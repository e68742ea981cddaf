//! # Roles
//!
//! A role is a named principal-group holding its own grant table and a set of
//! parent-role edges. Parent edges are stored as role IDs and resolved
//! through the [`RoleGraph`](crate::RoleGraph) arena, never as direct
//! references, so the graph alone owns the roles.

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::actions::Action;

/// Per-permission action flags: `true` means granted, `false` means
/// explicitly revoked.
type ActionFlags = HashMap<Action, bool>;

/// A named principal-group with direct grants and parent-role edges.
///
/// The grant table and the parent-edge set are each independently
/// synchronized; a concurrent permit and revoke on different permissions of
/// the same role never block each other.
///
/// Grant and parent-edge mutation go through the
/// [`Registry`](crate::Registry), which validates actions against the
/// permission catalog and keeps the parent graph acyclic.
#[derive(Debug, Default)]
pub struct Role {
    id: String,
    description: String,
    /// Keyed by permission ID.
    grants: DashMap<String, ActionFlags>,
    /// Direct parent role IDs.
    parents: DashSet<String>,
}

impl Role {
    pub(crate) fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            grants: DashMap::new(),
            parents: DashSet::new(),
        }
    }

    /// The unique role identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set every listed action's flag to `true` for this permission,
    /// creating the per-permission entry on first grant.
    pub(crate) fn grant(&self, permission_id: &str, actions: &[Action]) {
        let mut flags = self
            .grants
            .entry(permission_id.to_string())
            .or_default();
        for action in actions {
            flags.insert(action.clone(), true);
        }
    }

    /// Set every listed action's flag to `false`. When no action remains
    /// `true`, the whole permission entry is dropped; returns `true` when
    /// that cleanup happened.
    pub(crate) fn revoke(&self, permission_id: &str, actions: &[Action]) -> bool {
        match self.grants.entry(permission_id.to_string()) {
            Entry::Occupied(mut entry) => {
                for action in actions {
                    entry.get_mut().insert(action.clone(), false);
                }
                if entry.get().values().any(|granted| *granted) {
                    false
                } else {
                    entry.remove();
                    true
                }
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Check this role's own grant table: every listed action must be
    /// currently `true` for the permission.
    pub(crate) fn has_all(&self, permission_id: &str, actions: &[Action]) -> bool {
        match self.grants.get(permission_id) {
            Some(flags) => actions
                .iter()
                .all(|action| flags.get(action).copied().unwrap_or(false)),
            None => false,
        }
    }

    /// Whether the role's own grant table has an entry for this permission.
    pub fn has_grant_entry(&self, permission_id: &str) -> bool {
        self.grants.contains_key(permission_id)
    }

    /// The role's own currently-granted actions, per permission ID.
    ///
    /// Only `true` flags are reported; explicitly revoked actions are
    /// indistinguishable from never-granted ones.
    pub fn granted(&self) -> BTreeMap<String, BTreeSet<Action>> {
        let mut out = BTreeMap::new();
        for entry in self.grants.iter() {
            let granted: BTreeSet<Action> = entry
                .value()
                .iter()
                .filter(|(_, on)| **on)
                .map(|(action, _)| action.clone())
                .collect();
            if !granted.is_empty() {
                out.insert(entry.key().clone(), granted);
            }
        }
        out
    }

    /// Direct parent role IDs, sorted.
    pub fn parent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.parents.iter().map(|id| id.clone()).collect();
        ids.sort();
        ids
    }

    /// Check for a direct parent edge with this ID. Direct only; for full
    /// reachability use [`RoleGraph::has_ancestor`](crate::RoleGraph::has_ancestor).
    pub fn has_parent(&self, parent_id: &str) -> bool {
        self.parents.contains(parent_id)
    }

    pub(crate) fn insert_parent(&self, parent_id: &str) {
        self.parents.insert(parent_id.to_string());
    }

    pub(crate) fn delete_parent(&self, parent_id: &str) -> bool {
        self.parents.remove(parent_id).is_some()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Role{{id: {}, description: {}}}", self.id, self.description)
    }
}
