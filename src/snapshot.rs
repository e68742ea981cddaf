//! # Snapshot
//!
//! The portable serialized form of a registry: a full catalog dump plus one
//! [`RoleGrants`] view per role. Grants list only currently-granted actions;
//! parents are direct role IDs only. Ordered containers keep the document
//! deterministic.
//!
//! The document shape:
//!
//! ```json
//! {
//!   "permissions": [
//!     { "id": "users", "description": "User resource", "actions": ["create", "read"] }
//!   ],
//!   "roles": [
//!     {
//!       "id": "admin",
//!       "description": "Admin role",
//!       "grants": { "users": ["create", "read"] },
//!       "parents": ["viewer"]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::actions::Action;
use crate::error::RegistryResult;
use crate::permissions::Permission;

/// The serialized view of one role: identity, currently-granted actions per
/// permission ID, and direct parent IDs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleGrants {
    /// The role ID.
    pub id: String,
    /// The role description.
    pub description: String,
    /// Permission ID to currently-granted actions. Revoked actions are not
    /// emitted.
    #[serde(default)]
    pub grants: BTreeMap<String, BTreeSet<Action>>,
    /// Direct parent role IDs.
    #[serde(default)]
    pub parents: Vec<String>,
}

/// A complete portable dump of a registry's state.
///
/// Produced by [`Registry::snapshot`](crate::Registry::snapshot) and consumed
/// by [`Registry::restore`](crate::Registry::restore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Every registered permission with its full allowed-action set.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// One grants view per role.
    #[serde(default)]
    pub roles: Vec<RoleGrants>,
}

impl Snapshot {
    /// Encode as pretty-printed JSON bytes.
    pub fn to_json(&self) -> RegistryResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decode from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> RegistryResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
