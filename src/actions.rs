//! # Actions
//!
//! Defines the action vocabulary for permissions. An action is an opaque
//! string tag; a small set of well-known tags is provided as constants and
//! callers can define their own.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// An operation that can be permitted on a resource.
///
/// Actions are flat string tags. The well-known tags cover the common cases
/// and anything else can be created with [`Action::new`]:
///
/// ```
/// use rolekit::Action;
///
/// let approve = Action::new("approve");
/// assert_eq!(approve.as_str(), "approve");
/// assert_eq!(Action::READ.as_str(), "read");
/// ```
///
/// Two tags are reserved:
/// - [`Action::CRUD`] is a composite standing for create+read+update+delete.
///   It is expanded wherever an action list enters the registry and is never
///   stored itself.
/// - [`Action::NONE`] (the empty tag) is a query wildcard meaning "any
///   action"; it is only meaningful to existence checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Action(Cow<'static, str>);

impl Action {
    /// The empty tag; query wildcard for "permission exists, any action".
    pub const NONE: Action = Action(Cow::Borrowed(""));

    /// Create new resource instances.
    pub const CREATE: Action = Action(Cow::Borrowed("create"));

    /// Read/view resource data.
    pub const READ: Action = Action(Cow::Borrowed("read"));

    /// Modify existing resource data.
    pub const UPDATE: Action = Action(Cow::Borrowed("update"));

    /// Remove resource instances.
    pub const DELETE: Action = Action(Cow::Borrowed("delete"));

    /// Composite tag for create+read+update+delete; expanded, never stored.
    pub const CRUD: Action = Action(Cow::Borrowed("crud"));

    /// Download/export resource data.
    pub const DOWNLOAD: Action = Action(Cow::Borrowed("download"));

    /// Upload/import data into a resource.
    pub const UPLOAD: Action = Action(Cow::Borrowed("upload"));

    /// The four base actions [`Action::CRUD`] expands to.
    pub const CRUD_ACTIONS: [Action; 4] =
        [Action::CREATE, Action::READ, Action::UPDATE, Action::DELETE];

    /// Create a caller-defined action tag.
    ///
    /// # Example
    ///
    /// ```
    /// use rolekit::Action;
    ///
    /// let approve = Action::new("approve");
    /// assert_ne!(approve, Action::READ);
    /// ```
    pub fn new(tag: impl Into<String>) -> Self {
        Action(Cow::Owned(tag.into()))
    }

    /// Get the string representation of the action.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this is the empty wildcard tag.
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether this is the reserved `crud` composite tag.
    pub fn is_crud(&self) -> bool {
        *self == Action::CRUD
    }

    /// Expand an action list, replacing every `crud` with the four base
    /// actions.
    ///
    /// The output preserves the order of the input; duplicates are kept
    /// (grant storage is a set, so they are harmless).
    ///
    /// # Example
    ///
    /// ```
    /// use rolekit::Action;
    ///
    /// let expanded = Action::expand(&[Action::CRUD, Action::new("approve")]);
    /// assert_eq!(expanded.len(), 5);
    /// assert!(expanded.contains(&Action::DELETE));
    /// assert!(!expanded.contains(&Action::CRUD));
    /// ```
    pub fn expand(actions: &[Action]) -> Vec<Action> {
        let mut out = Vec::with_capacity(actions.len());
        for action in actions {
            if action.is_crud() {
                out.extend(Action::CRUD_ACTIONS);
            } else {
                out.push(action.clone());
            }
        }
        out
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Action {
    fn from(tag: &str) -> Self {
        Action::new(tag)
    }
}

impl From<String> for Action {
    fn from(tag: String) -> Self {
        Action(Cow::Owned(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_tags() {
        assert_eq!(Action::CREATE.as_str(), "create");
        assert_eq!(Action::READ.as_str(), "read");
        assert_eq!(Action::UPDATE.as_str(), "update");
        assert_eq!(Action::DELETE.as_str(), "delete");
        assert_eq!(Action::DOWNLOAD.as_str(), "download");
        assert_eq!(Action::UPLOAD.as_str(), "upload");
        assert!(Action::NONE.is_none());
        assert!(Action::CRUD.is_crud());
    }

    #[test]
    fn test_custom_action_equality() {
        let approve = Action::new("approve");
        assert_eq!(approve, Action::from("approve"));
        assert_eq!(approve, Action::from("approve".to_string()));
        assert_ne!(approve, Action::READ);
    }

    #[test]
    fn test_crud_expansion() {
        let expanded = Action::expand(&[Action::CRUD]);
        assert_eq!(expanded, Action::CRUD_ACTIONS.to_vec());
    }

    #[test]
    fn test_expansion_preserves_other_tags() {
        let approve = Action::new("approve");
        let expanded = Action::expand(&[approve.clone(), Action::CRUD, Action::READ]);
        assert_eq!(expanded.len(), 6);
        assert_eq!(expanded[0], approve);
        assert_eq!(expanded[5], Action::READ);
        assert!(!expanded.contains(&Action::CRUD));
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Action::new("approve")).unwrap();
        assert_eq!(json, "\"approve\"");

        let action: Action = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(action, Action::DELETE);
    }
}
