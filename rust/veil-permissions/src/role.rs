use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Permission, PermissionSet, VeilPermissionError, parse_shorthand};

/// How a set of permissions is declared for a role.
///
/// Deserializes from either a shorthand string (`"RU"`) or a list of
/// permission names (`["Read", "Update"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionSpec {
    /// A CRUD shorthand such as `"CRUD"` or `"R"`
    Shorthand(String),
    /// An explicit list of permissions
    List(Vec<Permission>),
}

impl PermissionSpec {
    /// Resolves the spec into a set, validating shorthand on behalf of `role`.
    pub fn resolve(&self, role: &str) -> Result<PermissionSet, VeilPermissionError> {
        match self {
            PermissionSpec::Shorthand(shorthand) => parse_shorthand(role, shorthand),
            PermissionSpec::List(permissions) => Ok(permissions.iter().copied().collect()),
        }
    }
}

impl From<&str> for PermissionSpec {
    fn from(shorthand: &str) -> Self {
        PermissionSpec::Shorthand(shorthand.to_string())
    }
}

impl From<String> for PermissionSpec {
    fn from(shorthand: String) -> Self {
        PermissionSpec::Shorthand(shorthand)
    }
}

impl From<Vec<Permission>> for PermissionSpec {
    fn from(permissions: Vec<Permission>) -> Self {
        PermissionSpec::List(permissions)
    }
}

impl From<&[Permission]> for PermissionSpec {
    fn from(permissions: &[Permission]) -> Self {
        PermissionSpec::List(permissions.to_vec())
    }
}

impl<const N: usize> From<[Permission; N]> for PermissionSpec {
    fn from(permissions: [Permission; N]) -> Self {
        PermissionSpec::List(permissions.to_vec())
    }
}

impl From<PermissionSet> for PermissionSpec {
    fn from(set: PermissionSet) -> Self {
        PermissionSpec::List(set.to_vec())
    }
}

/// The permissions each role holds over a single field.
///
/// A role that has no entry holds nothing; looking it up is never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RolePermissions(BTreeMap<String, PermissionSet>);

impl RolePermissions {
    /// An empty mapping, under which every role is denied everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// The permissions held by `role`, or the empty set when the role has
    /// no entry.
    pub fn permissions_for(&self, role: &str) -> PermissionSet {
        self.0.get(role).copied().unwrap_or_default()
    }

    /// The entry for `role`, if one was declared.
    pub fn get(&self, role: &str) -> Option<&PermissionSet> {
        self.0.get(role)
    }

    /// Replaces the entry for `role`.
    pub fn set(&mut self, role: impl Into<String>, permissions: PermissionSet) {
        self.0.insert(role.into(), permissions);
    }

    /// Resolves `spec` and replaces the entry for `role` with it.
    pub fn declare(
        &mut self,
        role: impl Into<String>,
        spec: &PermissionSpec,
    ) -> Result<(), VeilPermissionError> {
        let role = role.into();
        let permissions = spec.resolve(&role)?;
        self.set(role, permissions);
        Ok(())
    }

    /// Applies every entry of `other` on top of this mapping. Roles present in
    /// both take the permissions from `other`.
    pub fn merge(&mut self, other: &RolePermissions) {
        for (role, permissions) in other.iter() {
            self.set(role, *permissions);
        }
    }

    /// Returns `true` if `role` holds at least one of `permissions`.
    pub fn has_any(&self, role: &str, permissions: impl IntoIterator<Item = Permission>) -> bool {
        self.permissions_for(role).has_any(permissions)
    }

    /// The declared roles, sorted by name.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates `(role, permissions)` entries sorted by role name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PermissionSet)> {
        self.0.iter().map(|(role, permissions)| (role.as_str(), permissions))
    }

    /// The number of declared roles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no role was declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<R> FromIterator<(R, PermissionSet)> for RolePermissions
where
    R: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (R, PermissionSet)>>(iter: I) -> Self {
        let mut permissions = RolePermissions::new();
        for (role, set) in iter {
            permissions.set(role, set);
        }
        permissions
    }
}

/// Builds a [`RolePermissions`] from `(role, spec)` declarations.
///
/// Declarations are applied in order, and a later declaration for a role
/// replaces the earlier one outright rather than adding to it.
///
/// ```rust
/// use veil_permissions::{Permission, create_role_permissions};
///
/// let permissions = create_role_permissions([
///     ("A", "CRUD".into()),
///     ("A", "R".into()),
/// ]).unwrap();
///
/// assert_eq!(permissions.permissions_for("A").to_vec(), vec![Permission::Read]);
/// ```
pub fn create_role_permissions<I, R>(
    declarations: I,
) -> Result<RolePermissions, VeilPermissionError>
where
    I: IntoIterator<Item = (R, PermissionSpec)>,
    R: Into<String>,
{
    let mut permissions = RolePermissions::new();
    for (role, spec) in declarations {
        permissions.declare(role, &spec)?;
    }
    Ok(permissions)
}
