use serde::{Deserialize, Serialize};
use serde_json::Value;
use veil_permissions::{Permission, PermissionSet, RolePermissions};

/// A leaf of a [`MergedView`](crate::MergedView): the raw value alongside the
/// permissions of every role.
///
/// This is server-side state and must be projected with
/// [`Field::sanitize`] before it is delivered anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// The raw value
    pub value: Value,
    /// The permissions of every role over this field
    pub permissions: RolePermissions,
}

impl Field {
    /// Projects this field for `role`. The value survives only when the role
    /// may read it. A role with no entry holds no permissions.
    pub fn sanitize(&self, role: &str) -> ViewField {
        let permissions = self.permissions.permissions_for(role);
        let value = if permissions.contains(Permission::Read) {
            self.value.clone()
        } else {
            Value::Null
        };
        ViewField { value, permissions }
    }
}

/// A leaf of a [`RoleView`](crate::RoleView): what one role may see of a
/// field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewField {
    /// The value, or null when the role may not read it
    pub value: Value,
    /// The permissions the role holds over this field
    pub permissions: PermissionSet,
}

impl ViewField {
    /// Returns `true` when the role may read this field.
    pub fn is_readable(&self) -> bool {
        self.permissions.contains(Permission::Read)
    }

    /// Returns `true` when the role may update this field.
    pub fn is_writable(&self) -> bool {
        self.permissions.contains(Permission::Update)
    }
}
