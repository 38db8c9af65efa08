use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One of the four operations a role may perform on a field.
///
/// Variants are ordered `Create < Read < Update < Delete`, which is the order
/// every permission list is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// May supply a value where none exists
    Create,
    /// May observe the value
    Read,
    /// May replace the value
    Update,
    /// May remove the value
    Delete,
}

impl Permission {
    /// All permissions in canonical order.
    pub const ALL: [Permission; 4] = [
        Permission::Create,
        Permission::Read,
        Permission::Update,
        Permission::Delete,
    ];

    /// The shorthand character for this permission.
    pub fn symbol(self) -> char {
        match self {
            Permission::Create => 'C',
            Permission::Read => 'R',
            Permission::Update => 'U',
            Permission::Delete => 'D',
        }
    }

    /// The permission named by a shorthand character, if any.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'C' => Some(Permission::Create),
            'R' => Some(Permission::Read),
            'U' => Some(Permission::Update),
            'D' => Some(Permission::Delete),
            _ => None,
        }
    }

    /// The full name, as used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Permission::Create => "Create",
            Permission::Read => "Read",
            Permission::Update => "Update",
            Permission::Delete => "Delete",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|permission| permission.name() == name)
            .ok_or_else(|| name.to_string())
    }
}

/// A set of [`Permission`]s.
///
/// Duplicates collapse and iteration always follows canonical order, so two
/// sets declared in a different order compare equal and serialize the same.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PermissionSet(u8);

impl PermissionSet {
    /// The set holding no permissions.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The set holding every permission.
    pub const fn all() -> Self {
        Self(0b1111)
    }

    /// Returns `true` if `permission` is in the set.
    pub fn contains(&self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// Returns `true` when at least one of `permissions` is in the set.
    pub fn has_any(&self, permissions: impl IntoIterator<Item = Permission>) -> bool {
        permissions
            .into_iter()
            .any(|permission| self.contains(permission))
    }

    /// Returns `true` when every one of `permissions` is in the set.
    pub fn has_all(&self, permissions: impl IntoIterator<Item = Permission>) -> bool {
        permissions
            .into_iter()
            .all(|permission| self.contains(permission))
    }

    /// Adds `permission` to the set.
    pub fn insert(&mut self, permission: Permission) {
        self.0 |= permission.bit();
    }

    /// Removes `permission` from the set.
    pub fn remove(&mut self, permission: Permission) {
        self.0 &= !permission.bit();
    }

    /// Returns `true` if the set holds no permissions.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The number of permissions in the set.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the set in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::ALL
            .into_iter()
            .filter(|permission| self.contains(*permission))
    }

    /// The permissions as a list in canonical order.
    pub fn to_vec(&self) -> Vec<Permission> {
        self.iter().collect()
    }

    /// Renders the set as a CRUD shorthand (e.g. `"RU"`).
    pub fn to_shorthand(&self) -> String {
        self.iter().map(Permission::symbol).collect()
    }
}

impl std::fmt::Debug for PermissionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = PermissionSet::empty();
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}

impl From<Permission> for PermissionSet {
    fn from(permission: Permission) -> Self {
        Self(permission.bit())
    }
}

impl<const N: usize> From<[Permission; N]> for PermissionSet {
    fn from(permissions: [Permission; N]) -> Self {
        permissions.into_iter().collect()
    }
}

impl Serialize for PermissionSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let permissions = Vec::<Permission>::deserialize(deserializer)?;
        Ok(permissions.into_iter().collect())
    }
}
