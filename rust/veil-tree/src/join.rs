use indexmap::IndexMap;

use crate::schema::check_keys;
use crate::{Field, FieldPath, MergedView, PermissionsTree, Tree, ValuesTree, VeilTreeError};

/// Joins a values tree with a permissions tree of identical shape into a
/// [`MergedView`].
///
/// The trees must carry the same keys at every level, and a leaf in one must
/// be a leaf in the other. The first divergence fails the join with
/// [`VeilTreeError::ShapeMismatch`] naming its path; nothing is filled in for
/// a missing key.
///
/// An array leaf receives a single [`RolePermissions`] for all of its
/// elements, even when those elements are objects.
///
/// [`RolePermissions`]: veil_permissions::RolePermissions
pub fn join(
    values: &ValuesTree,
    permissions: &PermissionsTree,
) -> Result<MergedView, VeilTreeError> {
    join_at(&FieldPath::root(), values, permissions)
}

fn join_at(
    path: &FieldPath,
    values: &ValuesTree,
    permissions: &PermissionsTree,
) -> Result<MergedView, VeilTreeError> {
    match (values, permissions) {
        (Tree::Leaf(value), Tree::Leaf(permissions)) => Ok(Tree::Leaf(Field {
            value: value.clone(),
            permissions: permissions.clone(),
        })),
        (Tree::Branch(values), Tree::Branch(permissions)) => {
            check_keys(
                path,
                values.keys(),
                |key| permissions.contains_key(key),
                "permissions",
            )?;
            check_keys(
                path,
                permissions.keys(),
                |key| values.contains_key(key),
                "values",
            )?;

            let mut joined = IndexMap::with_capacity(values.len());
            for (key, value) in values {
                let child_path = path.child(key);
                let permission = permissions.get(key).ok_or_else(|| {
                    VeilTreeError::mismatch(&child_path, "key is missing from the permissions")
                })?;
                joined.insert(key.clone(), join_at(&child_path, value, permission)?);
            }
            Ok(Tree::Branch(joined))
        }
        (Tree::Leaf(_), Tree::Branch(_)) => Err(VeilTreeError::mismatch(
            path,
            "values hold a leaf where permissions hold an object",
        )),
        (Tree::Branch(_), Tree::Leaf(_)) => Err(VeilTreeError::mismatch(
            path,
            "values hold an object where permissions hold a leaf",
        )),
    }
}
