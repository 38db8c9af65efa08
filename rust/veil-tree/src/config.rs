use serde_json::Value;
use veil_permissions::{
    Permission, PermissionSet, RolePermissions, VeilPermissionError, parse_shorthand,
};

use crate::{FieldPath, Schema, Tree, VeilTreeError};

impl Tree<RolePermissions> {
    /// Loads a permissions tree from a JSON config shaped like `schema`.
    ///
    /// Each leaf of the config maps role names to either a CRUD shorthand or
    /// a list of permission names:
    ///
    /// ```json
    /// {
    ///   "firstName": { "Admin": "CRUD", "User": ["Read"] },
    ///   "address": {
    ///     "street": { "Admin": "CRUD", "User": "" }
    ///   }
    /// }
    /// ```
    pub fn from_config(schema: &Schema, config: &Value) -> Result<Self, VeilTreeError> {
        Tree::parse(schema, config, |path, _, leaf| parse_role_permissions(path, leaf))
    }

    /// A permissions tree shaped like `schema` in which every field carries
    /// the same `permissions`.
    pub fn uniform(schema: &Schema, permissions: &RolePermissions) -> Self {
        match schema {
            Schema::Leaf | Schema::Array => Tree::Leaf(permissions.clone()),
            Schema::Object(fields) => Tree::Branch(
                fields
                    .iter()
                    .map(|(key, field)| (key.clone(), Self::uniform(field, permissions)))
                    .collect(),
            ),
        }
    }
}

fn parse_role_permissions(
    path: &FieldPath,
    leaf: &Value,
) -> Result<RolePermissions, VeilTreeError> {
    let Value::Object(roles) = leaf else {
        return Err(VeilTreeError::mismatch(
            path,
            "expected an object mapping roles to permissions",
        ));
    };

    let mut permissions = RolePermissions::new();
    for (role, spec) in roles {
        let set = parse_spec(path, role, spec)?;
        permissions.set(role.clone(), set);
    }
    Ok(permissions)
}

fn parse_spec(path: &FieldPath, role: &str, spec: &Value) -> Result<PermissionSet, VeilTreeError> {
    let invalid = |source| VeilTreeError::Validation {
        path: path.clone(),
        source,
    };

    match spec {
        Value::String(shorthand) => parse_shorthand(role, shorthand).map_err(invalid),
        Value::Array(names) => names
            .iter()
            .map(|name| {
                name.as_str()
                    .and_then(|name| name.parse::<Permission>().ok())
                    .ok_or_else(|| {
                        invalid(VeilPermissionError::UnknownPermission {
                            role: role.to_string(),
                            name: name
                                .as_str()
                                .map(str::to_string)
                                .unwrap_or_else(|| name.to_string()),
                        })
                    })
            })
            .collect(),
        _ => Err(VeilTreeError::mismatch(
            &path.child(role),
            "expected a shorthand string or a list of permission names",
        )),
    }
}
