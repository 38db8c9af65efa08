use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use veil_permissions::RolePermissions;

use crate::{Field, FieldPath, Schema, Tree, VeilTreeError, ViewField};

/// The raw values of a domain object, one JSON value per leaf.
pub type ValuesTree = Tree<Value>;

/// The permissions of a domain object, one [`RolePermissions`] per leaf.
pub type PermissionsTree = Tree<RolePermissions>;

/// The role-agnostic view: every leaf pairs a value with the permissions of
/// all roles. Shareable across roles, never deliverable as is.
pub type MergedView = Tree<Field>;

/// The view of a single role, with unreadable values nulled.
pub type RoleView = Tree<ViewField>;

impl Tree<Value> {
    /// Parses the JSON form of a domain object, checking it against
    /// `schema`.
    pub fn from_json(schema: &Schema, document: &Value) -> Result<Self, VeilTreeError> {
        Tree::parse(schema, document, |path, schema, value| {
            schema.check_at(path, value)?;
            Ok(value.clone())
        })
    }

    /// Converts a domain object into a values tree.
    pub fn from_value<T: Serialize>(schema: &Schema, value: &T) -> Result<Self, VeilTreeError> {
        Self::from_json(schema, &serde_json::to_value(value)?)
    }

    /// Converts the tree back into a domain object.
    pub fn into_value<T: DeserializeOwned>(&self) -> Result<T, VeilTreeError> {
        Ok(serde_json::from_value(self.to_json()?)?)
    }
}

impl Tree<Field> {
    /// The values component of every leaf.
    pub fn values(&self) -> ValuesTree {
        self.map_leaves(|_, field| field.value.clone())
    }

    /// The permissions component of every leaf.
    pub fn permissions(&self) -> PermissionsTree {
        self.map_leaves(|_, field| field.permissions.clone())
    }

    /// Parses a serialized merged view against `schema`.
    pub fn from_json(schema: &Schema, document: &Value) -> Result<Self, VeilTreeError> {
        Tree::parse(schema, document, parse_record)
    }
}

impl Tree<ViewField> {
    /// Parses a serialized role view against `schema`.
    pub fn from_json(schema: &Schema, document: &Value) -> Result<Self, VeilTreeError> {
        Tree::parse(schema, document, parse_record)
    }

    /// The visible value of every leaf, with nulls where the role may not
    /// read.
    pub fn values(&self) -> ValuesTree {
        self.map_leaves(|_, field| field.value.clone())
    }

    /// The visible value at `path`.
    pub fn value_at(&self, path: impl Into<FieldPath>) -> Option<&Value> {
        self.leaf_at(path).map(|field| &field.value)
    }
}

fn parse_record<R: DeserializeOwned>(
    path: &FieldPath,
    _schema: &Schema,
    document: &Value,
) -> Result<R, VeilTreeError> {
    serde_json::from_value(document.clone()).map_err(|error| {
        VeilTreeError::mismatch(
            path,
            format!("expected a {{value, permissions}} record: {error}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;
    use veil_permissions::{Permission, PermissionSet};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i64,
        label: Option<String>,
    }

    fn point_schema() -> Schema {
        Schema::object([("x", Schema::Leaf), ("label", Schema::Leaf)])
    }

    #[test]
    fn it_converts_domain_values_both_ways() -> Result<()> {
        let point = Point {
            x: 4,
            label: None,
        };
        let tree = ValuesTree::from_value(&point_schema(), &point)?;

        assert_eq!(tree.leaf_at("x"), Some(&json!(4)));
        assert_eq!(tree.leaf_at("label"), Some(&Value::Null));
        assert_eq!(tree.into_value::<Point>()?, point);
        Ok(())
    }

    #[test]
    fn it_parses_role_views() -> Result<()> {
        let document = json!({
            "x": { "value": 4, "permissions": ["Read", "Update"] },
            "label": { "value": null, "permissions": [] },
        });
        let view = RoleView::from_json(&point_schema(), &document)?;

        assert_eq!(view.value_at("x"), Some(&json!(4)));
        assert_eq!(
            view.leaf_at("x").map(|field| field.permissions),
            Some(PermissionSet::from([Permission::Read, Permission::Update]))
        );
        assert_eq!(view.to_json()?, document);
        Ok(())
    }

    #[test]
    fn it_rejects_untagged_role_view_leaves() {
        let document = json!({ "x": 4, "label": { "value": null, "permissions": [] } });
        let error = RoleView::from_json(&point_schema(), &document).unwrap_err();

        assert_eq!(error.path(), Some(&FieldPath::from("x")));
    }
}
