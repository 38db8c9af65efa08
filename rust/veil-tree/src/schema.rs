use indexmap::IndexMap;
use serde_json::Value;

use crate::{FieldPath, VeilTreeError};

/// Describes the tree shape of a domain type.
///
/// Every tree built for the type (values, permissions, merged and role
/// views) has exactly this shape: one leaf per [`Schema::Leaf`] or
/// [`Schema::Array`], one branch per [`Schema::Object`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schema {
    /// A primitive value (string, number, boolean) or null
    Leaf,
    /// An array kept whole as a single leaf. Its elements share the
    /// permissions of the field, whether they are primitives or objects.
    Array,
    /// A keyed object whose fields are described in declaration order
    Object(IndexMap<String, Schema>),
}

impl Schema {
    /// Describes an object from `(key, schema)` pairs.
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        Schema::Object(
            fields
                .into_iter()
                .map(|(key, schema)| (key.into(), schema))
                .collect(),
        )
    }

    /// Returns `true` for nodes that become leaves in a tree.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Schema::Object(_))
    }

    /// The schema of the field `key`, when this node is an object.
    pub fn field(&self, key: &str) -> Option<&Schema> {
        match self {
            Schema::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    /// The schema of the node at `path`.
    pub fn at(&self, path: &FieldPath) -> Option<&Schema> {
        path.segments()
            .iter()
            .try_fold(self, |schema, key| schema.field(key))
    }

    /// The number of leaves in a tree of this shape.
    pub fn leaf_count(&self) -> usize {
        match self {
            Schema::Object(fields) => fields.values().map(Schema::leaf_count).sum(),
            _ => 1,
        }
    }

    /// Derives a schema from a sample JSON value. Objects become
    /// [`Schema::Object`], arrays [`Schema::Array`] and everything else
    /// [`Schema::Leaf`].
    pub fn infer(sample: &Value) -> Self {
        match sample {
            Value::Object(fields) => Schema::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), Schema::infer(value)))
                    .collect(),
            ),
            Value::Array(_) => Schema::Array,
            _ => Schema::Leaf,
        }
    }

    /// Checks that `value` has this shape.
    pub fn check(&self, value: &Value) -> Result<(), VeilTreeError> {
        self.check_at(&FieldPath::root(), value)
    }

    pub(crate) fn check_at(&self, path: &FieldPath, value: &Value) -> Result<(), VeilTreeError> {
        match (self, value) {
            (Schema::Leaf, Value::Object(_)) => Err(VeilTreeError::mismatch(
                path,
                "expected a primitive value but found an object",
            )),
            (Schema::Leaf, Value::Array(_)) => Err(VeilTreeError::mismatch(
                path,
                "expected a primitive value but found an array",
            )),
            (Schema::Leaf, _) => Ok(()),
            (Schema::Array, Value::Array(_) | Value::Null) => Ok(()),
            (Schema::Array, _) => Err(VeilTreeError::mismatch(path, "expected an array")),
            (Schema::Object(fields), Value::Object(object)) => {
                check_keys(path, fields.keys(), |key| object.contains_key(key), "values")?;
                check_keys(path, object.keys(), |key| fields.contains_key(key), "schema")?;
                for (key, schema) in fields {
                    if let Some(child) = object.get(key) {
                        schema.check_at(&path.child(key), child)?;
                    }
                }
                Ok(())
            }
            (Schema::Object(_), _) => Err(VeilTreeError::mismatch(path, "expected an object")),
        }
    }
}

/// Reports the first of `expected` keys for which `present` is false.
pub(crate) fn check_keys<'a>(
    path: &FieldPath,
    expected: impl Iterator<Item = &'a String>,
    present: impl Fn(&str) -> bool,
    missing_from: &str,
) -> Result<(), VeilTreeError> {
    for key in expected {
        if !present(key) {
            return Err(VeilTreeError::mismatch(
                &path.child(key),
                format!("key is missing from the {missing_from}"),
            ));
        }
    }
    Ok(())
}

/// Domain types that can describe their own [`Schema`].
///
/// ```rust
/// use veil_tree::{Describe, Schema};
///
/// struct Address {
///     street: String,
///     city: String,
/// }
///
/// impl Describe for Address {
///     fn schema() -> Schema {
///         Schema::object([("street", Schema::Leaf), ("city", Schema::Leaf)])
///     }
/// }
///
/// assert_eq!(Address::schema().leaf_count(), 2);
/// ```
pub trait Describe {
    /// The shape of this type's trees.
    fn schema() -> Schema;
}
