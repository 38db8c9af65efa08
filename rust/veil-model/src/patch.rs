use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use veil_tree::{FieldPath, Schema};

use crate::VeilModelError;

/// A partial values object: a proposed update to some fields of a domain
/// value, nested the same way the value is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(Map<String, Value>);

impl Patch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON document, which must be an object.
    pub fn from_json(document: Value) -> Result<Self, VeilModelError> {
        match document {
            Value::Object(fields) => Ok(Patch(fields)),
            _ => Err(VeilModelError::Validation {
                path: FieldPath::root(),
                reason: "a patch must be an object".into(),
            }),
        }
    }

    /// Sets the value at `path`, creating intermediate objects as needed.
    pub fn with(mut self, path: impl Into<FieldPath>, value: Value) -> Self {
        let path: FieldPath = path.into();
        insert_at(&mut self.0, path.segments(), value);
        self
    }

    /// Returns `true` when the patch touches no field.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The patch as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// The leaves of `schema` this patch touches, with their proposed values.
    ///
    /// Every key must name a field of the schema, and the proposed values
    /// must have the shape of the fields they replace. Objects may be
    /// patched partially.
    pub fn leaves(&self, schema: &Schema) -> Result<Vec<(FieldPath, &Value)>, VeilModelError> {
        let mut leaves = Vec::new();
        collect(&FieldPath::root(), schema, &self.0, &mut leaves)?;
        Ok(leaves)
    }

    /// Merges the patch into `document`. Nested objects are merged key by
    /// key; everything else is replaced.
    pub fn apply_to(&self, document: &mut Value) {
        merge(document, &self.0);
    }
}

fn collect<'a>(
    path: &FieldPath,
    schema: &Schema,
    fields: &'a Map<String, Value>,
    leaves: &mut Vec<(FieldPath, &'a Value)>,
) -> Result<(), VeilModelError> {
    for (key, value) in fields {
        let child = path.child(key);
        let Some(field) = schema.field(key) else {
            return Err(VeilModelError::Validation {
                path: child,
                reason: "no such field".into(),
            });
        };
        match (field, value) {
            (Schema::Object(_), Value::Object(nested)) => collect(&child, field, nested, leaves)?,
            (Schema::Object(_), _) => {
                return Err(VeilModelError::Validation {
                    path: child,
                    reason: "expected an object".into(),
                });
            }
            (Schema::Array, Value::Array(_) | Value::Null) => leaves.push((child, value)),
            (Schema::Array, _) => {
                return Err(VeilModelError::Validation {
                    path: child,
                    reason: "expected an array".into(),
                });
            }
            (Schema::Leaf, Value::Object(_) | Value::Array(_)) => {
                return Err(VeilModelError::Validation {
                    path: child,
                    reason: "expected a primitive value".into(),
                });
            }
            (Schema::Leaf, _) => leaves.push((child, value)),
        }
    }
    Ok(())
}

fn insert_at(fields: &mut Map<String, Value>, path: &[String], value: Value) {
    match path {
        [] => {}
        [last] => {
            fields.insert(last.clone(), value);
        }
        [key, rest @ ..] => {
            let entry = fields
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(next) = entry {
                insert_at(next, rest, value);
            }
        }
    }
}

fn merge(document: &mut Value, fields: &Map<String, Value>) {
    if !document.is_object() {
        *document = Value::Object(Map::new());
    }
    let Value::Object(target) = document else {
        return;
    };
    for (key, value) in fields {
        match (target.get_mut(key), value) {
            (Some(existing), Value::Object(nested)) if existing.is_object() => {
                merge(existing, nested)
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
