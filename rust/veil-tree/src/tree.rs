use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::schema::check_keys;
use crate::{FieldPath, Schema, VeilTreeError};

/// A keyed tree whose leaves hold `L`.
///
/// A node is a [`Tree::Leaf`] when it is not a keyed mapping of further
/// nodes. Primitives, nulls, whole arrays and tagged field records are all
/// leaves. Every operation in this crate recurses through [`Tree::Branch`]
/// nodes and stops at leaves, so trees of the same shape are always walked
/// the same way.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree<L> {
    /// A terminal node
    Leaf(L),
    /// A keyed object of further nodes, in declaration order
    Branch(IndexMap<String, Tree<L>>),
}

impl<L> Tree<L> {
    /// Builds a branch from `(key, node)` pairs.
    pub fn branch<K, I>(children: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Tree<L>)>,
    {
        Tree::Branch(
            children
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
        )
    }

    /// Returns `true` if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    /// The leaf content, if this node is a leaf.
    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            Tree::Leaf(leaf) => Some(leaf),
            Tree::Branch(_) => None,
        }
    }

    /// The child named `key`, if this node is a branch that has one.
    pub fn child(&self, key: &str) -> Option<&Tree<L>> {
        match self {
            Tree::Branch(children) => children.get(key),
            Tree::Leaf(_) => None,
        }
    }

    /// The node at `path`.
    pub fn get(&self, path: impl Into<FieldPath>) -> Option<&Tree<L>> {
        let path = path.into();
        path.segments()
            .iter()
            .try_fold(self, |node, key| node.child(key))
    }

    /// The leaf content at `path`, if that node is a leaf.
    pub fn leaf_at(&self, path: impl Into<FieldPath>) -> Option<&L> {
        self.get(path).and_then(Tree::as_leaf)
    }

    /// Every leaf with its path, depth first in declaration order.
    pub fn leaves(&self) -> Vec<(FieldPath, &L)> {
        let mut leaves = Vec::new();
        self.collect_leaves(FieldPath::root(), &mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, path: FieldPath, leaves: &mut Vec<(FieldPath, &'a L)>) {
        match self {
            Tree::Leaf(leaf) => leaves.push((path, leaf)),
            Tree::Branch(children) => {
                for (key, child) in children {
                    child.collect_leaves(path.child(key), leaves);
                }
            }
        }
    }

    /// Builds a tree of the same shape whose leaves are produced by `map`.
    pub fn map_leaves<M, F>(&self, mut map: F) -> Tree<M>
    where
        F: FnMut(&FieldPath, &L) -> M,
    {
        self.map_at(&FieldPath::root(), &mut map)
    }

    fn map_at<M, F>(&self, path: &FieldPath, map: &mut F) -> Tree<M>
    where
        F: FnMut(&FieldPath, &L) -> M,
    {
        match self {
            Tree::Leaf(leaf) => Tree::Leaf(map(path, leaf)),
            Tree::Branch(children) => Tree::Branch(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.map_at(&path.child(key), map)))
                    .collect(),
            ),
        }
    }

    /// Checks that this tree has the shape described by `schema`.
    pub fn conforms_to(&self, schema: &Schema) -> Result<(), VeilTreeError> {
        self.conforms_at(&FieldPath::root(), schema)
    }

    fn conforms_at(&self, path: &FieldPath, schema: &Schema) -> Result<(), VeilTreeError> {
        match (self, schema) {
            (Tree::Leaf(_), Schema::Leaf | Schema::Array) => Ok(()),
            (Tree::Leaf(_), Schema::Object(_)) => Err(VeilTreeError::mismatch(
                path,
                "expected an object but found a leaf",
            )),
            (Tree::Branch(_), Schema::Leaf | Schema::Array) => Err(VeilTreeError::mismatch(
                path,
                "expected a leaf but found an object",
            )),
            (Tree::Branch(children), Schema::Object(fields)) => {
                check_keys(path, fields.keys(), |key| children.contains_key(key), "tree")?;
                check_keys(path, children.keys(), |key| fields.contains_key(key), "schema")?;
                for (key, child) in children {
                    if let Some(field) = fields.get(key) {
                        child.conforms_at(&path.child(key), field)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Parses a JSON document of the shape described by `schema`, producing
    /// each leaf with `leaf`.
    ///
    /// Objects in the document must carry exactly the keys of the schema;
    /// the first divergence is reported as a shape mismatch naming its path.
    pub fn parse<F>(schema: &Schema, document: &Value, mut leaf: F) -> Result<Self, VeilTreeError>
    where
        F: FnMut(&FieldPath, &Schema, &Value) -> Result<L, VeilTreeError>,
    {
        Self::parse_at(&FieldPath::root(), schema, document, &mut leaf)
    }

    fn parse_at<F>(
        path: &FieldPath,
        schema: &Schema,
        document: &Value,
        leaf: &mut F,
    ) -> Result<Self, VeilTreeError>
    where
        F: FnMut(&FieldPath, &Schema, &Value) -> Result<L, VeilTreeError>,
    {
        match schema {
            Schema::Leaf | Schema::Array => Ok(Tree::Leaf(leaf(path, schema, document)?)),
            Schema::Object(fields) => {
                let Value::Object(object) = document else {
                    return Err(VeilTreeError::mismatch(path, "expected an object"));
                };
                check_keys(path, object.keys(), |key| fields.contains_key(key), "schema")?;

                let mut children = IndexMap::with_capacity(fields.len());
                for (key, field) in fields {
                    let child_path = path.child(key);
                    let child = object.get(key).ok_or_else(|| {
                        VeilTreeError::mismatch(&child_path, "key is missing from the document")
                    })?;
                    children.insert(key.clone(), Self::parse_at(&child_path, field, child, leaf)?);
                }
                Ok(Tree::Branch(children))
            }
        }
    }
}

impl<L: Serialize> Tree<L> {
    /// Renders the tree as JSON, nesting branches as objects.
    pub fn to_json(&self) -> Result<Value, VeilTreeError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<L: Serialize> Serialize for Tree<L> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Tree::Leaf(leaf) => leaf.serialize(serializer),
            Tree::Branch(children) => serializer.collect_map(children),
        }
    }
}
