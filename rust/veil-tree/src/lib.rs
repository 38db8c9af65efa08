#![warn(missing_docs)]

//! Value trees, permission trees and the views built from them.
//!
//! A domain type is described by a [`Schema`]: a recursive descriptor whose
//! nodes are [`Schema::Leaf`], [`Schema::Array`] (an array kept whole as a
//! single leaf) or [`Schema::Object`]. Every tree in this crate is a
//! [`Tree`] of that shape, differing only in what its leaves hold:
//!
//! | Alias               | Leaf                          |
//! |---------------------|-------------------------------|
//! | [`ValuesTree`]      | the raw JSON value            |
//! | [`PermissionsTree`] | a [`RolePermissions`] mapping |
//! | [`MergedView`]      | a [`Field`] (value + mapping) |
//! | [`RoleView`]        | a [`ViewField`] for one role  |
//!
//! [`join`] pairs a values tree with a permissions tree of the same shape,
//! and [`sanitize`] projects the result down to a single role:
//!
//! ```rust
//! use serde_json::json;
//! use veil_tree::{PermissionsTree, Schema, ValuesTree, join, sanitize};
//!
//! # fn main() -> Result<(), veil_tree::VeilTreeError> {
//! let schema = Schema::object([("firstName", Schema::Leaf), ("age", Schema::Leaf)]);
//!
//! let values = ValuesTree::from_json(&schema, &json!({ "firstName": "Bingus", "age": 21 }))?;
//! let permissions = PermissionsTree::from_config(&schema, &json!({
//!     "firstName": { "Admin": "RU", "User": "R" },
//!     "age": { "Admin": "RU", "User": "" },
//! }))?;
//!
//! let view = join(&values, &permissions)?;
//!
//! assert_eq!(
//!     serde_json::to_value(sanitize(&view, "User")).unwrap(),
//!     json!({
//!         "firstName": { "value": "Bingus", "permissions": ["Read"] },
//!         "age": { "value": null, "permissions": [] },
//!     })
//! );
//! # Ok(())
//! # }
//! ```
//!
//! [`RolePermissions`]: veil_permissions::RolePermissions

mod error;
pub use error::*;

mod path;
pub use path::*;

mod schema;
pub use schema::*;

mod tree;
pub use tree::*;

mod field;
pub use field::*;

mod values;
pub use values::*;

mod config;
pub use config::*;

mod join;
pub use join::*;

mod sanitize;
pub use sanitize::*;
