#![warn(missing_docs)]

//! The model lifecycle behind Veil's per-role views.
//!
//! A [`Model`] is built per request or session around a [`ModelSource`],
//! which knows how to fetch a domain object and how to compute the
//! permissions of its fields. [`Model::init`] drives the model through
//!
//! ```text
//! Uninitialized → Fetching → ComputingPermissions → ViewBuilt
//! ```
//!
//! after which [`Model::sanitize`] projects the role-agnostic merged view
//! for any role, and [`Model::patch`] forwards updates the acting role is
//! allowed to make before returning a freshly rebuilt view.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//! use veil_model::{MemorySource, Model, ModelSettings};
//! use veil_tree::{Describe, PermissionsTree, Schema};
//!
//! #[derive(Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Person {
//!     first_name: String,
//!     age: u32,
//! }
//!
//! impl Describe for Person {
//!     fn schema() -> Schema {
//!         Schema::object([("firstName", Schema::Leaf), ("age", Schema::Leaf)])
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), veil_model::VeilModelError> {
//! let defaults = PermissionsTree::from_config(&Person::schema(), &json!({
//!     "firstName": { "Admin": "RU", "User": "R" },
//!     "age": { "Admin": "RU", "User": "" },
//! }))?;
//!
//! let source = MemorySource::new(&Person { first_name: "Bingus".into(), age: 21 })?;
//! let model = Model::new(source, ModelSettings::new(defaults))?;
//!
//! model.init(&()).await?;
//!
//! let view = model.sanitize("User")?;
//! assert_eq!(view.value_at("firstName"), Some(&json!("Bingus")));
//! assert_eq!(view.value_at("age"), Some(&json!(null)));
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::*;

mod status;
pub use status::*;

mod settings;
pub use settings::*;

mod patch;
pub use patch::*;

mod source;
pub use source::*;

mod model;
pub use model::*;

mod memory;
pub use memory::*;

mod rest;
pub use rest::*;

mod client;
pub use client::*;

#[cfg(feature = "server")]
pub mod server;
