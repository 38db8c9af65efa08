#![warn(missing_docs)]

//! Field permission vocabulary for Veil.
//!
//! Every leaf of a Veil data tree carries a [`RolePermissions`] mapping that
//! says which [`Permission`]s each role holds over that field. Mappings are
//! declared as `(role, spec)` pairs, where the spec is either an explicit list
//! or a compact CRUD shorthand:
//!
//! ```rust
//! use veil_permissions::{Permission, create_role_permissions};
//!
//! # fn main() -> Result<(), veil_permissions::VeilPermissionError> {
//! let permissions = create_role_permissions([
//!     ("Admin", "CRUD".into()),
//!     ("User", vec![Permission::Read].into()),
//! ])?;
//!
//! assert!(permissions.permissions_for("Admin").contains(Permission::Delete));
//! assert_eq!(permissions.permissions_for("User").to_vec(), vec![Permission::Read]);
//!
//! // Roles that were never declared hold nothing
//! assert!(permissions.permissions_for("Guest").is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! Declarations for the same role do not accumulate: the last declaration
//! for a role replaces any earlier one.

mod error;
pub use error::*;

mod permission;
pub use permission::*;

mod shorthand;
pub use shorthand::*;

mod role;
pub use role::*;
