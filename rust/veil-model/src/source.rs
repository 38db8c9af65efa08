use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use veil_tree::{Describe, FieldPath, PermissionsTree};

use crate::{Patch, VeilModelError};

/// A [ModelSource] is where a [`Model`](crate::Model) gets its domain value
/// and the permissions of that value's fields.
///
/// Only [ModelSource::fetch] is required. By default a source hands back
/// the default permissions it is given and refuses every patch.
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// The domain type this source produces
    type Value: Describe + Serialize + DeserializeOwned + Send + Sync;
    /// The per-request arguments (an id, a session, a query)
    type Args: Send + Sync;

    /// Retrieve the domain value described by `args`
    async fn fetch(&self, args: &Self::Args) -> Result<Self::Value, VeilModelError>;

    /// Compute the permissions of `values`. Implementations may inspect the
    /// values themselves, consult an external policy, or both.
    async fn update_permissions(
        &self,
        values: &Self::Value,
        args: &Self::Args,
        defaults: &PermissionsTree,
    ) -> Result<PermissionsTree, VeilModelError> {
        let _ = (values, args);
        Ok(defaults.clone())
    }

    /// Apply `patch` on behalf of `role`. The patch has already been
    /// checked against the schema and the role's Update permissions; the
    /// source may still refuse it with [VeilModelError::PatchRejected].
    async fn patch(
        &self,
        role: &str,
        patch: &Patch,
        args: &Self::Args,
    ) -> Result<(), VeilModelError> {
        let _ = (patch, args);
        Err(VeilModelError::rejected(
            FieldPath::root(),
            role,
            "source is read-only",
        ))
    }
}
