use thiserror::Error;
use veil_tree::{FieldPath, VeilTreeError};

use crate::ModelStatus;

/// A boxed error carried as the cause of a failed request.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by a [`Model`](crate::Model) and its collaborators.
#[derive(Debug, Error)]
pub enum VeilModelError {
    /// Values, permissions or a schema disagree in structure.
    #[error("Shape mismatch at {path}: {reason}")]
    ShapeMismatch {
        /// The first path at which the shapes diverge
        path: FieldPath,
        /// What was found there
        reason: String,
    },

    /// A view was requested before the model finished building one.
    #[error("Model accessed while {status}; it must be initialized first")]
    UninitializedAccess {
        /// The status the model was in
        status: ModelStatus,
    },

    /// A source could not be reached, answered with an error status, timed
    /// out, or returned a body that could not be parsed.
    #[error("Request to {endpoint} failed: {cause}")]
    Request {
        /// The endpoint (or source step) that failed
        endpoint: String,
        /// The underlying failure
        #[source]
        cause: BoxError,
    },

    /// A configuration or patch was malformed.
    #[error("Invalid value at {path}: {reason}")]
    Validation {
        /// The offending field
        path: FieldPath,
        /// What was wrong with it
        reason: String,
    },

    /// A proposed update was refused.
    #[error("Patch of {path} rejected for role \"{role}\": {reason}")]
    PatchRejected {
        /// The field that may not be updated
        path: FieldPath,
        /// The acting role
        role: String,
        /// Why the update was refused
        reason: String,
    },
}

impl VeilModelError {
    /// A request failure at `endpoint` caused by `cause`.
    pub fn request(endpoint: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        VeilModelError::Request {
            endpoint: endpoint.into(),
            cause: cause.into(),
        }
    }

    /// A patch refusal for `role` at `path`.
    pub fn rejected(path: FieldPath, role: &str, reason: impl Into<String>) -> Self {
        VeilModelError::PatchRejected {
            path,
            role: role.to_string(),
            reason: reason.into(),
        }
    }

    /// The field path this error refers to, if any.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::ShapeMismatch { path, .. }
            | Self::Validation { path, .. }
            | Self::PatchRejected { path, .. } => Some(path),
            Self::UninitializedAccess { .. } | Self::Request { .. } => None,
        }
    }
}

impl From<VeilTreeError> for VeilModelError {
    fn from(error: VeilTreeError) -> Self {
        match error {
            VeilTreeError::ShapeMismatch { path, reason } => {
                VeilModelError::ShapeMismatch { path, reason }
            }
            VeilTreeError::Validation { path, source } => VeilModelError::Validation {
                path,
                reason: source.to_string(),
            },
            VeilTreeError::Serialization(reason) => VeilModelError::Validation {
                path: FieldPath::root(),
                reason,
            },
        }
    }
}
