use thiserror::Error;
use veil_permissions::VeilPermissionError;

use crate::FieldPath;

/// Errors raised while building or combining trees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VeilTreeError {
    /// Two trees (or a tree and its schema) disagree in structure.
    #[error("Shape mismatch at {path}: {reason}")]
    ShapeMismatch {
        /// The first path at which the shapes diverge.
        path: FieldPath,
        /// What was found there.
        reason: String,
    },

    /// A permission declaration in a permissions config was malformed.
    #[error("Invalid permissions at {path}: {source}")]
    Validation {
        /// The field whose declaration failed.
        path: FieldPath,
        /// The underlying declaration error.
        #[source]
        source: VeilPermissionError,
    },

    /// A domain value could not be converted to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VeilTreeError {
    pub(crate) fn mismatch(path: &FieldPath, reason: impl Into<String>) -> Self {
        VeilTreeError::ShapeMismatch {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// The path this error refers to, if any.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::ShapeMismatch { path, .. } | Self::Validation { path, .. } => Some(path),
            Self::Serialization(_) => None,
        }
    }
}

impl From<serde_json::Error> for VeilTreeError {
    fn from(error: serde_json::Error) -> Self {
        VeilTreeError::Serialization(error.to_string())
    }
}
