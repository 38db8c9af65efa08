use thiserror::Error;

/// Errors raised while declaring role permissions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VeilPermissionError {
    /// A CRUD shorthand contained a character that cannot appear at that
    /// position.
    #[error("Invalid shorthand \"{shorthand}\" for role \"{role}\": {reason} {character:?}")]
    Validation {
        /// The role the shorthand was declared for.
        role: String,
        /// The full shorthand as declared.
        shorthand: String,
        /// The offending character.
        character: char,
        /// Why the character was rejected.
        reason: &'static str,
    },

    /// An explicit permission list named something other than Create, Read,
    /// Update or Delete.
    #[error("Unknown permission \"{name}\" declared for role \"{role}\"")]
    UnknownPermission {
        /// The role the list was declared for.
        role: String,
        /// The unrecognized name.
        name: String,
    },
}

impl VeilPermissionError {
    /// The role whose declaration failed.
    pub fn role(&self) -> &str {
        match self {
            Self::Validation { role, .. } | Self::UnknownPermission { role, .. } => role,
        }
    }
}
