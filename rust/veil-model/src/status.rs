use std::fmt::{Display, Formatter};

/// Where a [`Model`](crate::Model) is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelStatus {
    /// Nothing has been built, or the last build was abandoned
    Uninitialized,
    /// Waiting on the source for the domain values
    Fetching,
    /// Waiting on the source for the field permissions
    ComputingPermissions,
    /// Values, permissions and the merged view are in place
    ViewBuilt,
}

impl Display for ModelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            ModelStatus::Uninitialized => "uninitialized",
            ModelStatus::Fetching => "fetching",
            ModelStatus::ComputingPermissions => "computing permissions",
            ModelStatus::ViewBuilt => "view built",
        };
        write!(f, "{status}")
    }
}
