use std::time::Duration;

use veil_tree::PermissionsTree;

/// Per-model configuration.
///
/// The default permissions are handed to every model explicitly; sources
/// receive them in [`ModelSource::update_permissions`] and may return them
/// as they are or derive contextual permissions from them.
///
/// [`ModelSource::update_permissions`]: crate::ModelSource::update_permissions
#[derive(Clone, Debug)]
pub struct ModelSettings {
    /// The permissions applied when the source has no better answer
    pub default_permissions: PermissionsTree,

    /// Optional limit on each call the model makes into its source
    pub timeout: Option<Duration>,
}

impl ModelSettings {
    /// Settings with the given default permissions and no timeout.
    pub fn new(default_permissions: PermissionsTree) -> Self {
        Self {
            default_permissions,
            timeout: None,
        }
    }

    /// Limit each source call to `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
