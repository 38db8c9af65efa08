use serde_json::Value;
use veil_tree::{RoleView, Schema};

use crate::{Endpoints, Patch, RestConfig, VeilModelError, rest::Transport};

/// The consumer side of a served model: requests the view of one role and
/// sends that role's patches.
///
/// Responses are parsed against the schema, so a view that does not have
/// the expected shape is reported as a failed request.
pub struct ModelClient<A> {
    schema: Schema,
    role: String,
    endpoints: Endpoints<A>,
    transport: Transport,
}

impl<A> ModelClient<A> {
    /// Create a client acting as `role`
    pub fn new(
        schema: Schema,
        role: impl Into<String>,
        endpoints: Endpoints<A>,
        config: RestConfig,
    ) -> Self {
        Self {
            schema,
            role: role.into(),
            endpoints,
            transport: Transport::new(config),
        }
    }

    /// The role this client acts as.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Request the current view.
    pub async fn request(&self, args: &A) -> Result<RoleView, VeilModelError> {
        let url = self.endpoints.get(args);
        let document = self.transport.get(&url, Some(&self.role)).await?;
        self.parse(url, &document)
    }

    /// Send `patch` and receive the view that results from it.
    pub async fn patch(&self, patch: &Patch, args: &A) -> Result<RoleView, VeilModelError> {
        let url = self.endpoints.patch(args);
        let document = self.transport.patch(&url, &self.role, patch).await?;
        self.parse(url, &document)
    }

    fn parse(&self, url: String, document: &Value) -> Result<RoleView, VeilModelError> {
        RoleView::from_json(&self.schema, document)
            .map_err(|error| VeilModelError::request(url, error))
    }
}

impl<A> Clone for ModelClient<A> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            role: self.role.clone(),
            endpoints: self.endpoints.clone(),
            transport: self.transport.clone(),
        }
    }
}
