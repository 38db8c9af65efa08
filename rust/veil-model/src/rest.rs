use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use veil_tree::{Describe, FieldPath};

use crate::{ModelSource, Patch, VeilModelError};

/// Authentication method for upstream requests
#[derive(Clone, Debug, Default)]
pub enum AuthMethod {
    /// No authentication
    #[default]
    None,

    /// Bearer token authentication
    ///
    /// Includes `Authorization: Bearer {token}` header in all requests
    Bearer(String),
}

/// Configuration shared by [RestSource] and
/// [`ModelClient`](crate::ModelClient)
#[derive(Clone, Debug)]
pub struct RestConfig {
    /// Authentication method
    pub auth_method: AuthMethod,

    /// Optional timeout for requests in seconds (default: 30)
    pub timeout_seconds: Option<u64>,

    /// Optional custom headers to send with each request
    pub headers: Vec<(String, String)>,

    /// The header that carries the acting role (default: `x-veil-role`)
    pub role_header: String,
}

/// The role header used when none is configured.
pub const DEFAULT_ROLE_HEADER: &str = "x-veil-role";

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            auth_method: AuthMethod::None,
            timeout_seconds: Some(30),
            headers: Vec::new(),
            role_header: DEFAULT_ROLE_HEADER.to_string(),
        }
    }
}

impl RestConfig {
    /// Create a new REST configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the authentication method
    pub fn with_auth(mut self, auth_method: AuthMethod) -> Self {
        self.auth_method = auth_method;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Set the header that carries the acting role
    pub fn with_role_header(mut self, name: impl Into<String>) -> Self {
        self.role_header = name.into();
        self
    }
}

type Resolver<A> = Arc<dyn Fn(&A) -> String + Send + Sync>;

/// Resolves the URLs to GET and PATCH from the arguments of a request.
pub struct Endpoints<A> {
    get: Resolver<A>,
    patch: Resolver<A>,
}

impl<A> Endpoints<A> {
    /// Separate resolvers for reads and updates.
    pub fn new<G, P>(get: G, patch: P) -> Self
    where
        G: Fn(&A) -> String + Send + Sync + 'static,
        P: Fn(&A) -> String + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            patch: Arc::new(patch),
        }
    }

    /// One resolver for both reads and updates.
    pub fn uniform<R>(resolve: R) -> Self
    where
        R: Fn(&A) -> String + Send + Sync + 'static,
    {
        let resolve: Resolver<A> = Arc::new(resolve);
        Self {
            get: resolve.clone(),
            patch: resolve,
        }
    }

    /// The URL to read from.
    pub fn get(&self, args: &A) -> String {
        (self.get)(args)
    }

    /// The URL to send patches to.
    pub fn patch(&self, args: &A) -> String {
        (self.patch)(args)
    }
}

impl<A> Clone for Endpoints<A> {
    fn clone(&self) -> Self {
        Self {
            get: self.get.clone(),
            patch: self.patch.clone(),
        }
    }
}

/// An HTTP response with a status outside of 2xx.
#[derive(Debug, Error)]
#[error("HTTP {status} - {reason}")]
pub struct HttpStatusError {
    /// The status code
    pub status: u16,
    /// The canonical reason for the status
    pub reason: String,
}

impl From<StatusCode> for HttpStatusError {
    fn from(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

/// The reqwest client and the configuration applied to each request.
#[derive(Clone)]
pub(crate) struct Transport {
    config: RestConfig,
    client: Client,
}

impl Transport {
    pub(crate) fn new(config: RestConfig) -> Self {
        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout_seconds {
            client_builder = client_builder.timeout(std::time::Duration::from_secs(timeout));
        }

        let client = client_builder.build().unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    /// Build a request with authentication, custom headers and the role
    fn build_request(&self, builder: RequestBuilder, role: Option<&str>) -> RequestBuilder {
        let mut builder = builder;

        match &self.config.auth_method {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                builder = builder.bearer_auth(token);
            }
        }

        for (key, value) in &self.config.headers {
            builder = builder.header(key, value);
        }

        if let Some(role) = role {
            builder = builder.header(&self.config.role_header, role);
        }

        builder
    }

    pub(crate) async fn get(&self, url: &str, role: Option<&str>) -> Result<Value, VeilModelError> {
        tracing::debug!(url, "GET");
        let response = self
            .build_request(self.client.get(url), role)
            .send()
            .await
            .map_err(|error| VeilModelError::request(url, error))?;

        read_json(url, response).await
    }

    pub(crate) async fn patch(
        &self,
        url: &str,
        role: &str,
        patch: &Patch,
    ) -> Result<Value, VeilModelError> {
        tracing::debug!(url, role, "PATCH");
        let response = self
            .build_request(self.client.patch(url), Some(role))
            .json(patch)
            .send()
            .await
            .map_err(|error| VeilModelError::request(url, error))?;

        if response.status() == StatusCode::FORBIDDEN {
            let (path, reason) = rejection(response).await;
            return Err(VeilModelError::rejected(path, role, reason));
        }

        read_json(url, response).await
    }
}

async fn read_json(url: &str, response: Response) -> Result<Value, VeilModelError> {
    let status = response.status();
    if !status.is_success() {
        return Err(VeilModelError::request(url, HttpStatusError::from(status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|error| VeilModelError::request(url, error))?;

    if bytes.is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&bytes).map_err(|error| VeilModelError::request(url, error))
}

/// The `error` of a JSON error body, or the canonical reason of the status.
/// The refused path and reason carried by a 403 body of the form
/// `{ "error": "...", "path": ["address", "city"] }`. Either part may be
/// missing, in which case the root and the canonical status text stand in.
async fn rejection(response: Response) -> (FieldPath, String) {
    let fallback = HttpStatusError::from(response.status()).to_string();
    let Ok(Value::Object(body)) = response.json::<Value>().await else {
        return (FieldPath::root(), fallback);
    };

    let path = body
        .get("path")
        .and_then(Value::as_array)
        .map(|segments| {
            segments
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_else(FieldPath::root);
    let reason = body
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or(fallback);

    (path, reason)
}

/// A [ModelSource] backed by an upstream REST API.
///
/// GET requests return the domain value as JSON. Patches are forwarded as
/// PATCH requests carrying the partial object and the acting role; a 403
/// from upstream refuses the patch.
pub struct RestSource<T, A> {
    endpoints: Endpoints<A>,
    transport: Transport,
    kind: PhantomData<fn(&A) -> T>,
}

impl<T, A> RestSource<T, A> {
    /// Create a new REST source
    pub fn new(endpoints: Endpoints<A>, config: RestConfig) -> Self {
        Self {
            endpoints,
            transport: Transport::new(config),
            kind: PhantomData,
        }
    }
}

impl<T, A> Clone for RestSource<T, A> {
    fn clone(&self) -> Self {
        Self {
            endpoints: self.endpoints.clone(),
            transport: self.transport.clone(),
            kind: PhantomData,
        }
    }
}

#[async_trait]
impl<T, A> ModelSource for RestSource<T, A>
where
    T: Describe + Serialize + DeserializeOwned + Send + Sync,
    A: Send + Sync,
{
    type Value = T;
    type Args = A;

    async fn fetch(&self, args: &A) -> Result<T, VeilModelError> {
        let url = self.endpoints.get(args);
        let document = self.transport.get(&url, None).await?;
        serde_json::from_value(document).map_err(|error| VeilModelError::request(url, error))
    }

    async fn patch(&self, role: &str, patch: &Patch, args: &A) -> Result<(), VeilModelError> {
        let url = self.endpoints.patch(args);
        self.transport.patch(&url, role, patch).await?;
        Ok(())
    }
}
