//! Serves the sanitized views of a [ModelSource] over HTTP.
//!
//! The router answers `GET /` with the view of the acting role and
//! `PATCH /` with the view that results from applying the request body on
//! that role's behalf. Request arguments are read from the query string and
//! the role from a header (by default [`DEFAULT_ROLE_HEADER`]). Every request
//! builds its own [Model].

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use veil_tree::RoleView;

use crate::{DEFAULT_ROLE_HEADER, Model, ModelSettings, ModelSource, Patch, VeilModelError};

struct Served<S> {
    source: S,
    settings: ModelSettings,
    role_header: String,
}

impl<S> Served<S>
where
    S: ModelSource + Clone,
{
    fn role(&self, headers: &HeaderMap) -> Result<String, ServeError> {
        headers
            .get(self.role_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ServeError::MissingRole(self.role_header.clone()))
    }

    fn model(&self) -> Result<Model<S>, ServeError> {
        Ok(Model::new(self.source.clone(), self.settings.clone())?)
    }
}

/// A router serving `source` with the default role header.
pub fn router<S>(source: S, settings: ModelSettings) -> Router
where
    S: ModelSource + Clone + 'static,
    S::Args: DeserializeOwned + 'static,
{
    router_with_role_header(source, settings, DEFAULT_ROLE_HEADER)
}

/// A router serving `source` that reads the acting role from `role_header`.
pub fn router_with_role_header<S>(
    source: S,
    settings: ModelSettings,
    role_header: impl Into<String>,
) -> Router
where
    S: ModelSource + Clone + 'static,
    S::Args: DeserializeOwned + 'static,
{
    let served = Arc::new(Served {
        source,
        settings,
        role_header: role_header.into(),
    });

    Router::new()
        .route("/", get(read::<S>).patch(update::<S>))
        .with_state(served)
}

async fn read<S>(
    State(served): State<Arc<Served<S>>>,
    headers: HeaderMap,
    Query(args): Query<S::Args>,
) -> Result<Json<RoleView>, ServeError>
where
    S: ModelSource + Clone + 'static,
    S::Args: DeserializeOwned + 'static,
{
    let role = served.role(&headers)?;
    let model = served.model()?;

    model.init(&args).await?;

    Ok(Json(model.sanitize(&role)?))
}

async fn update<S>(
    State(served): State<Arc<Served<S>>>,
    headers: HeaderMap,
    Query(args): Query<S::Args>,
    Json(document): Json<Value>,
) -> Result<Json<RoleView>, ServeError>
where
    S: ModelSource + Clone + 'static,
    S::Args: DeserializeOwned + 'static,
{
    let role = served.role(&headers)?;
    let patch = Patch::from_json(document)?;
    let model = served.model()?;

    model.init(&args).await?;

    Ok(Json(model.patch(&role, &patch, &args).await?))
}

enum ServeError {
    MissingRole(String),
    Model(VeilModelError),
}

impl From<VeilModelError> for ServeError {
    fn from(error: VeilModelError) -> Self {
        ServeError::Model(error)
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ServeError::MissingRole(header) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": format!("Missing {header} header") }),
            ),
            ServeError::Model(error) => (status_of(&error), error_body(&error)),
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "{}", body["error"]);
        }

        (status, Json(body)).into_response()
    }
}

/// The message of `error`, plus the segments of the field it concerns when
/// it names one.
fn error_body(error: &VeilModelError) -> Value {
    match error.path() {
        Some(path) => json!({ "error": error.to_string(), "path": path.segments() }),
        None => json!({ "error": error.to_string() }),
    }
}

fn status_of(error: &VeilModelError) -> StatusCode {
    match error {
        VeilModelError::Validation { .. } => StatusCode::BAD_REQUEST,
        VeilModelError::PatchRejected { .. } => StatusCode::FORBIDDEN,
        VeilModelError::Request { .. } => StatusCode::BAD_GATEWAY,
        VeilModelError::ShapeMismatch { .. } | VeilModelError::UninitializedAccess { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
