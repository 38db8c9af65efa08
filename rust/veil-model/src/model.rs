use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::RwLock;
use tokio::sync::Mutex;
use veil_permissions::Permission;
use veil_tree::{
    FieldPath, MergedView, PermissionsTree, RoleView, Schema, ValuesTree, join, sanitize,
};

use crate::{ModelSettings, ModelSource, ModelStatus, Patch, VeilModelError};

/// Everything a completed build produced.
#[derive(Debug)]
pub struct ModelSnapshot {
    /// The fetched values
    pub values: ValuesTree,
    /// The permissions computed for those values
    pub permissions: PermissionsTree,
    /// Values and permissions joined leaf by leaf
    pub view: Arc<MergedView>,
}

struct ModelState {
    status: ModelStatus,
    snapshot: Option<Arc<ModelSnapshot>>,
}

/// A [Model] fetches a domain value from its [ModelSource], attaches the
/// permissions of every field, and serves sanitized views of the result.
///
/// A model is meant to live for one request or session. Concurrent calls to
/// [Model::init] on the same model are coalesced: a caller that waited on a
/// build which succeeded shares it instead of fetching again.
pub struct Model<S>
where
    S: ModelSource,
{
    source: S,
    settings: ModelSettings,
    schema: Schema,
    state: RwLock<ModelState>,
    flight: Mutex<()>,
    builds: AtomicU64,
}

impl<S> Model<S>
where
    S: ModelSource,
{
    /// Creates an uninitialized model. Fails if the default permissions do
    /// not have the shape of the source's domain type.
    pub fn new(source: S, settings: ModelSettings) -> Result<Self, VeilModelError> {
        let schema = <S::Value as veil_tree::Describe>::schema();
        settings.default_permissions.conforms_to(&schema)?;

        Ok(Self {
            source,
            settings,
            schema,
            state: RwLock::new(ModelState {
                status: ModelStatus::Uninitialized,
                snapshot: None,
            }),
            flight: Mutex::new(()),
            builds: AtomicU64::new(0),
        })
    }

    /// The current lifecycle status.
    pub fn status(&self) -> ModelStatus {
        self.state.read().status
    }

    /// The shape of the domain type.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The source this model reads from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The settings this model was created with.
    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Fetches the domain value, computes its permissions and joins them.
    ///
    /// On any failure (including a timeout, or this future being dropped
    /// before it completes) the model returns to
    /// [ModelStatus::Uninitialized].
    pub async fn init(&self, args: &S::Args) -> Result<(), VeilModelError> {
        let observed = self.builds.load(Ordering::Acquire);
        let _flight = self.flight.lock().await;

        if self.builds.load(Ordering::Acquire) != observed
            && self.status() == ModelStatus::ViewBuilt
        {
            tracing::debug!("Sharing a model build that completed while waiting");
            return Ok(());
        }

        self.build(args).await
    }

    /// Everything the last build produced.
    pub fn snapshot(&self) -> Result<Arc<ModelSnapshot>, VeilModelError> {
        let state = self.state.read();
        match (&state.status, &state.snapshot) {
            (ModelStatus::ViewBuilt, Some(snapshot)) => Ok(snapshot.clone()),
            (status, _) => Err(VeilModelError::UninitializedAccess { status: *status }),
        }
    }

    /// The role-agnostic merged view. It holds every raw value and must not
    /// be handed to a client.
    pub fn view(&self) -> Result<Arc<MergedView>, VeilModelError> {
        Ok(self.snapshot()?.view.clone())
    }

    /// The fetched values.
    pub fn values(&self) -> Result<ValuesTree, VeilModelError> {
        Ok(self.snapshot()?.values.clone())
    }

    /// The computed permissions.
    pub fn permissions(&self) -> Result<PermissionsTree, VeilModelError> {
        Ok(self.snapshot()?.permissions.clone())
    }

    /// Projects the merged view for `role`. Every call computes a fresh
    /// [RoleView].
    pub fn sanitize(&self, role: &str) -> Result<RoleView, VeilModelError> {
        Ok(sanitize(&self.snapshot()?.view, role))
    }

    /// Forwards `patch` to the source on behalf of `role`, then rebuilds the
    /// model and returns the new view for `role`.
    ///
    /// The model must be initialized: the role's Update permissions are read
    /// from the current view before anything is forwarded. The rebuild is
    /// never shared with a build that began before the patch landed.
    pub async fn patch(
        &self,
        role: &str,
        patch: &Patch,
        args: &S::Args,
    ) -> Result<RoleView, VeilModelError> {
        let leaves = patch.leaves(&self.schema)?;
        if leaves.is_empty() {
            return Err(VeilModelError::Validation {
                path: FieldPath::root(),
                reason: "a patch must touch at least one field".into(),
            });
        }
        let snapshot = self.snapshot()?;

        for (path, _) in &leaves {
            let writable = snapshot
                .view
                .leaf_at(path.clone())
                .map(|field| {
                    field
                        .permissions
                        .permissions_for(role)
                        .contains(Permission::Update)
                })
                .unwrap_or(false);

            if !writable {
                tracing::warn!(
                    %path,
                    role,
                    "Rejecting patch of a field the role may not update"
                );
                return Err(VeilModelError::rejected(
                    path.clone(),
                    role,
                    "role does not hold Update",
                ));
            }
        }
        drop(snapshot);

        self.step("patch", self.source.patch(role, patch, args))
            .await
            .inspect_err(|error| tracing::warn!(role, "Source refused patch: {error}"))?;

        tracing::debug!(role, fields = leaves.len(), "Patch applied; rebuilding model");

        let _flight = self.flight.lock().await;
        self.build(args).await?;
        self.sanitize(role)
    }

    async fn build(&self, args: &S::Args) -> Result<(), VeilModelError> {
        let transition = Transition::begin(&self.state);
        tracing::debug!("Fetching model values");

        let value = self.step("fetch", self.source.fetch(args)).await?;
        let values = ValuesTree::from_value(&self.schema, &value)?;

        transition.advance(ModelStatus::ComputingPermissions);
        tracing::debug!("Computing model permissions");

        let permissions = self
            .step(
                "update_permissions",
                self.source
                    .update_permissions(&value, args, &self.settings.default_permissions),
            )
            .await?;

        let view = join(&values, &permissions)?;

        if tracing::enabled!(tracing::Level::TRACE) {
            if let Ok(json) = view.to_json() {
                tracing::trace!(view = %json, "Merged view");
            }
        }

        transition.commit(ModelSnapshot {
            values,
            permissions,
            view: Arc::new(view),
        });
        self.builds.fetch_add(1, Ordering::Release);
        tracing::debug!("Model view built");

        Ok(())
    }

    async fn step<T, F>(&self, name: &'static str, step: F) -> Result<T, VeilModelError>
    where
        F: Future<Output = Result<T, VeilModelError>>,
    {
        match self.settings.timeout {
            Some(limit) => tokio::time::timeout(limit, step)
                .await
                .map_err(|elapsed| VeilModelError::request(name, elapsed))?,
            None => step.await,
        }
    }
}

/// Moves the model out of [ModelStatus::Uninitialized] for the duration of a
/// build, and back again unless the build is committed.
struct Transition<'a> {
    state: &'a RwLock<ModelState>,
    committed: bool,
}

impl<'a> Transition<'a> {
    fn begin(state: &'a RwLock<ModelState>) -> Self {
        let mut cell = state.write();
        cell.status = ModelStatus::Fetching;
        cell.snapshot = None;
        drop(cell);

        Self {
            state,
            committed: false,
        }
    }

    fn advance(&self, status: ModelStatus) {
        self.state.write().status = status;
    }

    fn commit(mut self, snapshot: ModelSnapshot) {
        let mut cell = self.state.write();
        cell.status = ModelStatus::ViewBuilt;
        cell.snapshot = Some(Arc::new(snapshot));
        self.committed = true;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let mut cell = self.state.write();
            tracing::warn!(status = %cell.status, "Model build did not complete");
            cell.status = ModelStatus::Uninitialized;
            cell.snapshot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use anyhow::Result;
    use async_trait::async_trait;
    use futures_util::FutureExt;
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use serde_json::{Value, json};
    use veil_permissions::{Permission, RolePermissions, create_role_permissions};
    use veil_tree::{Describe, PermissionsTree, Schema, Tree};

    use super::*;
    use crate::MemorySource;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Person {
        first_name: String,
        age: u32,
    }

    impl Describe for Person {
        fn schema() -> Schema {
            Schema::object([("firstName", Schema::Leaf), ("age", Schema::Leaf)])
        }
    }

    fn bingus() -> Person {
        Person {
            first_name: "Bingus".into(),
            age: 21,
        }
    }

    fn memory() -> Result<MemorySource<Person>> {
        Ok(MemorySource::new(&bingus())?)
    }

    fn defaults() -> Result<PermissionsTree> {
        Ok(PermissionsTree::from_config(
            &Person::schema(),
            &json!({
                "firstName": { "Admin": "RU", "User": "R" },
                "age": { "Admin": "RU", "User": "" },
            }),
        )?)
    }

    /// Sleeps before answering, and counts how often it was asked.
    struct SlowSource {
        delay: Duration,
        fetches: AtomicUsize,
    }

    impl SlowSource {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelSource for SlowSource {
        type Value = Person;
        type Args = ();

        async fn fetch(&self, _args: &()) -> Result<Person, VeilModelError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(bingus())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ModelSource for FailingSource {
        type Value = Person;
        type Args = ();

        async fn fetch(&self, _args: &()) -> Result<Person, VeilModelError> {
            Err(VeilModelError::request(
                "people/1",
                std::io::Error::other("connection refused"),
            ))
        }
    }

    struct PendingSource;

    #[async_trait]
    impl ModelSource for PendingSource {
        type Value = Person;
        type Args = ();

        async fn fetch(&self, _args: &()) -> Result<Person, VeilModelError> {
            std::future::pending().await
        }
    }

    #[derive(Clone, Copy)]
    enum Policy {
        Defaults,
        Fail,
        Misshaped,
        Slow(Duration),
        Pending,
    }

    /// Fails its first `failures` fetches, and answers permissions according
    /// to a policy that can be changed between builds.
    struct ScriptedSource {
        delay: Duration,
        failures: AtomicUsize,
        fetches: AtomicUsize,
        policy: parking_lot::Mutex<Policy>,
    }

    impl ScriptedSource {
        fn new(policy: Policy) -> Self {
            Self {
                delay: Duration::ZERO,
                failures: AtomicUsize::new(0),
                fetches: AtomicUsize::new(0),
                policy: parking_lot::Mutex::new(policy),
            }
        }

        fn failing_first(delay: Duration) -> Self {
            Self {
                delay,
                failures: AtomicUsize::new(1),
                ..Self::new(Policy::Defaults)
            }
        }

        fn set_policy(&self, policy: Policy) {
            *self.policy.lock() = policy;
        }
    }

    #[async_trait]
    impl ModelSource for ScriptedSource {
        type Value = Person;
        type Args = ();

        async fn fetch(&self, _args: &()) -> Result<Person, VeilModelError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failing {
                return Err(VeilModelError::request(
                    "people/1",
                    std::io::Error::other("connection reset"),
                ));
            }
            Ok(bingus())
        }

        async fn update_permissions(
            &self,
            _values: &Person,
            _args: &(),
            defaults: &PermissionsTree,
        ) -> Result<PermissionsTree, VeilModelError> {
            let policy = *self.policy.lock();
            match policy {
                Policy::Defaults => Ok(defaults.clone()),
                Policy::Fail => Err(VeilModelError::request(
                    "policy",
                    std::io::Error::other("policy service unavailable"),
                )),
                Policy::Misshaped => Ok(Tree::branch([(
                    "firstName",
                    Tree::Leaf(RolePermissions::new()),
                )])),
                Policy::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(defaults.clone())
                }
                Policy::Pending => std::future::pending().await,
            }
        }
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Document {
        name: String,
        url: String,
        valid: bool,
    }

    impl Describe for Document {
        fn schema() -> Schema {
            Schema::object([
                ("name", Schema::Leaf),
                ("url", Schema::Leaf),
                ("valid", Schema::Leaf),
            ])
        }
    }

    /// Lets users follow a document's url only once it is valid.
    struct DocumentSource(Document);

    #[async_trait]
    impl ModelSource for DocumentSource {
        type Value = Document;
        type Args = ();

        async fn fetch(&self, _args: &()) -> Result<Document, VeilModelError> {
            Ok(self.0.clone())
        }

        async fn update_permissions(
            &self,
            values: &Document,
            _args: &(),
            _defaults: &PermissionsTree,
        ) -> Result<PermissionsTree, VeilModelError> {
            let url = if values.valid { "R" } else { "" };
            Ok(PermissionsTree::from_config(
                &Document::schema(),
                &json!({
                    "name": { "Admin": "RU", "User": "R" },
                    "url": { "Admin": "RU", "User": url },
                    "valid": { "Admin": "RU", "User": "R" },
                }),
            )?)
        }
    }

    #[tokio::test]
    async fn it_builds_a_view_and_sanitizes_it_per_role() -> Result<()> {
        let model = Model::new(memory()?, ModelSettings::new(defaults()?))?;
        assert_eq!(model.status(), ModelStatus::Uninitialized);

        model.init(&()).await?;

        assert_eq!(model.status(), ModelStatus::ViewBuilt);
        assert_eq!(
            model.sanitize("User")?.to_json()?,
            json!({
                "firstName": { "value": "Bingus", "permissions": ["Read"] },
                "age": { "value": null, "permissions": [] },
            })
        );
        assert_eq!(model.sanitize("Admin")?.value_at("age"), Some(&json!(21)));
        assert_eq!(model.values()?.leaf_at("age"), Some(&json!(21)));
        Ok(())
    }

    #[tokio::test]
    async fn it_refuses_to_sanitize_before_init() -> Result<()> {
        let model = Model::new(memory()?, ModelSettings::new(defaults()?))?;

        let error = model.sanitize("User").unwrap_err();

        assert!(matches!(
            error,
            VeilModelError::UninitializedAccess {
                status: ModelStatus::Uninitialized
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_defaults_of_the_wrong_shape() -> Result<()> {
        let admin = create_role_permissions([("Admin", "CRUD".into())])?;
        let defaults = Tree::branch([("firstName", Tree::Leaf(admin))]);

        let result = Model::new(memory()?, ModelSettings::new(defaults));

        assert!(matches!(result, Err(VeilModelError::ShapeMismatch { .. })));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn it_coalesces_concurrent_inits() -> Result<()> {
        let model = Model::new(
            SlowSource::new(Duration::from_millis(20)),
            ModelSettings::new(defaults()?),
        )?;

        let (first, second, third) =
            tokio::join!(model.init(&()), model.init(&()), model.init(&()));
        first?;
        second?;
        third?;

        assert_eq!(model.source().fetches.load(Ordering::SeqCst), 1);
        assert_eq!(model.status(), ModelStatus::ViewBuilt);
        Ok(())
    }

    #[tokio::test]
    async fn it_fetches_again_when_initialized_again() -> Result<()> {
        let model = Model::new(
            SlowSource::new(Duration::from_millis(1)),
            ModelSettings::new(defaults()?),
        )?;

        model.init(&()).await?;
        model.init(&()).await?;

        assert_eq!(model.source().fetches.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn it_stays_uninitialized_when_fetch_fails() -> Result<()> {
        let model = Model::new(FailingSource, ModelSettings::new(defaults()?))?;

        let error = model.init(&()).await.unwrap_err();

        assert!(matches!(
            error,
            VeilModelError::Request { ref endpoint, .. } if endpoint == "people/1"
        ));
        assert_eq!(model.status(), ModelStatus::Uninitialized);
        assert!(model.sanitize("Admin").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn it_times_out_a_slow_fetch() -> Result<()> {
        let model = Model::new(
            SlowSource::new(Duration::from_secs(5)),
            ModelSettings::new(defaults()?).with_timeout(Duration::from_millis(10)),
        )?;

        let error = model.init(&()).await.unwrap_err();

        assert!(matches!(
            error,
            VeilModelError::Request { ref endpoint, .. } if endpoint == "fetch"
        ));
        assert_eq!(model.status(), ModelStatus::Uninitialized);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn it_reverts_when_an_init_is_dropped() -> Result<()> {
        let model = Model::new(PendingSource, ModelSettings::new(defaults()?))?;

        let mut init = Box::pin(model.init(&()));
        assert!(init.as_mut().now_or_never().is_none());
        assert_eq!(model.status(), ModelStatus::Fetching);

        drop(init);

        assert_eq!(model.status(), ModelStatus::Uninitialized);
        Ok(())
    }

    #[tokio::test]
    async fn it_derives_permissions_from_the_values() -> Result<()> {
        let defaults = PermissionsTree::uniform(
            &Document::schema(),
            &create_role_permissions([("Admin", "RU".into()), ("User", "R".into())])?,
        );
        let document = |valid| Document {
            name: "Document 1".into(),
            url: "/url/document_1".into(),
            valid,
        };

        let valid = Model::new(
            DocumentSource(document(true)),
            ModelSettings::new(defaults.clone()),
        )?;
        let invalid = Model::new(
            DocumentSource(document(false)),
            ModelSettings::new(defaults),
        )?;
        valid.init(&()).await?;
        invalid.init(&()).await?;

        assert_eq!(
            valid.sanitize("User")?.value_at("url"),
            Some(&json!("/url/document_1"))
        );
        assert_eq!(invalid.sanitize("User")?.value_at("url"), Some(&Value::Null));
        assert_eq!(
            invalid.sanitize("Admin")?.value_at("url"),
            Some(&json!("/url/document_1"))
        );
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn it_rejects_patches_without_update() -> Result<()> {
        let source = memory()?;
        let model = Model::new(source.clone(), ModelSettings::new(defaults()?))?;
        model.init(&()).await?;

        let error = model
            .patch("User", &Patch::new().with("firstName", json!("Lingus")), &())
            .await
            .unwrap_err();

        match error {
            VeilModelError::PatchRejected { path, role, .. } => {
                assert_eq!(path, FieldPath::from("firstName"));
                assert_eq!(role, "User");
            }
            other => panic!("expected a rejected patch, got {other}"),
        }
        assert_eq!(source.document()["firstName"], json!("Bingus"));
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_patches_of_unknown_fields() -> Result<()> {
        let model = Model::new(memory()?, ModelSettings::new(defaults()?))?;
        model.init(&()).await?;

        let error = model
            .patch("Admin", &Patch::new().with("nickname", json!("Bing")), &())
            .await
            .unwrap_err();

        assert!(matches!(error, VeilModelError::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn it_returns_a_fresh_view_after_a_patch() -> Result<()> {
        let source = memory()?;
        let model = Model::new(source.clone(), ModelSettings::new(defaults()?))?;
        model.init(&()).await?;

        let view = model
            .patch("Admin", &Patch::new().with("age", json!(22)), &())
            .await?;

        assert_eq!(view.value_at("age"), Some(&json!(22)));
        assert_eq!(
            view.leaf_at("age").map(|field| field.permissions.to_vec()),
            Some(vec![Permission::Read, Permission::Update])
        );
        assert_eq!(model.sanitize("User")?.value_at("age"), Some(&Value::Null));
        assert_eq!(source.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn it_refuses_patches_on_read_only_sources() -> Result<()> {
        let model = Model::new(
            SlowSource::new(Duration::from_millis(1)),
            ModelSettings::new(defaults()?),
        )?;
        model.init(&()).await?;

        let error = model
            .patch("Admin", &Patch::new().with("age", json!(22)), &())
            .await
            .unwrap_err();

        assert!(matches!(error, VeilModelError::PatchRejected { .. }));
        assert_eq!(model.status(), ModelStatus::ViewBuilt);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn it_stays_uninitialized_when_permissions_fail() -> Result<()> {
        let model = Model::new(
            ScriptedSource::new(Policy::Fail),
            ModelSettings::new(defaults()?),
        )?;

        let error = model.init(&()).await.unwrap_err();

        assert!(matches!(
            error,
            VeilModelError::Request { ref endpoint, .. } if endpoint == "policy"
        ));
        assert_eq!(model.status(), ModelStatus::Uninitialized);
        assert!(model.view().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn it_times_out_slow_permissions() -> Result<()> {
        let model = Model::new(
            ScriptedSource::new(Policy::Slow(Duration::from_secs(5))),
            ModelSettings::new(defaults()?).with_timeout(Duration::from_millis(10)),
        )?;

        let error = model.init(&()).await.unwrap_err();

        assert!(matches!(
            error,
            VeilModelError::Request { ref endpoint, .. } if endpoint == "update_permissions"
        ));
        assert_eq!(model.status(), ModelStatus::Uninitialized);
        Ok(())
    }

    #[tokio::test]
    async fn it_stays_uninitialized_when_permissions_do_not_fit_the_values() -> Result<()> {
        let model = Model::new(
            ScriptedSource::new(Policy::Misshaped),
            ModelSettings::new(defaults()?),
        )?;

        let error = model.init(&()).await.unwrap_err();

        assert!(matches!(error, VeilModelError::ShapeMismatch { .. }));
        assert_eq!(error.path(), Some(&FieldPath::from("age")));
        assert_eq!(model.status(), ModelStatus::Uninitialized);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn it_reverts_when_computing_permissions_is_dropped() -> Result<()> {
        let model = Model::new(
            ScriptedSource::new(Policy::Pending),
            ModelSettings::new(defaults()?),
        )?;

        let mut init = Box::pin(model.init(&()));
        assert!(init.as_mut().now_or_never().is_none());
        assert_eq!(model.status(), ModelStatus::ComputingPermissions);

        drop(init);

        assert_eq!(model.status(), ModelStatus::Uninitialized);
        Ok(())
    }

    #[tokio::test]
    async fn it_discards_the_old_view_when_a_rebuild_fails() -> Result<()> {
        let model = Model::new(
            ScriptedSource::new(Policy::Defaults),
            ModelSettings::new(defaults()?),
        )?;
        model.init(&()).await?;
        assert_eq!(model.status(), ModelStatus::ViewBuilt);

        model.source().set_policy(Policy::Fail);
        assert!(model.init(&()).await.is_err());

        assert_eq!(model.status(), ModelStatus::Uninitialized);
        assert!(matches!(
            model.sanitize("Admin"),
            Err(VeilModelError::UninitializedAccess { .. })
        ));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn it_builds_again_for_a_waiter_when_the_build_it_waited_on_fails() -> Result<()> {
        let model = Model::new(
            ScriptedSource::failing_first(Duration::from_millis(20)),
            ModelSettings::new(defaults()?),
        )?;

        let (first, second) = tokio::join!(model.init(&()), model.init(&()));

        assert!(first.is_err());
        second?;
        assert_eq!(model.source().fetches.load(Ordering::SeqCst), 2);
        assert_eq!(model.status(), ModelStatus::ViewBuilt);
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_patches_that_touch_no_field() -> Result<()> {
        let source = memory()?;
        let model = Model::new(source.clone(), ModelSettings::new(defaults()?))?;
        model.init(&()).await?;

        let error = model.patch("Nobody", &Patch::new(), &()).await.unwrap_err();

        assert!(matches!(error, VeilModelError::Validation { .. }));
        assert_eq!(source.fetch_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_the_first_field_written_that_the_role_may_not_update() -> Result<()> {
        let model = Model::new(memory()?, ModelSettings::new(defaults()?))?;
        model.init(&()).await?;
        let patch = Patch::new()
            .with("firstName", json!("Lingus"))
            .with("age", json!(22));

        let error = model.patch("User", &patch, &()).await.unwrap_err();

        assert_eq!(error.path(), Some(&FieldPath::from("firstName")));
        Ok(())
    }
}
