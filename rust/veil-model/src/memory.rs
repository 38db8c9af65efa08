use std::{
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use veil_tree::{Describe, FieldPath};

use crate::{ModelSource, Patch, VeilModelError};

const ENDPOINT: &str = "memory";

/// A trivial implementation of [ModelSource] that keeps one domain value
/// in memory, as JSON. Patches are merged into that document.
///
/// Clones share the same document.
pub struct MemorySource<T, A = ()> {
    document: Arc<RwLock<Value>>,
    fetches: Arc<AtomicUsize>,
    kind: PhantomData<fn(&A) -> T>,
}

impl<T, A> MemorySource<T, A>
where
    T: Serialize,
{
    /// Creates a source holding `value`.
    pub fn new(value: &T) -> Result<Self, VeilModelError> {
        let document = serde_json::to_value(value).map_err(|error| VeilModelError::Validation {
            path: FieldPath::root(),
            reason: error.to_string(),
        })?;

        Ok(Self {
            document: Arc::new(RwLock::new(document)),
            fetches: Arc::new(AtomicUsize::new(0)),
            kind: PhantomData,
        })
    }
}

impl<T, A> MemorySource<T, A> {
    /// A copy of the current document.
    pub fn document(&self) -> Value {
        self.document.read().clone()
    }

    /// How many times the document has been fetched.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl<T, A> Clone for MemorySource<T, A> {
    fn clone(&self) -> Self {
        Self {
            document: self.document.clone(),
            fetches: self.fetches.clone(),
            kind: PhantomData,
        }
    }
}

#[async_trait]
impl<T, A> ModelSource for MemorySource<T, A>
where
    T: Describe + Serialize + DeserializeOwned + Send + Sync,
    A: Send + Sync,
{
    type Value = T;
    type Args = A;

    async fn fetch(&self, _args: &A) -> Result<T, VeilModelError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let document = self.document.read().clone();
        serde_json::from_value(document).map_err(|error| VeilModelError::request(ENDPOINT, error))
    }

    async fn patch(&self, _role: &str, patch: &Patch, _args: &A) -> Result<(), VeilModelError> {
        let mut document = self.document.write();
        let mut patched = document.clone();
        patch.apply_to(&mut patched);

        // The patched document must still be a valid value.
        serde_json::from_value::<T>(patched.clone()).map_err(|error| {
            VeilModelError::Validation {
                path: FieldPath::root(),
                reason: error.to_string(),
            }
        })?;

        *document = patched;
        Ok(())
    }
}
