//! Process-wide goniometer model cache.
//!
//! Many acquisition formats store one physical instrument configuration
//! across hundreds of image files from a run; re-deriving the goniometer
//! model for every image repeats identical header work. [`ModelCache`] is a
//! read-through cache keyed by source file path: the first ingestion of a
//! file computes and stores the model, later ingestions reuse it. The
//! underlying configuration is assumed immutable for the lifetime of a run,
//! so there is no invalidation policy beyond explicit removal.
//!
//! The cache is an explicit component handed to the ingestion path, not a
//! global. Under concurrent ingestion it relies on insert-if-absent: a
//! model is built outside the lock, and when two ingesters race on one key
//! the losing model is discarded in favor of the first inserted one. The
//! construction call itself is never serialized behind the lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::GonioResult;
use crate::goniometer::GoniometerModel;

/// Read-through cache of goniometer models keyed by source file path.
#[derive(Debug, Default)]
pub struct ModelCache {
    models: RwLock<HashMap<PathBuf, Arc<GoniometerModel>>>,
}

impl ModelCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the model for `key`, building and storing it on a miss.
    ///
    /// `build` runs without the cache lock held. On a racing insert for the
    /// same key, the first stored model wins and the later one is dropped,
    /// so every caller observes one model per key.
    ///
    /// # Errors
    ///
    /// A `build` failure is returned to the caller and nothing is cached
    /// for `key`, so a later ingestion retries the construction.
    pub fn get_or_build<F>(&self, key: impl AsRef<Path>, build: F) -> GonioResult<Arc<GoniometerModel>>
    where
        F: FnOnce() -> GonioResult<GoniometerModel>,
    {
        let key = key.as_ref();
        if let Some(existing) = self.models.read().get(key) {
            tracing::debug!(source = %key.display(), "goniometer model cache hit");
            return Ok(existing.clone());
        }

        let model = Arc::new(build()?);
        tracing::debug!(source = %key.display(), "caching goniometer model");
        let mut models = self.models.write();
        Ok(models.entry(key.to_path_buf()).or_insert(model).clone())
    }

    /// Look up the model for `key` without building on a miss.
    pub fn get(&self, key: impl AsRef<Path>) -> Option<Arc<GoniometerModel>> {
        self.models.read().get(key.as_ref()).cloned()
    }

    /// Remove the model for `key`.
    ///
    /// Returns whether a model was cached for it. Used when an adapter is
    /// torn down before the end of the process.
    pub fn invalidate(&self, key: impl AsRef<Path>) -> bool {
        self.models.write().remove(key.as_ref()).is_some()
    }

    /// Number of cached models.
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }
}
