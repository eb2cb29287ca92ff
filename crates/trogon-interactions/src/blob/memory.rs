//! In-memory [`BlobStore`] backend.
//!
//! Used by tests and by the `memory` backend for local runs. Counts every
//! call so callers can assert which lookups happened, and can be told to
//! fail specific paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;

use super::{BlobError, BlobStore};

const URL_SCHEME: &str = "memory://";

#[derive(Default)]
struct Inner {
    objects: HashSet<String>,
    exists_failures: HashMap<String, BlobError>,
    signing_failures: HashMap<String, BlobError>,
    exists_calls: usize,
    sign_calls: usize,
    issued: u64,
}

/// Thread-safe in-memory object set. `Clone` shares state.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let store = Self::new();
        for path in paths {
            store.insert(path);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, path: impl Into<String>) {
        self.lock().objects.insert(path.into());
    }

    pub fn remove(&self, path: &str) {
        self.lock().objects.remove(path);
    }

    /// Make `exists(path)` return `err`.
    pub fn fail_exists(&self, path: impl Into<String>, err: BlobError) {
        self.lock().exists_failures.insert(path.into(), err);
    }

    /// Make `signed_url(path, _)` return `err`.
    pub fn fail_signing(&self, path: impl Into<String>, err: BlobError) {
        self.lock().signing_failures.insert(path.into(), err);
    }

    pub fn exists_calls(&self) -> usize {
        self.lock().exists_calls
    }

    pub fn sign_calls(&self) -> usize {
        self.lock().sign_calls
    }

    pub fn total_calls(&self) -> usize {
        let inner = self.lock();
        inner.exists_calls + inner.sign_calls
    }

    /// The object path a URL issued by this store points at.
    pub fn object_for_url(url: &str) -> Option<&str> {
        let rest = url.strip_prefix(URL_SCHEME)?;
        Some(rest.split_once('?').map_or(rest, |(path, _)| path))
    }
}

impl BlobStore for MemoryBlobStore {
    async fn exists(&self, path: &str) -> Result<bool, BlobError> {
        let mut inner = self.lock();
        inner.exists_calls += 1;
        if let Some(err) = inner.exists_failures.get(path) {
            return Err(err.clone());
        }
        Ok(inner.objects.contains(path))
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, BlobError> {
        let mut inner = self.lock();
        inner.sign_calls += 1;
        if let Some(err) = inner.signing_failures.get(path) {
            return Err(err.clone());
        }
        inner.issued += 1;
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;
        Ok(format!("{URL_SCHEME}{path}?expires={expires}&n={}", inner.issued))
    }
}
