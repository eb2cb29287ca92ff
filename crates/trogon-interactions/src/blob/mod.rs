//! [`BlobStore`]: object existence checks and time-limited read URLs.

pub mod gcs;
pub mod memory;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub use gcs::{GcsBlobStore, GcsConfig};
pub use memory::MemoryBlobStore;

/// Errors produced by blob store backends.
///
/// [`BlobError::is_transport`] separates failures of the connection to the
/// store (which abort a request) from errors the store itself reported
/// (which only drop the affected asset).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    #[error("blob store unreachable: {0}")]
    Transport(String),

    #[error("blob store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("blob store returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to sign URL: {0}")]
    Signing(String),
}

impl BlobError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

/// Read-only view of an object store.
///
/// Implementations must be `Send + Sync`; a single client is built at
/// startup and shared by every request.
pub trait BlobStore: Send + Sync {
    /// Whether an object exists at `path`.
    fn exists(&self, path: &str) -> impl Future<Output = Result<bool, BlobError>> + Send;

    /// A URL granting read access to `path` for `ttl`.
    fn signed_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<String, BlobError>> + Send;
}
