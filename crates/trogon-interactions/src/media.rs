//! Resolves a logical asset name to time-limited image and audio URLs.
//!
//! Each role is looked up independently and concurrently. A missing object
//! yields `None` for that role; an error the store reports for one object
//! is logged and also yields `None`. Only transport failures and timeouts,
//! which mean the store itself is unusable, fail the whole resolution.
//!
//! Discord discards replies sent more than 3 s after the interaction, so every
//! store call is bounded by both a per-call timeout and a deadline shared by
//! the whole resolution.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::blob::{BlobError, BlobStore};

pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(1);
/// Total time one resolution may take, leaving room to send the reply.
pub const DEFAULT_RESOLVE_BUDGET: Duration = Duration::from_millis(2500);

const NAME_PLACEHOLDER: &str = "{name}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRole {
    Image,
    Audio,
}

impl fmt::Display for MediaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

/// Object path templates for each role; `{name}` is replaced by the asset name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaLayout {
    image: Option<String>,
    audio: Option<String>,
}

impl MediaLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, template: impl Into<String>) -> Self {
        self.image = Some(template.into());
        self
    }

    pub fn with_audio(mut self, template: impl Into<String>) -> Self {
        self.audio = Some(template.into());
        self
    }

    pub fn path(&self, role: MediaRole, name: &str) -> Option<String> {
        let template = match role {
            MediaRole::Image => self.image.as_ref(),
            MediaRole::Audio => self.audio.as_ref(),
        }?;
        Some(template.replace(NAME_PLACEHOLDER, name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
}

#[derive(Debug, Error)]
#[error("failed to resolve {role} for {name}: {source}")]
pub struct ResolveError {
    pub name: String,
    pub role: MediaRole,
    #[source]
    pub source: BlobError,
}

/// Object-safe entry point used by command handlers.
pub trait ResolveMedia: Send + Sync {
    fn resolve<'a>(
        &'a self,
        name: &'a str,
        layout: &'a MediaLayout,
    ) -> BoxFuture<'a, Result<ResolvedMedia, ResolveError>>;
}

pub struct MediaResolver<S> {
    store: Arc<S>,
    url_ttl: Duration,
    call_timeout: Duration,
    budget: Duration,
}

impl<S: BlobStore> MediaResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            url_ttl: DEFAULT_URL_TTL,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            budget: DEFAULT_RESOLVE_BUDGET,
        }
    }

    /// How long issued URLs stay valid.
    pub fn with_url_ttl(mut self, ttl: Duration) -> Self {
        self.url_ttl = ttl;
        self
    }

    /// Upper bound for each individual blob store call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Upper bound for a whole resolution, across all calls and roles.
    pub fn with_resolve_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub async fn resolve_media(
        &self,
        name: &str,
        layout: &MediaLayout,
    ) -> Result<ResolvedMedia, ResolveError> {
        let deadline = Instant::now() + self.budget;
        let (image, audio) = tokio::join!(
            self.resolve_role(name, MediaRole::Image, layout.path(MediaRole::Image, name), deadline),
            self.resolve_role(name, MediaRole::Audio, layout.path(MediaRole::Audio, name), deadline),
        );

        Ok(ResolvedMedia {
            image_url: image?,
            audio_url: audio?,
        })
    }

    async fn resolve_role(
        &self,
        name: &str,
        role: MediaRole,
        path: Option<String>,
        deadline: Instant,
    ) -> Result<Option<String>, ResolveError> {
        let Some(path) = path else {
            return Ok(None);
        };

        match self.url_for(&path, deadline).await {
            Ok(url) => Ok(url),
            Err(source) if source.is_transport() => Err(ResolveError {
                name: name.to_string(),
                role,
                source,
            }),
            Err(e) => {
                error!(path = %path, role = %role, error = %e, "Error getting file URL, omitting");
                Ok(None)
            }
        }
    }

    async fn url_for(&self, path: &str, deadline: Instant) -> Result<Option<String>, BlobError> {
        if !self.bounded(deadline, self.store.exists(path)).await? {
            warn!(path = %path, "File not found");
            return Ok(None);
        }

        let url = self
            .bounded(deadline, self.store.signed_url(path, self.url_ttl))
            .await?;
        debug!(path = %path, ttl_secs = self.url_ttl.as_secs(), "Signed media URL");
        Ok(Some(url))
    }

    async fn bounded<T>(
        &self,
        deadline: Instant,
        call: impl Future<Output = Result<T, BlobError>>,
    ) -> Result<T, BlobError> {
        let start = Instant::now();
        let limit = (start + self.call_timeout).min(deadline);
        match tokio::time::timeout_at(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(BlobError::Timeout(limit.saturating_duration_since(start))),
        }
    }
}

impl<S: BlobStore + 'static> ResolveMedia for MediaResolver<S> {
    fn resolve<'a>(
        &'a self,
        name: &'a str,
        layout: &'a MediaLayout,
    ) -> BoxFuture<'a, Result<ResolvedMedia, ResolveError>> {
        Box::pin(self.resolve_media(name, layout))
    }
}
