//! Download coordinator port definition.
//!
//! This port defines the public interface for the download subsystem. It
//! hides the transport, the registries and the run loop behind a small async
//! API.
//!
//! # Design
//!
//! - Only core download domain types in signatures
//! - No `CancellationToken` or channel types leak through
//! - Per-task failures are delivered as events, not returned from `start`

use std::path::PathBuf;

use async_trait::async_trait;

use crate::download::{DownloadError, DownloadTask, SessionId};
use crate::paths::StorageResolver;

/// Deferred wake-up action registered for a session.
pub type CompletionHandler = Box<dyn FnOnce() + Send + 'static>;

/// Request to start a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Absolute URL of the remote resource.
    pub url: String,
    /// File name to store the payload under. Derived from the URL when absent.
    pub destination_name: Option<String>,
}

impl DownloadRequest {
    /// Create a request that stores the payload under the URL's last segment.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination_name: None,
        }
    }

    /// Store the payload under an explicit name.
    #[must_use]
    pub fn with_destination_name(mut self, name: impl Into<String>) -> Self {
        self.destination_name = Some(name.into());
        self
    }
}

/// Configuration for creating a download coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Root of the file store.
    pub store_root: PathBuf,
    /// Segments under the root where finished payloads are placed.
    pub segments: Vec<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("."),
            segments: Vec::new(),
        }
    }
}

impl CoordinatorConfig {
    /// Create a new config rooted at the store directory.
    #[must_use]
    pub fn new(store_root: PathBuf) -> Self {
        Self {
            store_root,
            ..Default::default()
        }
    }

    /// Append a path segment under the store root.
    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Build the storage resolver for finished payloads.
    #[must_use]
    pub fn resolver(&self) -> StorageResolver {
        StorageResolver::new(self.store_root.clone()).with_segments(self.segments.iter().cloned())
    }
}

/// Port for coordinating background downloads.
///
/// # Usage
///
/// ```ignore
/// let coordinator: Arc<dyn DownloadCoordinatorPort> = /* ... */;
///
/// let task = coordinator.start(DownloadRequest::new("https://host/a.jpg")).await?;
/// coordinator.register_completion_handler(task.session.clone(), Box::new(|| {})).await;
/// ```
#[async_trait]
pub trait DownloadCoordinatorPort: Send + Sync {
    /// Start a download, or return the live task already tracking this URL.
    async fn start(&self, request: DownloadRequest) -> Result<DownloadTask, DownloadError>;

    /// The live task for a URL, if any.
    async fn lookup(&self, url: &str) -> Option<DownloadTask>;

    /// Store a wake-up action for a session. Replaces an unfired one.
    async fn register_completion_handler(&self, session: SessionId, handler: CompletionHandler);

    /// Rebuild the registry from what the transport still tracks.
    async fn reconcile_after_restart(&self) -> Result<Vec<DownloadTask>, DownloadError>;

    /// Ask the transport to cancel the live task for a URL.
    async fn cancel(&self, url: &str) -> Result<(), DownloadError>;
}
