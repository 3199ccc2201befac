//! CLI bootstrap - the composition root.
//!
//! This is the only place the concrete adapters are instantiated:
//! - HTTP transport with its on-disk journal (via stowage-transport)
//! - Download coordinator and its run loop (via stowage-download)
//! - Broadcast event bus for progress output
//!
//! Handlers receive the composed [`CliContext`].

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::unbounded_channel;
use tokio::task::JoinHandle;
use tracing::debug;

use stowage_core::download::SessionId;
use stowage_core::paths::{
    DEFAULT_ROOT_SEGMENT, DirectoryCreationStrategy, StorageResolver, StoreDirResolution,
    ensure_directory, resolve_store_dir, transport_work_dir,
};
use stowage_core::ports::{BroadcastDownloadEmitter, CoordinatorConfig};
use stowage_download::{DownloadCoordinator, DownloadCoordinatorDeps, build_download_coordinator};
use stowage_media::{ImageStore, ImageStoreConfig};
use stowage_transport::{HttpTransport, HttpTransportConfig};

use crate::CliError;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Resolved store root and where it came from.
    pub store: StoreDirResolution,
    /// Directory for transfer journals and partial payloads.
    pub work_dir: PathBuf,
    /// Transfer session to attach to.
    pub session: SessionId,
}

impl CliConfig {
    /// Resolve paths from the command line, the environment and platform defaults.
    pub fn resolve(store_dir: Option<&str>, session: &str) -> Result<Self> {
        Ok(Self {
            store: resolve_store_dir(store_dir).map_err(CliError::from)?,
            work_dir: transport_work_dir().map_err(CliError::from)?,
            session: SessionId::new(session),
        })
    }

    /// Resolver for files under the store's default segment.
    pub fn store_resolver(&self) -> StorageResolver {
        StorageResolver::new(self.store.path.clone()).with_segment(DEFAULT_ROOT_SEGMENT)
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// Paths this context was built from.
    pub config: CliConfig,
    /// Background download coordinator, already running.
    pub downloads: Arc<DownloadCoordinator>,
    /// Progress and completion events.
    pub events: Arc<BroadcastDownloadEmitter>,
    /// Transport behind the coordinator.
    pub transport: Arc<HttpTransport>,
    runner: Option<JoinHandle<()>>,
}

impl CliContext {
    /// Image store rooted next to downloaded files.
    pub fn images(&self, config: ImageStoreConfig) -> ImageStore {
        ImageStore::new(self.config.store_resolver(), config)
    }

    /// Stop the coordinator and wait for its run loop to exit.
    pub async fn shutdown(mut self) {
        self.downloads.shutdown();
        if let Some(runner) = self.runner.take() {
            if let Err(e) = runner.await {
                debug!(error = %e, "Coordinator run loop ended abnormally");
            }
        }
    }
}

/// Bootstrap the CLI application.
///
/// 1. Ensures the store root exists and is writable
/// 2. Opens the HTTP transport for the session (loading its journal)
/// 3. Creates the broadcast event bus
/// 4. Builds the coordinator with injected ports
/// 5. Spawns the coordinator's event loop
pub async fn bootstrap(config: CliConfig) -> Result<CliContext> {
    // 1. Store root
    ensure_directory(&config.store.path, DirectoryCreationStrategy::AutoCreate)
        .map_err(CliError::from)?;

    // 2. Transport
    let (tx, rx) = unbounded_channel();
    let transport_config = HttpTransportConfig::new(config.work_dir.clone(), config.session.clone());
    let transport = Arc::new(HttpTransport::open(transport_config, tx).map_err(CliError::from)?);

    // 3. Event bus
    let events = Arc::new(BroadcastDownloadEmitter::new());

    // 4. Coordinator
    let downloads = Arc::new(build_download_coordinator(DownloadCoordinatorDeps {
        transport: Arc::clone(&transport),
        event_emitter: Arc::clone(&events),
        config: CoordinatorConfig::new(config.store.path.clone()).with_segment(DEFAULT_ROOT_SEGMENT),
    }));

    // 5. Run loop
    let runner = downloads.spawn(rx);
    tokio::task::yield_now().await;

    debug!(
        store = %config.store.path.display(),
        session = %config.session,
        "CLI context ready"
    );

    Ok(CliContext {
        config,
        downloads,
        events,
        transport,
        runner,
    })
}
