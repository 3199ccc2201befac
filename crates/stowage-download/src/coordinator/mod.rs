//! Download coordinator implementation.
//!
//! This module provides the concrete implementation of `DownloadCoordinatorPort`:
//! a task registry, a completion handler registry and a run loop that consumes
//! transport events.
//!
//! # Architecture
//!
//! - **Coordinator**: start/lookup/cancel/reconcile, owns both registries
//! - **Run loop**: drains one unbounded `TransportEvent` channel sequentially
//! - **Placement**: moves finished payloads into the store outside the lock
//!
//! # Concurrency Model
//!
//! - One `tokio::sync::Mutex` guards both registries
//! - The lock is held across `begin_transfer` and `existing_transfers` so no
//!   callback for a new id is handled before the id is registered
//! - File moves, event publication and handler invocation run unlocked
//! - A settling marker blocks a second terminal transition during the move
//! - A delivered payload is acknowledged to the transport only after it was
//!   placed or discarded, so a crash mid-move leaves it for the next reconcile
//! - Single long-lived runner (never resets `runner_started`)

mod completion;
mod placement;
mod registry;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use stowage_core::download::{
    DownloadError, DownloadEvent, DownloadResult, DownloadTask, SessionId, TaskId, TaskState,
    TransferRequest,
};
use stowage_core::paths::StorageResolver;
use stowage_core::ports::{
    CompletionHandler, CoordinatorConfig, DownloadCoordinatorPort, DownloadEventEmitterPort,
    DownloadRequest, TransferOutcome, TransportEvent, TransportPort,
};

pub use completion::CompletionRegistry;
pub use placement::PayloadPlacement;
pub use registry::{ProgressApply, SettleStart, TaskRegistry};

/// Log target for coordinator lifecycle lines.
const LOG_TARGET: &str = "stowage.download";

/// Dependencies for building a download coordinator.
pub struct DownloadCoordinatorDeps<T, E>
where
    T: TransportPort + 'static,
    E: DownloadEventEmitterPort + 'static,
{
    /// Background transport the coordinator hands transfers to.
    pub transport: Arc<T>,
    /// Notification bus for progress and completion events.
    pub event_emitter: Arc<E>,
    /// Store layout for finished payloads.
    pub config: CoordinatorConfig,
}

/// Build a download coordinator from its dependencies.
pub fn build_download_coordinator<T, E>(deps: DownloadCoordinatorDeps<T, E>) -> DownloadCoordinator
where
    T: TransportPort + 'static,
    E: DownloadEventEmitterPort + 'static,
{
    DownloadCoordinator::new(deps.transport, deps.event_emitter, &deps.config)
}

/// Both registries, mutated together under one lock.
#[derive(Default)]
struct CoordinatorState {
    tasks: TaskRegistry,
    handlers: CompletionRegistry,
}

/// Background download coordinator.
pub struct DownloadCoordinator {
    transport: Arc<dyn TransportPort>,
    emitter: Arc<dyn DownloadEventEmitterPort>,
    resolver: StorageResolver,
    state: Mutex<CoordinatorState>,
    cancel: CancellationToken,
    runner_started: AtomicBool,
}

impl DownloadCoordinator {
    /// Create a coordinator. Prefer [`build_download_coordinator`].
    pub fn new(
        transport: Arc<dyn TransportPort>,
        emitter: Arc<dyn DownloadEventEmitterPort>,
        config: &CoordinatorConfig,
    ) -> Self {
        Self {
            transport,
            emitter,
            resolver: config.resolver(),
            state: Mutex::new(CoordinatorState::default()),
            cancel: CancellationToken::new(),
            runner_started: AtomicBool::new(false),
        }
    }

    /// Session identity of the underlying transport.
    pub fn session_id(&self) -> &SessionId {
        self.transport.session_id()
    }

    /// Resolver used to place finished payloads.
    pub const fn resolver(&self) -> &StorageResolver {
        &self.resolver
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Caller operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Start a download, or return the live task already tracking this URL.
    pub async fn start(&self, request: DownloadRequest) -> DownloadResult<DownloadTask> {
        let url = Url::parse(&request.url)
            .map_err(|e| DownloadError::invalid_url(&request.url, e.to_string()))?;
        let source_url = url.to_string();

        let mut state = self.state.lock().await;
        if let Some(existing) = state.tasks.find_by_url(&source_url) {
            debug!(
                target: LOG_TARGET,
                id = %existing.id,
                url = %source_url,
                "Download already in progress"
            );
            return Ok(existing.clone());
        }

        let destination_name = match request.destination_name {
            Some(name) => name,
            None => derive_file_name(&url)?,
        };
        self.resolver
            .resolve(&destination_name)
            .map_err(|e| DownloadError::invalid_file_name(&destination_name, e.to_string()))?;

        let transfer = TransferRequest::new(url, destination_name.clone());
        let id = self.transport.begin_transfer(&transfer).await?;

        let task = DownloadTask::pending(
            id,
            self.transport.session_id().clone(),
            source_url,
            destination_name,
        );
        state.tasks.insert(task.clone());
        state.handlers.task_added(&task.session);
        drop(state);

        info!(
            target: LOG_TARGET,
            id = %task.id,
            url = %task.source_url,
            name = %task.destination_name,
            "Download started"
        );
        Ok(task)
    }

    /// The live task for a URL, if any.
    pub async fn lookup(&self, url: &str) -> Option<DownloadTask> {
        let key = Url::parse(url).map_or_else(|_| url.to_string(), |u| u.to_string());
        self.state.lock().await.tasks.find_by_url(&key).cloned()
    }

    /// The live task with this id, if any.
    pub async fn lookup_id(&self, id: &TaskId) -> Option<DownloadTask> {
        self.state.lock().await.tasks.get(id).cloned()
    }

    /// All live tasks, ordered by id.
    pub async fn tasks(&self) -> Vec<DownloadTask> {
        self.state.lock().await.tasks.snapshot()
    }

    /// Ask the transport to cancel the live task for a URL.
    ///
    /// The resulting terminal callback is handled like any other failure.
    pub async fn cancel(&self, url: &str) -> DownloadResult<()> {
        let Some(task) = self.lookup(url).await else {
            return Err(DownloadError::unknown_task(url));
        };
        info!(target: LOG_TARGET, id = %task.id, "Cancelling download");
        self.transport.cancel(&task.id).await
    }

    /// Store a wake-up action for a session, replacing an unfired one.
    ///
    /// Fires immediately if the session already signalled and drained.
    pub async fn register_completion_handler(
        &self,
        session: SessionId,
        handler: CompletionHandler,
    ) {
        let ready = {
            let mut state = self.state.lock().await;
            let pending = state.tasks.pending_for(&session);
            state.handlers.register(&session, handler, pending)
        };
        debug!(target: LOG_TARGET, session = %session, "Completion handler registered");
        invoke_handler(&session, ready);
    }

    /// Rebuild the registry from what the transport still tracks.
    ///
    /// Ids already registered keep their record. Returns every task the
    /// transport reported.
    pub async fn reconcile_after_restart(&self) -> DownloadResult<Vec<DownloadTask>> {
        let mut state = self.state.lock().await;
        let snapshots = self.transport.existing_transfers().await?;

        let mut restored = Vec::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            let task = DownloadTask::from_snapshot(snapshot);
            if state.tasks.insert(task.clone()) {
                state.handlers.task_added(&task.session);
                debug!(target: LOG_TARGET, id = %task.id, state = %task.state, "Task restored");
                restored.push(task);
            } else if let Some(existing) = state.tasks.get(&task.id) {
                restored.push(existing.clone());
            }
        }
        drop(state);

        info!(target: LOG_TARGET, count = restored.len(), "Reconciled downloads after restart");
        Ok(restored)
    }

    /// Sessions holding a completion handler that has not fired.
    ///
    /// A session that never drains keeps its handler; this is the place to
    /// notice it.
    pub async fn pending_sessions(&self) -> Vec<SessionId> {
        self.state.lock().await.handlers.pending_sessions()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Stored files
    // ─────────────────────────────────────────────────────────────────────────

    /// Where a downloaded file with this name lives.
    pub fn local_path(&self, file_name: &str) -> DownloadResult<PathBuf> {
        self.resolver
            .resolve(file_name)
            .map_err(|e| DownloadError::invalid_file_name(file_name, e.to_string()))
    }

    /// Whether a downloaded file with this name exists.
    pub async fn file_exists(&self, file_name: &str) -> bool {
        match self.local_path(file_name) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Delete a downloaded file. Returns `false` if it did not exist.
    pub async fn delete_file(&self, file_name: &str) -> DownloadResult<bool> {
        let path = self.local_path(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DownloadError::from_io_error(&e)),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transport callbacks
    // ─────────────────────────────────────────────────────────────────────────

    /// Dispatch one transport event.
    pub async fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Progress {
                id,
                bytes_received,
                bytes_expected,
            } => self.on_progress(&id, bytes_received, bytes_expected).await,
            TransportEvent::TaskFinished { id, outcome } => {
                self.on_task_finished(&id, outcome).await;
            }
            TransportEvent::SessionFinished { session } => {
                self.on_session_finished_events(&session).await;
            }
        }
    }

    /// Record progress and publish it.
    pub async fn on_progress(&self, id: &TaskId, bytes_received: u64, bytes_expected: Option<u64>) {
        let applied = self
            .state
            .lock()
            .await
            .tasks
            .apply_progress(id, bytes_received, bytes_expected);

        match applied {
            ProgressApply::Applied(task) => self.emitter.emit(DownloadEvent::progress(&task)),
            ProgressApply::Regressed { recorded } => debug!(
                id = %id,
                bytes_received,
                recorded,
                "Ignoring regressed progress"
            ),
            ProgressApply::Settling => debug!(id = %id, "Ignoring progress for settling task"),
            ProgressApply::Unknown => {
                warn!(error = %DownloadError::unknown_task(id.as_str()), "Ignoring progress");
            }
        }
    }

    /// Settle a task's terminal outcome exactly once.
    pub async fn on_task_finished(&self, id: &TaskId, outcome: TransferOutcome) {
        let settle = self.state.lock().await.tasks.begin_settling(id);
        let task = match settle {
            SettleStart::Started(task) => task,
            SettleStart::AlreadySettling => {
                debug!(id = %id, "Ignoring duplicate terminal callback");
                return;
            }
            SettleStart::Unknown => {
                warn!(
                    error = %DownloadError::unknown_task(id.as_str()),
                    "Ignoring terminal callback"
                );
                return;
            }
        };

        let delivered = outcome.is_finished();
        let mut leftover = None;
        let result = match outcome {
            TransferOutcome::Finished { location } => {
                match PayloadPlacement::plan(&self.resolver, &task.destination_name, location) {
                    Ok(placement) => {
                        let committed = placement.commit().await;
                        if committed.is_err() {
                            leftover = Some(placement);
                        }
                        committed
                    }
                    Err(e) => Err(e),
                }
            }
            TransferOutcome::Failed(error) => Err(error),
        };

        let final_state = if result.is_ok() {
            TaskState::Succeeded
        } else {
            TaskState::Failed
        };
        let ready = {
            let mut state = self.state.lock().await;
            state.tasks.finish(id, final_state);
            let pending = state.tasks.pending_for(&task.session);
            state.handlers.task_settled(&task.session, pending)
        };

        match result {
            Ok(path) => {
                info!(
                    target: LOG_TARGET,
                    id = %id,
                    path = %path.display(),
                    "Download completed"
                );
                self.emitter.emit(DownloadEvent::succeeded(id.clone(), path));
            }
            Err(error) => {
                warn!(target: LOG_TARGET, id = %id, error = %error, "Download failed");
                self.emitter.emit(DownloadEvent::failed(id.clone(), error));
            }
        }

        if let Some(placement) = leftover {
            placement.discard_source().await;
        }
        if delivered {
            if let Err(e) = self.transport.acknowledge(id).await {
                warn!(id = %id, error = %e, "Failed to acknowledge payload");
            }
        }
        invoke_handler(&task.session, ready);
    }

    /// Record that the transport delivered everything for a session.
    pub async fn on_session_finished_events(&self, session: &SessionId) {
        let ready = {
            let mut state = self.state.lock().await;
            let pending = state.tasks.pending_for(session);
            debug!(target: LOG_TARGET, session = %session, pending, "Session finished events");
            state.handlers.signal(session, pending)
        };
        invoke_handler(session, ready);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Run loop
    // ─────────────────────────────────────────────────────────────────────────

    /// Drain transport events until shutdown or until every sender is dropped.
    pub async fn run(&self, mut events: UnboundedReceiver<TransportEvent>) {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!(target: LOG_TARGET, "Coordinator shutting down");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        debug!(target: LOG_TARGET, "Transport event channel closed");
                        break;
                    }
                },
            }
        }
    }

    /// Spawn the run loop. Returns `None` if it was already started.
    pub fn spawn(
        self: &Arc<Self>,
        events: UnboundedReceiver<TransportEvent>,
    ) -> Option<JoinHandle<()>> {
        if self
            .runner_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let coordinator = Arc::clone(self);
            Some(tokio::spawn(async move {
                coordinator.run(events).await;
            }))
        } else {
            None
        }
    }

    /// Stop the run loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl DownloadCoordinatorPort for DownloadCoordinator {
    async fn start(&self, request: DownloadRequest) -> Result<DownloadTask, DownloadError> {
        Self::start(self, request).await
    }

    async fn lookup(&self, url: &str) -> Option<DownloadTask> {
        Self::lookup(self, url).await
    }

    async fn register_completion_handler(&self, session: SessionId, handler: CompletionHandler) {
        Self::register_completion_handler(self, session, handler).await;
    }

    async fn reconcile_after_restart(&self) -> Result<Vec<DownloadTask>, DownloadError> {
        Self::reconcile_after_restart(self).await
    }

    async fn cancel(&self, url: &str) -> Result<(), DownloadError> {
        Self::cancel(self, url).await
    }
}

/// Last non-empty path segment of a URL.
fn derive_file_name(url: &Url) -> DownloadResult<String> {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| DownloadError::invalid_file_name("", format!("{url} has no file name")))
}

fn invoke_handler(session: &SessionId, handler: Option<CompletionHandler>) {
    if let Some(handler) = handler {
        info!(target: LOG_TARGET, session = %session, "Invoking completion handler");
        handler();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_last_non_empty_segment() {
        let url = Url::parse("https://host/media/a.jpg").unwrap();
        assert_eq!(derive_file_name(&url).unwrap(), "a.jpg");

        let trailing = Url::parse("https://host/media/b.png/").unwrap();
        assert_eq!(derive_file_name(&trailing).unwrap(), "b.png");
    }

    #[test]
    fn root_url_has_no_file_name() {
        let url = Url::parse("https://host/").unwrap();
        assert!(matches!(
            derive_file_name(&url),
            Err(DownloadError::InvalidFileName { .. })
        ));
    }
}
