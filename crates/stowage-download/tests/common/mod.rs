//! Shared fakes for coordinator integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stowage_core::download::{TransferRequest, TransferSnapshot};
use stowage_download::{
    CompletionHandler, CoordinatorConfig, DownloadCoordinator, DownloadCoordinatorDeps,
    DownloadError, DownloadEvent, DownloadEventEmitterPort, SessionId, TaskId, TransportPort,
    build_download_coordinator,
};

// ── Fake transport ─────────────────────────────────────────────────

/// Transport that records calls and hands out sequential ids.
#[derive(Default)]
pub struct FakeTransport {
    session: SessionId,
    next_id: AtomicUsize,
    begun: Mutex<Vec<TransferRequest>>,
    cancelled: Mutex<Vec<TaskId>>,
    acknowledged: Mutex<Vec<TaskId>>,
    snapshots: Mutex<Vec<TransferSnapshot>>,
    fail_begin: AtomicBool,
    begin_delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep inside `begin_transfer`, so concurrent starts overlap.
    pub fn with_begin_delay(mut self, delay: Duration) -> Self {
        self.begin_delay = Some(delay);
        self
    }

    pub fn fail_begin(&self) {
        self.fail_begin.store(true, Ordering::SeqCst);
    }

    pub fn set_snapshots(&self, snapshots: Vec<TransferSnapshot>) {
        *self.snapshots.lock().unwrap() = snapshots;
    }

    pub fn begun(&self) -> Vec<TransferRequest> {
        self.begun.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<TaskId> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn acknowledged(&self) -> Vec<TaskId> {
        self.acknowledged.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportPort for FakeTransport {
    fn session_id(&self) -> &SessionId {
        &self.session
    }

    async fn begin_transfer(&self, request: &TransferRequest) -> Result<TaskId, DownloadError> {
        if let Some(delay) = self.begin_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err(DownloadError::transport("transport refused the transfer"));
        }
        self.begun.lock().unwrap().push(request.clone());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(TaskId::new(format!("task-{n}")))
    }

    async fn existing_transfers(&self) -> Result<Vec<TransferSnapshot>, DownloadError> {
        Ok(self.snapshots.lock().unwrap().clone())
    }

    async fn cancel(&self, id: &TaskId) -> Result<(), DownloadError> {
        self.cancelled.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn acknowledge(&self, id: &TaskId) -> Result<(), DownloadError> {
        self.acknowledged.lock().unwrap().push(id.clone());
        Ok(())
    }
}

pub fn snapshot(id: &str, url: &str, bytes_received: u64, active: bool) -> TransferSnapshot {
    TransferSnapshot {
        id: TaskId::new(id),
        session: SessionId::default(),
        source_url: url.to_string(),
        destination_name: url.rsplit('/').next().unwrap_or("file").to_string(),
        bytes_received,
        bytes_expected: Some(100),
        active,
    }
}

// ── Capturing emitter ──────────────────────────────────────────────

/// Emitter that keeps every event it sees.
#[derive(Clone, Default)]
pub struct CapturingEmitter {
    events: Arc<Mutex<Vec<DownloadEvent>>>,
}

impl CapturingEmitter {
    pub fn events(&self) -> Vec<DownloadEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn completions(&self) -> Vec<DownloadEvent> {
        self.events()
            .into_iter()
            .filter(DownloadEvent::is_completion)
            .collect()
    }

    pub fn progress(&self) -> Vec<DownloadEvent> {
        self.events()
            .into_iter()
            .filter(|e| !e.is_completion())
            .collect()
    }
}

impl DownloadEventEmitterPort for CapturingEmitter {
    fn emit(&self, event: DownloadEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}

// ── Harness ────────────────────────────────────────────────────────

pub struct Harness {
    pub coordinator: Arc<DownloadCoordinator>,
    pub transport: Arc<FakeTransport>,
    pub emitter: Arc<CapturingEmitter>,
    pub temp: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_transport(FakeTransport::new())
    }

    pub fn with_transport(transport: FakeTransport) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let config = CoordinatorConfig::new(temp.path().join("store")).with_segment("media");
        Self::build(transport, config, temp)
    }

    /// Store root is a regular file, so every placement fails.
    pub fn with_unwritable_store() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let blocked = temp.path().join("store");
        std::fs::write(&blocked, b"not a directory").unwrap();
        let config = CoordinatorConfig::new(blocked).with_segment("media");
        Self::build(FakeTransport::new(), config, temp)
    }

    fn build(transport: FakeTransport, config: CoordinatorConfig, temp: tempfile::TempDir) -> Self {
        let transport = Arc::new(transport);
        let emitter = Arc::new(CapturingEmitter::default());
        let coordinator = Arc::new(build_download_coordinator(DownloadCoordinatorDeps {
            transport: Arc::clone(&transport),
            event_emitter: Arc::clone(&emitter),
            config,
        }));
        Self {
            coordinator,
            transport,
            emitter,
            temp,
        }
    }

    /// Write a temporary payload the way a transport would.
    pub fn payload(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let dir = self.temp.path().join("payloads");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub fn store_path(&self, name: &str) -> PathBuf {
        self.temp.path().join("store").join("media").join(name)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }
}

/// Handler that bumps a counter when invoked.
pub fn counting_handler(counter: &Arc<AtomicUsize>) -> CompletionHandler {
    let counter = Arc::clone(counter);
    Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}
