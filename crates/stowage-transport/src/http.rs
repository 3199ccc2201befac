//! `reqwest`-backed implementation of `TransportPort`.
//!
//! Each transfer runs on its own task and streams into a partial payload.
//! Connection attempts are retried with exponential backoff for transient
//! errors (5xx and network). Once the body starts streaming, failures are
//! terminal for that attempt.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::RANGE;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use stowage_core::download::{DownloadError, SessionId, TaskId, TransferRequest, TransferSnapshot};
use stowage_core::ports::{TransferOutcome, TransportEvent, TransportPort};

use crate::config::HttpTransportConfig;
use crate::journal::{Journal, JournalEntry};
use crate::throttle::ProgressThrottle;

/// Journal plus the cancellation handle of every running transfer.
struct TransportState {
    journal: Journal,
    running: HashMap<TaskId, CancellationToken>,
}

/// State shared between the transport and its transfer tasks.
struct Shared {
    config: HttpTransportConfig,
    client: reqwest::Client,
    events: UnboundedSender<TransportEvent>,
    state: Mutex<TransportState>,
}

/// Durable HTTP transport.
pub struct HttpTransport {
    session: SessionId,
    shared: Arc<Shared>,
}

impl HttpTransport {
    /// Open the transport for `config.session`, loading its journal.
    ///
    /// Journaled transfers are not restarted until
    /// [`existing_transfers`](TransportPort::existing_transfers) is called.
    pub fn open(
        config: HttpTransportConfig,
        events: UnboundedSender<TransportEvent>,
    ) -> Result<Self, DownloadError> {
        let journal = Journal::open(&config.work_dir, &config.session)?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| DownloadError::transport(e.to_string()))?;

        info!(
            session = %config.session,
            journaled = journal.entries().len(),
            "Opened HTTP transport"
        );

        Ok(Self {
            session: config.session.clone(),
            shared: Arc::new(Shared {
                config,
                client,
                events,
                state: Mutex::new(TransportState {
                    journal,
                    running: HashMap::new(),
                }),
            }),
        })
    }

    /// Number of transfers currently moving bytes.
    pub async fn running_count(&self) -> usize {
        self.shared.state.lock().await.running.len()
    }

    /// Path of the session journal.
    pub async fn journal_path(&self) -> PathBuf {
        self.shared.state.lock().await.journal.path()
    }
}

#[async_trait]
impl TransportPort for HttpTransport {
    fn session_id(&self) -> &SessionId {
        &self.session
    }

    async fn begin_transfer(&self, request: &TransferRequest) -> Result<TaskId, DownloadError> {
        let id = TaskId::new(Uuid::new_v4().to_string());
        let entry = JournalEntry::new(id.clone(), request.url.as_str(), &request.destination_name);

        let mut state = self.shared.state.lock().await;
        state.journal.insert(entry.clone())?;
        spawn_transfer(&self.shared, &mut state, entry);
        drop(state);

        debug!(id = %id, url = %request.url, "Transfer enqueued");
        Ok(id)
    }

    async fn existing_transfers(&self) -> Result<Vec<TransferSnapshot>, DownloadError> {
        let mut state = self.shared.state.lock().await;
        let entries = state.journal.entries().to_vec();

        let mut snapshots = Vec::with_capacity(entries.len());
        let mut redelivered = 0usize;
        for entry in entries {
            let payload = state.journal.payload_path(&entry.id);
            let bytes_received = tokio::fs::metadata(&payload)
                .await
                .map(|meta| meta.len())
                .unwrap_or(0);
            let active = state.running.contains_key(&entry.id);

            snapshots.push(TransferSnapshot {
                id: entry.id.clone(),
                session: self.session.clone(),
                source_url: entry.url.clone(),
                destination_name: entry.destination_name.clone(),
                bytes_received,
                bytes_expected: entry.bytes_expected,
                active,
            });

            if entry.is_finished() {
                debug!(id = %entry.id, "Redelivering unacknowledged payload");
                self.shared.send(TransportEvent::finished(entry.id.clone(), payload));
                redelivered += 1;
            } else if !active {
                debug!(id = %entry.id, bytes_received, "Resuming journaled transfer");
                spawn_transfer(&self.shared, &mut state, entry);
            }
        }

        if redelivered > 0 && state.running.is_empty() {
            self.shared.send(TransportEvent::SessionFinished {
                session: self.session.clone(),
            });
        }

        Ok(snapshots)
    }

    async fn cancel(&self, id: &TaskId) -> Result<(), DownloadError> {
        let mut state = self.shared.state.lock().await;
        if let Some(token) = state.running.get(id) {
            token.cancel();
            return Ok(());
        }

        // Journaled but not resumed in this process.
        if state.journal.remove(id)?.is_some() {
            remove_payload(&state.journal.payload_path(id)).await;
            self.shared
                .send(TransportEvent::failed(id.clone(), DownloadError::Cancelled));
            if state.running.is_empty() {
                self.shared.send(TransportEvent::SessionFinished {
                    session: self.session.clone(),
                });
            }
            return Ok(());
        }

        Err(DownloadError::unknown_task(id.as_str()))
    }

    async fn acknowledge(&self, id: &TaskId) -> Result<(), DownloadError> {
        let mut state = self.shared.state.lock().await;
        match state.journal.get(id) {
            Some(entry) if entry.is_finished() => {}
            Some(_) => {
                debug!(id = %id, "Ignoring acknowledgement for unfinished transfer");
                return Ok(());
            }
            None => return Ok(()),
        }

        state.journal.remove(id)?;
        remove_payload(&state.journal.payload_path(id)).await;
        debug!(id = %id, "Transfer acknowledged");
        Ok(())
    }
}

fn spawn_transfer(shared: &Arc<Shared>, state: &mut TransportState, entry: JournalEntry) {
    let token = CancellationToken::new();
    state.running.insert(entry.id.clone(), token.clone());
    let payload = state.journal.payload_path(&entry.id);

    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        shared.run_transfer(entry, payload, token).await;
    });
}

impl Shared {
    fn send(&self, event: TransportEvent) {
        if self.events.send(event).is_err() {
            debug!("Transport event receiver dropped");
        }
    }

    /// Drive one transfer to its terminal event.
    async fn run_transfer(&self, entry: JournalEntry, payload: PathBuf, cancel: CancellationToken) {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DownloadError::Cancelled),
            result = self.download(&entry, &payload) => result,
        };

        let event = match result {
            Ok(()) => {
                info!(id = %entry.id, path = %payload.display(), "Transfer finished");
                TransportEvent::finished(entry.id.clone(), payload)
            }
            Err(error) => {
                warn!(id = %entry.id, error = %error, "Transfer failed");
                remove_payload(&payload).await;
                TransportEvent::failed(entry.id.clone(), error)
            }
        };

        // A finished payload stays journaled until the coordinator acknowledges it.
        let mut state = self.state.lock().await;
        let recorded = match &event {
            TransportEvent::TaskFinished {
                outcome: TransferOutcome::Finished { .. },
                ..
            } => state.journal.mark_finished(&entry.id),
            _ => state.journal.remove(&entry.id).map(drop),
        };
        if let Err(e) = recorded {
            warn!(id = %entry.id, error = %e, "Failed to update journal");
        }
        state.running.remove(&entry.id);
        self.send(event);
        if state.running.is_empty() {
            self.send(TransportEvent::SessionFinished {
                session: self.config.session.clone(),
            });
        }
    }

    /// Stream the body into `payload`, resuming from a partial file.
    async fn download(&self, entry: &JournalEntry, payload: &Path) -> Result<(), DownloadError> {
        let mut offset = tokio::fs::metadata(payload)
            .await
            .map(|meta| meta.len())
            .unwrap_or(0);

        let response = match self.fetch_with_retry(&entry.url, offset).await {
            Err(DownloadError::TransferFailed {
                status_code: Some(416),
                ..
            }) if offset > 0 => {
                debug!(id = %entry.id, "Partial payload rejected, restarting");
                offset = 0;
                self.fetch_with_retry(&entry.url, 0).await?
            }
            other => other?,
        };

        let resumed = offset > 0 && response.status() == StatusCode::PARTIAL_CONTENT;
        let (mut file, mut received) = if resumed {
            (open_append(payload).await?, offset)
        } else {
            (create_truncate(payload).await?, 0)
        };

        let expected = response.content_length().map(|len| len + received);
        if let Some(total) = expected {
            let mut state = self.state.lock().await;
            state.journal.set_expected(&entry.id, total)?;
        }

        let mut throttle = ProgressThrottle::new(self.config.progress_interval);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::transfer_failed(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::from_io_error(&e))?;
            received += chunk.len() as u64;

            if throttle.should_emit(received) {
                self.send(TransportEvent::progress(entry.id.clone(), received, expected));
            }
        }
        file.flush()
            .await
            .map_err(|e| DownloadError::from_io_error(&e))?;

        if let Some(total) = expected {
            if received < total {
                return Err(DownloadError::transfer_failed(format!(
                    "connection closed after {received} of {total} bytes"
                )));
            }
        }

        throttle.finish(received);
        self.send(TransportEvent::progress(
            entry.id.clone(),
            received,
            expected.or(Some(received)),
        ));
        Ok(())
    }

    /// Send the request with automatic retry for transient errors.
    async fn fetch_with_retry(
        &self,
        url: &str,
        offset: u64,
    ) -> Result<reqwest::Response, DownloadError> {
        let max_retries = self.config.max_retries;
        let mut last_error: Option<DownloadError> = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let factor = 2u32.saturating_pow(u32::from(attempt) - 1);
                let delay = self.config.retry_base_delay.saturating_mul(factor);
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.get(url);
            if offset > 0 {
                request = request.header(RANGE, format!("bytes={offset}-"));
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let error = DownloadError::transfer_failed_with_status(
                        format!("{url} returned {status}"),
                        status.as_u16(),
                    );
                    // 5xx errors are retryable (server-side issues)
                    if status.is_server_error() && attempt < max_retries {
                        debug!(url, %status, attempt, "Retrying after server error");
                        last_error = Some(error);
                        continue;
                    }
                    return Err(error);
                }
                Err(e) => {
                    let error = DownloadError::transfer_failed(e.to_string());
                    // Network errors are retryable
                    if attempt < max_retries {
                        debug!(url, error = %e, attempt, "Retrying after network error");
                        last_error = Some(error);
                        continue;
                    }
                    return Err(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DownloadError::transfer_failed("no attempt was made")))
    }
}

/// Best-effort removal of a payload file.
async fn remove_payload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove payload");
        }
    }
}

async fn open_append(path: &Path) -> Result<File, DownloadError> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .map_err(|e| DownloadError::from_io_error(&e))
}

async fn create_truncate(path: &Path) -> Result<File, DownloadError> {
    File::create(path)
        .await
        .map_err(|e| DownloadError::from_io_error(&e))
}
