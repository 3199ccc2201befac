//! Background transport port.
//!
//! The transport owns the network side of a download: it moves bytes into a
//! temporary payload, survives process restarts under a stable session
//! identity, and reports what happened as [`TransportEvent`] values.
//!
//! # Design
//!
//! - Callbacks are delivered over a channel the transport was constructed with,
//!   so a transport never calls back into the coordinator while it holds a lock
//! - Task identifiers are assigned by the transport and are opaque to callers
//! - Resumption of interrupted transfers is the transport's business

use std::path::PathBuf;

use async_trait::async_trait;

use crate::download::{DownloadError, SessionId, TaskId, TransferRequest, TransferSnapshot};

/// How a transfer ended, as seen by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    /// All bytes arrived; the payload sits at a temporary location.
    Finished {
        /// Temporary payload location. The coordinator moves it into the store.
        location: PathBuf,
    },
    /// The transfer failed or was cancelled.
    Failed(DownloadError),
}

impl TransferOutcome {
    /// Whether the transport delivered a payload.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

/// Callback from the transport to the coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Bytes arrived for a transfer.
    Progress {
        /// Transfer handle.
        id: TaskId,
        /// Total bytes received so far.
        bytes_received: u64,
        /// Total bytes expected, if the server reported a length.
        bytes_expected: Option<u64>,
    },
    /// A transfer reached its terminal outcome.
    TaskFinished {
        /// Transfer handle.
        id: TaskId,
        /// What happened.
        outcome: TransferOutcome,
    },
    /// The transport has delivered every pending event for a session.
    SessionFinished {
        /// Session that went quiet.
        session: SessionId,
    },
}

impl TransportEvent {
    /// Build a progress event.
    #[must_use]
    pub const fn progress(id: TaskId, bytes_received: u64, bytes_expected: Option<u64>) -> Self {
        Self::Progress {
            id,
            bytes_received,
            bytes_expected,
        }
    }

    /// Build a successful terminal event.
    pub fn finished(id: TaskId, location: impl Into<PathBuf>) -> Self {
        Self::TaskFinished {
            id,
            outcome: TransferOutcome::Finished {
                location: location.into(),
            },
        }
    }

    /// Build a failed terminal event.
    #[must_use]
    pub const fn failed(id: TaskId, error: DownloadError) -> Self {
        Self::TaskFinished {
            id,
            outcome: TransferOutcome::Failed(error),
        }
    }
}

/// Port for a background-capable transfer service.
///
/// # Usage
///
/// ```ignore
/// let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
/// let transport: Arc<dyn TransportPort> = HttpTransport::open(config, tx)?;
/// let id = transport.begin_transfer(&request).await?;
/// ```
#[async_trait]
pub trait TransportPort: Send + Sync {
    /// Stable identity of the session this transport serves.
    fn session_id(&self) -> &SessionId;

    /// Start moving bytes for a new transfer and return its identifier.
    ///
    /// Must not block on event delivery. Events for the returned id may be
    /// emitted as soon as this returns.
    async fn begin_transfer(&self, request: &TransferRequest) -> Result<TaskId, DownloadError>;

    /// Transfers the transport still tracks, including ones started by a
    /// previous process under the same session identity.
    ///
    /// Payloads that finished but were never acknowledged are reported too,
    /// and their terminal event is delivered again.
    async fn existing_transfers(&self) -> Result<Vec<TransferSnapshot>, DownloadError>;

    /// Release a finished transfer once its payload was placed or discarded.
    ///
    /// Until then the transport keeps the transfer recorded across restarts.
    async fn acknowledge(&self, id: &TaskId) -> Result<(), DownloadError>;

    /// Cancel a transfer. The terminal event carries [`DownloadError::Cancelled`].
    async fn cancel(&self, id: &TaskId) -> Result<(), DownloadError>;
}
