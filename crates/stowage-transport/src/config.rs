//! HTTP transport configuration.

use std::path::PathBuf;
use std::time::Duration;

use stowage_core::download::SessionId;
use stowage_core::paths::{PathError, transport_work_dir};

/// Configuration for opening an [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Directory holding one subdirectory per session.
    pub work_dir: PathBuf,
    /// Session identity. Reopening with the same id resumes its transfers.
    pub session: SessionId,
    /// Retries for 5xx responses and network errors before the body starts.
    pub max_retries: u8,
    /// Base delay for exponential backoff between retries.
    pub retry_base_delay: Duration,
    /// Minimum interval between progress events for one transfer.
    pub progress_interval: Duration,
    /// Connection timeout for each request.
    pub connect_timeout: Duration,
}

impl HttpTransportConfig {
    /// Create a config with default retry and throttle settings.
    #[must_use]
    pub fn new(work_dir: PathBuf, session: SessionId) -> Self {
        Self {
            work_dir,
            session,
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            progress_interval: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Create a config under the platform work directory.
    pub fn from_env(session: SessionId) -> Result<Self, PathError> {
        Ok(Self::new(transport_work_dir()?, session))
    }

    /// Set the retry count.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff base delay.
    #[must_use]
    pub const fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set the progress interval.
    #[must_use]
    pub const fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Directory for this session's journal and payloads.
    pub fn session_dir(&self) -> PathBuf {
        self.work_dir.join(self.session.as_str())
    }
}
