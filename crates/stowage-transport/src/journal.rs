//! On-disk record of live transfers.
//!
//! Layout under the session directory:
//!
//! ```text
//! <work_dir>/<session>/journal.json
//! <work_dir>/<session>/payloads/<id>.part
//! ```
//!
//! The journal is rewritten atomically (temp file + rename) on every change.
//! An entry outlives its transfer: a finished payload stays recorded until
//! the coordinator acknowledges that it was placed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use stowage_core::download::{DownloadError, SessionId, TaskId};
use stowage_core::paths::validate_file_name;

const JOURNAL_FILE: &str = "journal.json";
const PAYLOAD_DIR: &str = "payloads";
const JOURNAL_VERSION: u32 = 1;

/// One live transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Transfer handle.
    pub id: TaskId,
    /// Source URL.
    pub url: String,
    /// Logical file name requested by the coordinator.
    pub destination_name: String,
    /// Total size, once a response reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_expected: Option<u64>,
    /// When the transfer was first requested.
    pub created_at: DateTime<Utc>,
    /// Set once every byte arrived and the payload awaits placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JournalEntry {
    /// Create an entry stamped with the current time.
    pub fn new(id: TaskId, url: impl Into<String>, destination_name: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            destination_name: destination_name.into(),
            bytes_expected: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Whether the payload is complete and waiting to be acknowledged.
    pub const fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalFile {
    version: u32,
    session: SessionId,
    entries: Vec<JournalEntry>,
}

/// Journal of one session's live transfers.
#[derive(Debug)]
pub struct Journal {
    dir: PathBuf,
    session: SessionId,
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Open (or create) the journal for `session` under `work_dir`.
    ///
    /// An unreadable journal is logged and replaced by an empty one.
    pub fn open(work_dir: &Path, session: &SessionId) -> Result<Self, DownloadError> {
        validate_file_name(session.as_str())
            .map_err(|e| DownloadError::invalid_file_name(session.as_str(), e.to_string()))?;

        let dir = work_dir.join(session.as_str());
        fs::create_dir_all(dir.join(PAYLOAD_DIR)).map_err(|e| DownloadError::from_io_error(&e))?;

        let path = dir.join(JOURNAL_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<JournalFile>(&raw) {
                Ok(file) => file.entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable journal");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(DownloadError::from_io_error(&e)),
        };

        Ok(Self {
            dir,
            session: session.clone(),
            entries,
        })
    }

    /// Live transfers, oldest first.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entry by id.
    pub fn get(&self, id: &TaskId) -> Option<&JournalEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// Record a new transfer.
    pub fn insert(&mut self, entry: JournalEntry) -> Result<(), DownloadError> {
        self.entries.retain(|existing| existing.id != entry.id);
        self.entries.push(entry);
        self.persist()
    }

    /// Record the total size reported for a transfer.
    pub fn set_expected(&mut self, id: &TaskId, total: u64) -> Result<(), DownloadError> {
        let Some(entry) = self.entries.iter_mut().find(|entry| &entry.id == id) else {
            return Ok(());
        };
        if entry.bytes_expected == Some(total) {
            return Ok(());
        }
        entry.bytes_expected = Some(total);
        self.persist()
    }

    /// Mark a transfer's payload as complete.
    pub fn mark_finished(&mut self, id: &TaskId) -> Result<(), DownloadError> {
        let Some(entry) = self.entries.iter_mut().find(|entry| &entry.id == id) else {
            return Ok(());
        };
        if entry.is_finished() {
            return Ok(());
        }
        entry.finished_at = Some(Utc::now());
        self.persist()
    }

    /// Forget a transfer. Returns its entry if it was recorded.
    pub fn remove(&mut self, id: &TaskId) -> Result<Option<JournalEntry>, DownloadError> {
        let Some(index) = self.entries.iter().position(|entry| &entry.id == id) else {
            return Ok(None);
        };
        let entry = self.entries.remove(index);
        self.persist()?;
        Ok(Some(entry))
    }

    /// Partial payload location for a transfer.
    pub fn payload_path(&self, id: &TaskId) -> PathBuf {
        self.dir.join(PAYLOAD_DIR).join(format!("{id}.part"))
    }

    /// Path of the journal file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(JOURNAL_FILE)
    }

    fn persist(&self) -> Result<(), DownloadError> {
        let file = JournalFile {
            version: JOURNAL_VERSION,
            session: self.session.clone(),
            entries: self.entries.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| DownloadError::io("serialize", e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| DownloadError::from_io_error(&e))?;
        tmp.write_all(&json)
            .map_err(|e| DownloadError::from_io_error(&e))?;
        tmp.persist(self.path())
            .map_err(|e| DownloadError::from_io_error(&e.error))?;
        Ok(())
    }
}
