//! Moving finished payloads into the store.
//!
//! Plans the destination through the storage resolver and commits the move:
//! create parent directories, replace any existing file, rename, and fall back
//! to copy + remove when the rename crosses filesystems.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use stowage_core::download::DownloadError;
use stowage_core::paths::StorageResolver;

/// A planned move of a temporary payload to its store path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadPlacement {
    /// Temporary payload written by the transport.
    pub source: PathBuf,
    /// Resolved store path.
    pub destination: PathBuf,
}

impl PayloadPlacement {
    /// Plan the placement of `source` under `file_name`.
    pub fn plan(
        resolver: &StorageResolver,
        file_name: &str,
        source: impl Into<PathBuf>,
    ) -> Result<Self, DownloadError> {
        let destination = resolver
            .resolve(file_name)
            .map_err(|e| DownloadError::invalid_file_name(file_name, e.to_string()))?;
        Ok(Self {
            source: source.into(),
            destination,
        })
    }

    /// Ensure the destination's parent directory exists.
    pub async fn ensure_dir(&self) -> Result<(), DownloadError> {
        if let Some(parent) = self.destination.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.move_failed(&e))?;
        }
        Ok(())
    }

    /// Move the payload to its destination.
    ///
    /// On failure any partial destination file is removed. The source is left
    /// alone so the caller can discard it after reporting the failure.
    pub async fn commit(&self) -> Result<PathBuf, DownloadError> {
        self.ensure_dir().await?;

        match fs::remove_file(&self.destination).await {
            Ok(()) => debug!(path = %self.destination.display(), "Replacing existing file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.move_failed(&e)),
        }

        if let Err(rename_err) = fs::rename(&self.source, &self.destination).await {
            if rename_err.kind() == io::ErrorKind::NotFound {
                return Err(self.move_failed(&rename_err));
            }
            debug!(
                error = %rename_err,
                "Rename failed, falling back to copy"
            );
            if let Err(copy_err) = fs::copy(&self.source, &self.destination).await {
                remove_quietly(&self.destination).await;
                return Err(self.move_failed(&copy_err));
            }
            remove_quietly(&self.source).await;
        }

        Ok(self.destination.clone())
    }

    /// Best-effort removal of the temporary payload.
    pub async fn discard_source(&self) {
        remove_quietly(&self.source).await;
    }

    fn move_failed(&self, err: &io::Error) -> DownloadError {
        DownloadError::storage_move_failed(self.destination.display().to_string(), err.to_string())
    }
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}
