//! Store directory preparation.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::error::PathError;

/// What to do when a store directory is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryCreationStrategy {
    /// Create directories automatically if they are missing.
    #[default]
    AutoCreate,
    /// Do not create directories; return an error if missing.
    Disallow,
}

/// Make sure `path` is a writable directory, creating it if `strategy` allows.
pub fn ensure_directory(path: &Path, strategy: DirectoryCreationStrategy) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
    } else {
        match strategy {
            DirectoryCreationStrategy::AutoCreate => {
                fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            }
            DirectoryCreationStrategy::Disallow => {
                return Err(PathError::DirectoryNotFound(path.to_path_buf()));
            }
        }
    }

    verify_writable(path)
}

/// Write and remove a probe file in `path`.
pub fn verify_writable(path: &Path) -> Result<(), PathError> {
    let probe = path.join(".stowage_write_probe");
    let not_writable = |reason: String| PathError::NotWritable {
        path: path.to_path_buf(),
        reason,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&probe)
        .map_err(|e| not_writable(e.to_string()))?;
    file.write_all(b"probe")
        .map_err(|e| not_writable(e.to_string()))?;
    drop(file);
    let _ = fs::remove_file(&probe);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_missing_directory() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("a").join("b");

        ensure_directory(&target, DirectoryCreationStrategy::AutoCreate).unwrap();

        assert!(target.is_dir());
        assert!(!target.join(".stowage_write_probe").exists());
    }

    #[test]
    fn disallow_reports_missing_directory() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("missing");

        let err = ensure_directory(&target, DirectoryCreationStrategy::Disallow).unwrap_err();
        assert!(matches!(err, PathError::DirectoryNotFound(_)));
    }

    #[test]
    fn file_in_place_of_directory_is_rejected() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("file");
        std::fs::write(&target, b"x").unwrap();

        let err = ensure_directory(&target, DirectoryCreationStrategy::AutoCreate).unwrap_err();
        assert!(matches!(err, PathError::NotADirectory(_)));
    }
}
