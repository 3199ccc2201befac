//! Named files under a storage resolver.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use stowage_core::paths::StorageResolver;

use crate::error::{MediaError, MediaResult};

/// Reads and writes files by logical name.
#[derive(Debug, Clone)]
pub struct FileStore {
    resolver: StorageResolver,
}

impl FileStore {
    pub const fn new(resolver: StorageResolver) -> Self {
        Self { resolver }
    }

    pub const fn resolver(&self) -> &StorageResolver {
        &self.resolver
    }

    /// Absolute path for `name`. Does not touch the filesystem.
    pub fn path_for(&self, name: &str) -> MediaResult<PathBuf> {
        Ok(self.resolver.resolve(name)?)
    }

    /// Contents of `name`, or `None` when no such file exists.
    pub fn load(&self, name: &str) -> MediaResult<Option<Vec<u8>>> {
        let path = self.path_for(name)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MediaError::io(path, e)),
        }
    }

    /// Write `data` to `name`, replacing any existing file.
    ///
    /// Missing directories are created. Readers never observe a partial file.
    pub fn save(&self, data: &[u8], name: &str) -> MediaResult<PathBuf> {
        let path = self.path_for(name)?;
        let dir = ensure_parent(&path)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| MediaError::io(dir, e))?;
        tmp.write_all(data).map_err(|e| MediaError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| MediaError::io(&path, e.error))?;

        debug!(path = %path.display(), bytes = data.len(), "Saved file");
        Ok(path)
    }

    /// Remove `name`. A missing file is not an error.
    pub fn delete(&self, name: &str) -> MediaResult<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::io(path, e)),
        }
    }

    /// Rename `old` to `new`, replacing any file already called `new`.
    pub fn rename(&self, old: &str, new: &str) -> MediaResult<PathBuf> {
        let from = self.path_for(old)?;
        let to = self.path_for(new)?;
        if !from.is_file() {
            return Err(MediaError::NotFound(from));
        }
        ensure_parent(&to)?;
        fs::rename(&from, &to).map_err(|e| MediaError::io(&from, e))?;
        Ok(to)
    }

    /// Whether a file exists for `name`. Invalid names never exist.
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }
}

fn ensure_parent(path: &Path) -> MediaResult<&Path> {
    let Some(dir) = path.parent() else {
        return Err(MediaError::NotFound(path.to_path_buf()));
    };
    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(|e| MediaError::io(dir, e))?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(root: &Path) -> FileStore {
        FileStore::new(StorageResolver::new(root).with_segment("UserDocuments"))
    }

    #[test]
    fn save_creates_directories_and_load_reads_back() {
        let temp = tempdir().unwrap();
        let files = store(temp.path());

        let path = files.save(b"hello", "note.txt").unwrap();

        assert_eq!(path, temp.path().join("UserDocuments").join("note.txt"));
        assert_eq!(files.load("note.txt").unwrap().as_deref(), Some(&b"hello"[..]));
        assert!(files.exists("note.txt"));
    }

    #[test]
    fn save_replaces_existing() {
        let temp = tempdir().unwrap();
        let files = store(temp.path());
        files.save(b"old", "a").unwrap();
        files.save(b"new", "a").unwrap();
        assert_eq!(files.load("a").unwrap().unwrap(), b"new");
    }

    #[test]
    fn load_missing_is_none() {
        let temp = tempdir().unwrap();
        assert!(store(temp.path()).load("nothing").unwrap().is_none());
    }

    #[test]
    fn delete_missing_is_ok() {
        let temp = tempdir().unwrap();
        let files = store(temp.path());
        files.delete("nothing").unwrap();

        files.save(b"x", "a").unwrap();
        files.delete("a").unwrap();
        assert!(!files.exists("a"));
    }

    #[test]
    fn rename_moves_file() {
        let temp = tempdir().unwrap();
        let files = store(temp.path());
        files.save(b"x", "a").unwrap();

        files.rename("a", "b").unwrap();

        assert!(!files.exists("a"));
        assert_eq!(files.load("b").unwrap().unwrap(), b"x");
    }

    #[test]
    fn rename_missing_is_not_found() {
        let temp = tempdir().unwrap();
        let err = store(temp.path()).rename("a", "b").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_names_are_rejected() {
        let temp = tempdir().unwrap();
        let files = store(temp.path());
        assert!(matches!(files.path_for(""), Err(MediaError::Path(_))));
        assert!(matches!(files.save(b"x", "../x"), Err(MediaError::Path(_))));
        assert!(!files.exists(""));
    }
}
