//! Store directory resolution.
//!
//! The store root is where finished downloads and saved media live. It is
//! resolved from an explicit path, the environment, or a platform default.

use std::env;
use std::path::PathBuf;

use super::error::PathError;
use super::platform::{data_root, normalize_user_path};

/// Environment variable overriding the store root.
pub const STORE_DIR_ENV: &str = "STOWAGE_STORE_DIR";

/// Default segment under a store location for user-visible assets.
pub const DEFAULT_ROOT_SEGMENT: &str = "UserDocuments";

/// Which platform directory a store lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreLocation {
    /// Durable user documents.
    #[default]
    Documents,
    /// Caches the system may purge.
    Caches,
}

impl StoreLocation {
    /// Platform directory for this location.
    ///
    /// Falls back to `~/Documents` and `~/.cache` when the platform does not
    /// report one.
    pub fn base_dir(self) -> Result<PathBuf, PathError> {
        let platform = match self {
            Self::Documents => dirs::document_dir(),
            Self::Caches => dirs::cache_dir(),
        };
        if let Some(dir) = platform {
            return Ok(dir);
        }

        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        Ok(match self {
            Self::Documents => home.join("Documents"),
            Self::Caches => home.join(".cache"),
        })
    }

    /// Default store root for this location (`<base>/stowage`).
    pub fn default_root(self) -> Result<PathBuf, PathError> {
        Ok(self.base_dir()?.join("stowage"))
    }
}

/// How the store directory was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDirSource {
    /// The user passed an explicit path (e.g., CLI flag).
    Explicit,
    /// The path came from environment variables / `.env`.
    EnvVar,
    /// Fallback default under the platform documents directory.
    Default,
}

/// Resolution result for the store directory.
#[derive(Debug, Clone)]
pub struct StoreDirResolution {
    /// The resolved path to the store root.
    pub path: PathBuf,
    /// How the path was determined.
    pub source: StoreDirSource,
}

/// Resolve the store directory from an explicit override, env var, or default.
///
/// Resolution order:
/// 1. Explicit path provided by caller (highest priority)
/// 2. `STOWAGE_STORE_DIR` environment variable
/// 3. `<documents>/stowage`
pub fn resolve_store_dir(explicit: Option<&str>) -> Result<StoreDirResolution, PathError> {
    if let Some(path_str) = explicit {
        return Ok(StoreDirResolution {
            path: normalize_user_path(path_str)?,
            source: StoreDirSource::Explicit,
        });
    }

    if let Ok(env_path) = env::var(STORE_DIR_ENV) {
        if !env_path.trim().is_empty() {
            return Ok(StoreDirResolution {
                path: normalize_user_path(&env_path)?,
                source: StoreDirSource::EnvVar,
            });
        }
    }

    Ok(StoreDirResolution {
        path: StoreLocation::Documents.default_root()?,
        source: StoreDirSource::Default,
    })
}

/// Directory the HTTP transport keeps journals and partial payloads in.
pub fn transport_work_dir() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("transfers"))
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::with_env;
    use super::*;

    #[test]
    fn explicit_wins_over_env() {
        let resolved = with_env(&[(STORE_DIR_ENV, Some("/tmp/from-env"))], || {
            resolve_store_dir(Some("/tmp/explicit")).unwrap()
        });
        assert_eq!(resolved.source, StoreDirSource::Explicit);
        assert!(resolved.path.ends_with("explicit"));
    }

    #[test]
    fn env_value_is_used() {
        let resolved = with_env(&[(STORE_DIR_ENV, Some("/tmp/from-env"))], || {
            resolve_store_dir(None).unwrap()
        });
        assert_eq!(resolved.source, StoreDirSource::EnvVar);
        assert!(resolved.path.ends_with("from-env"));
    }

    #[test]
    fn blank_env_falls_back_to_default() {
        let resolved = with_env(&[(STORE_DIR_ENV, Some("  "))], || resolve_store_dir(None).unwrap());
        assert_eq!(resolved.source, StoreDirSource::Default);
        assert!(resolved.path.ends_with("stowage"));
    }

    #[test]
    fn work_dir_lives_under_data_root() {
        let temp = tempfile::tempdir().unwrap();
        let work_dir = with_env(&[("STOWAGE_DATA_DIR", temp.path().to_str())], || {
            transport_work_dir().unwrap()
        });
        assert_eq!(work_dir, temp.path().join("transfers"));
    }

    #[test]
    fn caches_and_documents_differ() {
        assert_ne!(
            StoreLocation::Documents.default_root().unwrap(),
            StoreLocation::Caches.default_root().unwrap()
        );
    }
}
