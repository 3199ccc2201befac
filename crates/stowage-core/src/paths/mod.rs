//! Path utilities for stowage data directories and user-configurable locations.
//!
//! This module provides the canonical path resolution for all stowage components:
//! - Store root (documents or caches, overridable)
//! - Transport work directory (journals and temporary payloads)
//! - The storage resolver that maps logical file names onto the store
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - OS-specific logic is kept private in `platform`

mod ensure;
mod error;
mod platform;
mod resolver;
mod store;

#[cfg(test)]
mod test_utils;

// Error type
pub use error::PathError;

// Platform roots
pub use platform::data_root;

// Store directory
pub use store::{
    DEFAULT_ROOT_SEGMENT, STORE_DIR_ENV, StoreDirResolution, StoreDirSource, StoreLocation,
    resolve_store_dir, transport_work_dir,
};

// Directory operations
pub use ensure::{DirectoryCreationStrategy, ensure_directory, verify_writable};

// Pure name-to-path mapping
pub use resolver::{StorageResolver, validate_file_name};
