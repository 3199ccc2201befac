//! File and image stores rooted in the stowage file store.
//!
//! [`FileStore`] maps logical names to files under a [`StorageResolver`] and
//! reads, writes, renames and deletes them. [`ImageStore`] layers JPEG
//! compression and optional thumbnails on top.
//!
//! [`StorageResolver`]: stowage_core::paths::StorageResolver

pub mod compress;
pub mod error;
pub mod files;
pub mod images;

pub use compress::{Size, encode_jpeg, fit_within, jpeg_quality};
pub use error::{MediaError, MediaResult};
pub use files::FileStore;
pub use image::DynamicImage;
pub use images::{ImageStore, ImageStoreConfig, ImageVariant, THUMBNAIL_SEGMENT, open_image};
