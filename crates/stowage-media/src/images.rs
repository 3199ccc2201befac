//! Compressed image storage with optional thumbnails.
//!
//! Originals live under the resolver's segments; thumbnails live in a
//! `thumbnail` subdirectory next to them under the same name:
//!
//! ```text
//! <root>/<segments>/<name>
//! <root>/<segments>/thumbnail/<name>
//! ```

use std::path::{Path, PathBuf};

use chrono::Utc;
use image::DynamicImage;
use tracing::{debug, warn};

use stowage_core::paths::{DEFAULT_ROOT_SEGMENT, StorageResolver, StoreLocation};

use crate::compress::{Size, encode_jpeg};
use crate::error::{MediaError, MediaResult};
use crate::files::FileStore;

/// Subdirectory holding thumbnails.
pub const THUMBNAIL_SEGMENT: &str = "thumbnail";

/// Thumbnails are encoded at this fraction of the configured quality.
const THUMBNAIL_QUALITY_FACTOR: f32 = 0.9;

/// Which stored rendition of an image to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageVariant {
    #[default]
    Original,
    Thumbnail,
}

/// Sizing and quality settings for an [`ImageStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStoreConfig {
    /// Bounding box for originals. Zero components are unconstrained.
    pub max_size: Size,
    /// Bounding box for thumbnails.
    pub thumbnail_max_size: Size,
    /// Compression quality in `[0, 1]`.
    pub quality: f32,
    /// Skip thumbnail generation and serve originals for thumbnail lookups.
    pub ignore_thumbnail: bool,
}

impl Default for ImageStoreConfig {
    fn default() -> Self {
        Self {
            max_size: Size::ZERO,
            thumbnail_max_size: Size::ZERO,
            quality: 1.0,
            ignore_thumbnail: true,
        }
    }
}

impl ImageStoreConfig {
    #[must_use]
    pub const fn with_max_size(mut self, size: Size) -> Self {
        self.max_size = size;
        self
    }

    /// Enable thumbnails bounded by `size`.
    #[must_use]
    pub const fn with_thumbnails(mut self, size: Size) -> Self {
        self.thumbnail_max_size = size;
        self.ignore_thumbnail = false;
        self
    }

    #[must_use]
    pub const fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }
}

/// Stores images as JPEG files by name.
#[derive(Debug, Clone)]
pub struct ImageStore {
    originals: FileStore,
    thumbnails: FileStore,
    config: ImageStoreConfig,
}

impl ImageStore {
    pub fn new(resolver: StorageResolver, config: ImageStoreConfig) -> Self {
        let thumbnails = resolver.clone().with_segment(THUMBNAIL_SEGMENT);
        Self {
            originals: FileStore::new(resolver),
            thumbnails: FileStore::new(thumbnails),
            config,
        }
    }

    /// Store under `<location>/stowage/UserDocuments`.
    pub fn at_location(location: StoreLocation, config: ImageStoreConfig) -> MediaResult<Self> {
        let resolver = StorageResolver::new(location.default_root()?).with_segment(DEFAULT_ROOT_SEGMENT);
        Ok(Self::new(resolver, config))
    }

    /// Resolver for originals.
    pub const fn resolver(&self) -> &StorageResolver {
        self.originals.resolver()
    }

    pub const fn config(&self) -> &ImageStoreConfig {
        &self.config
    }

    fn store_for(&self, variant: ImageVariant) -> &FileStore {
        match variant {
            ImageVariant::Thumbnail if !self.config.ignore_thumbnail => &self.thumbnails,
            _ => &self.originals,
        }
    }

    /// Path of `name` in the given variant.
    ///
    /// Thumbnail lookups resolve to the original when thumbnails are ignored.
    pub fn path_for(&self, name: &str, variant: ImageVariant) -> MediaResult<PathBuf> {
        self.store_for(variant).path_for(name)
    }

    /// Whether an original exists for `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.originals.exists(name)
    }

    /// Decode the stored image, or `None` when it does not exist.
    pub fn load(&self, name: &str, variant: ImageVariant) -> MediaResult<Option<DynamicImage>> {
        let Some(bytes) = self.store_for(variant).load(name)? else {
            return Ok(None);
        };
        Ok(Some(image::load_from_memory(&bytes)?))
    }

    /// Save under a generated `<micros>.jpg` name and return the name.
    pub fn save(&self, image: &DynamicImage) -> MediaResult<String> {
        let mut stamp = Utc::now().timestamp_micros();
        let mut name = format!("{stamp}.jpg");
        while self.exists(&name) {
            stamp += 1;
            name = format!("{stamp}.jpg");
        }
        self.save_named(image, &name)?;
        Ok(name)
    }

    /// Compress and save `image` as `name`, plus a thumbnail unless ignored.
    pub fn save_named(&self, image: &DynamicImage, name: &str) -> MediaResult<()> {
        let original = encode_jpeg(image, self.config.max_size, self.config.quality)?;
        let path = self.originals.save(&original, name)?;
        debug!(path = %path.display(), "Saved image");

        if self.config.ignore_thumbnail {
            return Ok(());
        }

        let thumbnail = encode_jpeg(
            image,
            self.config.thumbnail_max_size,
            self.config.quality * THUMBNAIL_QUALITY_FACTOR,
        )?;
        self.thumbnails.save(&thumbnail, name)?;
        Ok(())
    }

    /// Delete the original and thumbnail.
    ///
    /// Both deletions are attempted; the first failure is returned.
    pub fn delete(&self, name: &str) -> MediaResult<()> {
        let original = self.originals.delete(name);
        if self.config.ignore_thumbnail {
            return original;
        }
        let thumbnail = self.thumbnails.delete(name);
        first_failure(name, original, thumbnail)
    }

    /// Rename the original and thumbnail.
    ///
    /// Both renames are attempted; the first failure is returned.
    pub fn rename(&self, old: &str, new: &str) -> MediaResult<()> {
        let original = self.originals.rename(old, new).map(drop);
        if self.config.ignore_thumbnail {
            return original;
        }
        let thumbnail = self.thumbnails.rename(old, new).map(drop);
        first_failure(old, original, thumbnail)
    }
}

/// Decode an image file from anywhere on disk.
pub fn open_image(path: &Path) -> MediaResult<DynamicImage> {
    if !path.is_file() {
        return Err(MediaError::NotFound(path.to_path_buf()));
    }
    Ok(image::open(path)?)
}

fn first_failure(name: &str, original: MediaResult<()>, thumbnail: MediaResult<()>) -> MediaResult<()> {
    match (original, thumbnail) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), other) => {
            if let Err(thumb) = other {
                warn!(name, error = %thumb, "Thumbnail operation also failed");
            }
            Err(e)
        }
        (Ok(()), Err(e)) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};
    use tempfile::tempdir;

    fn picture(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([u8::try_from(x % 256).unwrap(), u8::try_from(y % 256).unwrap(), 128])
        }))
    }

    #[test]
    fn thumbnail_lookup_falls_back_when_ignored() {
        let store = ImageStore::new(StorageResolver::new("/store"), ImageStoreConfig::default());
        assert_eq!(
            store.path_for("a.jpg", ImageVariant::Thumbnail).unwrap(),
            PathBuf::from("/store/a.jpg")
        );
    }

    #[test]
    fn thumbnails_live_in_subdirectory() {
        let config = ImageStoreConfig::default().with_thumbnails(Size::new(10, 10));
        let store = ImageStore::new(StorageResolver::new("/store").with_segment("UserDocuments"), config);
        assert_eq!(
            store.path_for("a.jpg", ImageVariant::Thumbnail).unwrap(),
            PathBuf::from("/store/UserDocuments/thumbnail/a.jpg")
        );
    }

    #[test]
    fn save_named_writes_both_variants() {
        let temp = tempdir().unwrap();
        let config = ImageStoreConfig::default()
            .with_max_size(Size::new(40, 0))
            .with_thumbnails(Size::new(10, 10))
            .with_quality(0.7);
        let store = ImageStore::new(StorageResolver::new(temp.path()), config);

        store.save_named(&picture(80, 40), "p.jpg").unwrap();

        let original = store.load("p.jpg", ImageVariant::Original).unwrap().unwrap();
        let thumbnail = store.load("p.jpg", ImageVariant::Thumbnail).unwrap().unwrap();
        assert_eq!(original.dimensions(), (40, 20));
        assert_eq!(thumbnail.dimensions(), (10, 5));
    }

    #[test]
    fn save_generates_jpg_name() {
        let temp = tempdir().unwrap();
        let store = ImageStore::new(StorageResolver::new(temp.path()), ImageStoreConfig::default());

        let first = store.save(&picture(4, 4)).unwrap();
        let second = store.save(&picture(4, 4)).unwrap();

        assert!(
            Path::new(&first).extension().is_some_and(|ext| ext == "jpg"),
            "{first}"
        );
        assert!(first.trim_end_matches(".jpg").parse::<i64>().is_ok());
        assert_ne!(first, second);
        assert!(store.exists(&first));
        assert!(!temp.path().join(THUMBNAIL_SEGMENT).exists());
    }
}
