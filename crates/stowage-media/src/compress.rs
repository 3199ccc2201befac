//! Aspect-preserving downscaling and JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::error::MediaResult;

/// Pixel dimensions. A zero component means "unconstrained" when used as a
/// maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Self = Self::new(0, 0);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_zero(self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// Fit `actual` inside `max`, keeping the aspect ratio.
///
/// Both maximums zero keeps the size. One zero maximum is derived from the
/// other through the image's aspect ratio. Images are only ever shrunk.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_within(actual: Size, max: Size) -> Size {
    if max.is_zero() || actual.width == 0 || actual.height == 0 {
        return actual;
    }

    let (aw, ah) = (f64::from(actual.width), f64::from(actual.height));
    let (mw, mh) = match (max.width, max.height) {
        (w, 0) => (f64::from(w), f64::from(w) * ah / aw),
        (0, h) => (f64::from(h) * aw / ah, f64::from(h)),
        (w, h) => (f64::from(w), f64::from(h)),
    };

    if aw <= mw && ah <= mh {
        return actual;
    }

    let image_ratio = aw / ah;
    let max_ratio = mw / mh;
    let (w, h) = if image_ratio < max_ratio {
        (aw * mh / ah, mh)
    } else if image_ratio > max_ratio {
        (mw, ah * mw / aw)
    } else {
        (mw, mh)
    };

    Size::new((w.round() as u32).max(1), (h.round() as u32).max(1))
}

/// Map a `[0, 1]` quality factor to a JPEG quality in `1..=100`.
///
/// Out-of-range factors are clamped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn jpeg_quality(quality: f32) -> u8 {
    let clamped = if quality.is_nan() { 1.0 } else { quality.clamp(0.0, 1.0) };
    ((clamped * 100.0).round() as u8).max(1)
}

/// Downscale `image` to fit `max` and encode it as JPEG.
pub fn encode_jpeg(image: &DynamicImage, max: Size, quality: f32) -> MediaResult<Vec<u8>> {
    let (width, height) = image.dimensions();
    let target = fit_within(Size::new(width, height), max);

    let resized = if target == Size::new(width, height) {
        image.to_rgb8()
    } else {
        image
            .resize_exact(target.width, target.height, FilterType::Triangle)
            .to_rgb8()
    };

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, jpeg_quality(quality)).encode_image(&resized)?;
    Ok(out)
}
