//! Default image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Resolution | custom JFIF / pHYs reader ([`resolution`](super::resolution)) |
//! | Resize | `DynamicImage::resize_exact` with the configured filter |
//! | Encode → JPEG | `mozjpeg` (progressive, optimized Huffman tables) |
//! | Encode → PNG | `lodepng` (Adam7 interlaced, no ancillary chunks) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::encode::{encode_jpeg, encode_png};
use super::params::{JpegOptions, PngOptions, ResizeFilter};
use super::resolution::{Resolution, read_resolution};
use crate::config::Config;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader, Limits};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Default ceiling on decoder allocations: 1 GiB.
pub const DEFAULT_MAX_ALLOC: u64 = 1024 * 1024 * 1024;

/// A decoded image plus the density its source file recorded.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: DynamicImage,
    pub resolution: Resolution,
}

/// Backend built on the `image` crate ecosystem plus `mozjpeg`.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend {
    filter: ResizeFilter,
    max_alloc: u64,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            filter: ResizeFilter::default(),
            max_alloc: DEFAULT_MAX_ALLOC,
        }
    }

    /// Backend tuned by the `[resize]` and `[limits]` config sections.
    pub fn from_config(config: &Config) -> Self {
        Self {
            filter: config.resize.filter,
            max_alloc: config.limits.max_alloc_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_max_alloc(mut self, bytes: u64) -> Self {
        self.max_alloc = bytes;
        self
    }

    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_alloc);
        limits
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes per pixel of the f32 RGBA buffer the resampler works in.
const WORKING_BYTES_PER_PIXEL: u64 = 16;

/// Estimate what `resize_exact` allocates for `target`: the output buffer
/// plus the intermediate of the vertical pass, which is one source row wide.
///
/// `None` when the estimate itself overflows.
fn resize_allocation(source: &DynamicImage, target: Dimensions) -> Option<u64> {
    let output = u64::from(target.width)
        .checked_mul(u64::from(target.height))?
        .checked_mul(u64::from(source.color().bytes_per_pixel()))?;
    let working = u64::from(source.width())
        .checked_mul(u64::from(target.height))?
        .checked_mul(WORKING_BYTES_PER_PIXEL)?;
    output.checked_add(working)
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path, limits: Limits) -> Result<DynamicImage, BackendError> {
    let mut reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.limits(limits);
    reader.decode().map_err(|e| match e {
        ImageError::Limits(limit) => {
            BackendError::LimitExceeded(format!("{}: {}", path.display(), limit))
        }
        ImageError::IoError(io) => BackendError::Io(io),
        other => {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), other))
        }
    })
}

impl ImageBackend for RustBackend {
    type Resource = DecodedImage;

    fn open(&self, path: &Path) -> Result<DecodedImage, BackendError> {
        let pixels = load_image(path, self.limits())?;
        Ok(DecodedImage {
            pixels,
            resolution: read_resolution(path),
        })
    }

    fn dimensions(&self, resource: &DecodedImage) -> Dimensions {
        Dimensions {
            width: resource.pixels.width(),
            height: resource.pixels.height(),
        }
    }

    fn resolution(&self, resource: &DecodedImage) -> Resolution {
        resource.resolution
    }

    fn resize(
        &self,
        resource: &DecodedImage,
        target: Dimensions,
    ) -> Result<DecodedImage, BackendError> {
        if target.width == 0 || target.height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "Cannot resize to {}x{}",
                target.width, target.height
            )));
        }
        match resize_allocation(&resource.pixels, target) {
            Some(bytes) if bytes <= self.max_alloc => {}
            estimate => {
                return Err(BackendError::LimitExceeded(format!(
                    "resize to {}x{} needs {} bytes, limit is {}",
                    target.width,
                    target.height,
                    estimate.map_or_else(|| "more than u64::MAX".to_string(), |b| b.to_string()),
                    self.max_alloc
                )));
            }
        }
        let pixels = resource.pixels.resize_exact(
            target.width,
            target.height,
            self.filter.to_image_filter(),
        );
        Ok(DecodedImage {
            pixels,
            resolution: resource.resolution,
        })
    }

    fn jpeg_save(
        &self,
        resource: &DecodedImage,
        path: &Path,
        opts: &JpegOptions,
    ) -> Result<(), BackendError> {
        let bytes = encode_jpeg(&resource.pixels, opts)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn png_save(
        &self,
        resource: &DecodedImage,
        path: &Path,
        opts: &PngOptions,
    ) -> Result<(), BackendError> {
        let bytes = encode_png(&resource.pixels, opts)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
