//! The image handle.
//!
//! An [`Image`] owns one decoded resource plus two pieces of deferred
//! configuration: a pending scale factor and the encode quality. Mutations
//! only record intent. Pixels change when a save runs the pipeline:
//!
//! ```text
//! new_from_file ──▶ resize / quality (any number, chainable)
//!                          │
//!                          ▼
//!               jpeg_save / png_save
//!               1. apply pending scale (replaces the resource)
//!               2. encode with the fixed web profile
//!               3. optionally release (AfterSave::Close)
//! ```
//!
//! A resource is released exactly once, by whichever of [`Image::close`],
//! [`AfterSave::Close`] or `Drop` comes first.

use crate::error::{Error, Result};
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, JpegOptions, PngOptions, Quality, RustBackend,
    Scale, calculate_scale, calculate_scaled_dimensions,
};
use crate::lifecycle;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// What a save does with the resource once the file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterSave {
    #[default]
    Keep,
    Close,
}

/// An opaque handle to one decoded image.
pub struct Image<B: ImageBackend = RustBackend> {
    resource: Option<B::Resource>,
    pending_scale: Scale,
    quality: Quality,
    id: u64,
    backend: B,
}

impl Image<RustBackend> {
    /// Decode `path` with the default backend.
    pub fn new_from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new_from_file_with(RustBackend::new(), path)
    }
}

impl<B: ImageBackend> Image<B> {
    /// Decode `path` with an explicit backend.
    ///
    /// Fails with [`Error::Init`] unless the library is live. Decode failures
    /// produce no handle.
    pub fn new_from_file_with(backend: B, path: impl AsRef<Path>) -> Result<Self> {
        lifecycle::ensure_live()?;
        let path = path.as_ref();
        let resource = backend.open(path)?;
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let size = backend.dimensions(&resource);
        debug!(id, path = %path.display(), width = size.width, height = size.height, "opened image");
        Ok(Self {
            resource: Some(resource),
            pending_scale: Scale::IDENTITY,
            quality: Quality::default(),
            id,
            backend,
        })
    }

    fn live_resource(&self) -> Result<&B::Resource> {
        self.resource.as_ref().ok_or(Error::Closed)
    }

    /// Record a resize to be applied at the next save.
    ///
    /// `0` leaves a dimension unspecified. With both given the image is
    /// scaled to cover the box; `(0, 0)` changes nothing.
    pub fn resize(&mut self, width: i64, height: i64) -> Result<&mut Self> {
        let target = (to_dimension("width", width)?, to_dimension("height", height)?);
        let size = self.backend.dimensions(self.live_resource()?);
        if let Some(factor) = calculate_scale(size.into(), target) {
            self.pending_scale = Scale::new(factor).ok_or_else(|| {
                Error::Validation(format!("cannot scale {}x{} to {}x{}", size.width, size.height, width, height))
            })?;
            debug!(id = self.id, factor, "pending resize");
        }
        Ok(self)
    }

    /// Set the encode quality used by [`jpeg_save`](Self::jpeg_save).
    pub fn quality(&mut self, quality: i64) -> Result<&mut Self> {
        self.quality = Quality::new(quality).ok_or_else(|| {
            Error::Validation(format!("quality must be between 0 and 100, got {quality}"))
        })?;
        Ok(self)
    }

    /// Current pixel dimensions. A pending resize is not reflected until saved.
    pub fn get_size(&self) -> Result<(u32, u32)> {
        Ok(self.backend.dimensions(self.live_resource()?).into())
    }

    /// Horizontal and vertical resolution in pixels per inch.
    pub fn get_res(&self) -> Result<(u32, u32)> {
        let res = self.backend.resolution(self.live_resource()?);
        Ok((res.x, res.y))
    }

    pub fn get_quality(&self) -> u8 {
        self.quality.value()
    }

    pub fn pending_scale(&self) -> f64 {
        self.pending_scale.factor()
    }

    pub fn is_closed(&self) -> bool {
        self.resource.is_none()
    }

    /// Release the resource. Safe to call any number of times.
    pub fn close(&mut self) {
        self.release();
    }

    /// Apply any pending resize and write a progressive JPEG.
    pub fn jpeg_save(&mut self, path: impl AsRef<Path>, after: AfterSave) -> Result<()> {
        let opts = JpegOptions::web(self.quality);
        self.save(path.as_ref(), after, |backend, resource, path| {
            backend.jpeg_save(resource, path, &opts)
        })
    }

    /// Apply any pending resize and write an interlaced PNG. Quality is ignored.
    pub fn png_save(&mut self, path: impl AsRef<Path>, after: AfterSave) -> Result<()> {
        let opts = PngOptions::web();
        self.save(path.as_ref(), after, |backend, resource, path| {
            backend.png_save(resource, path, &opts)
        })
    }

    fn save<F>(&mut self, path: &Path, after: AfterSave, encode: F) -> Result<()>
    where
        F: FnOnce(&B, &B::Resource, &Path) -> Result<(), BackendError>,
    {
        lifecycle::ensure_live()?;
        self.apply_pending_scale()?;
        encode(&self.backend, self.live_resource()?, path)?;
        debug!(id = self.id, path = %path.display(), "saved image");
        if after == AfterSave::Close {
            self.release();
        }
        Ok(())
    }

    /// Bake the pending scale into a new resource and release the old one.
    fn apply_pending_scale(&mut self) -> Result<()> {
        let resource = self.live_resource()?;
        if self.pending_scale.is_identity() {
            return Ok(());
        }
        let source = self.backend.dimensions(resource);
        let (width, height) =
            calculate_scaled_dimensions(source.into(), self.pending_scale.factor());
        let resized = self.backend.resize(resource, Dimensions { width, height })?;
        debug!(
            id = self.id,
            from = %format!("{}x{}", source.width, source.height),
            to = %format!("{width}x{height}"),
            "applied pending resize"
        );
        if let Some(old) = self.resource.replace(resized) {
            self.backend.release(old);
        }
        self.pending_scale = Scale::IDENTITY;
        Ok(())
    }

    fn release(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.backend.release(resource);
            debug!(id = self.id, "released image");
        }
    }
}

fn to_dimension(name: &str, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(Error::Validation(format!("{name} must be non-negative, got {value}")));
    }
    u32::try_from(value).map_err(|_| Error::Validation(format!("{name} too large: {value}")))
}

impl<B: ImageBackend> Drop for Image<B> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<B: ImageBackend> fmt::Display for Image<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image-handle: #{}", self.id)
    }
}

impl<B: ImageBackend> fmt::Debug for Image<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("id", &self.id)
            .field("size", &self.get_size().ok())
            .field("pending_scale", &self.pending_scale.factor())
            .field("quality", &self.quality.value())
            .field("closed", &self.is_closed())
            .finish()
    }
}
