//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the black box an [`Image`](crate::Image)
//! handle calls into: decode a file into a resource, report its geometry,
//! produce a resized copy, and encode it to JPEG or PNG.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Handles are generic
//! over the backend so the lifecycle and pipeline logic can be tested
//! against the recording mock below without touching pixels.

use super::params::{JpegOptions, PngOptions};
use super::resolution::Resolution;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    ProcessingFailed(String),
    #[error("memory limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for (u32, u32) {
    fn from(d: Dimensions) -> Self {
        (d.width, d.height)
    }
}

/// Trait for image processing backends.
///
/// A backend owns no per-image state: everything about one image lives in
/// its [`Resource`](ImageBackend::Resource), which the handle owns
/// exclusively and hands back through [`release`](ImageBackend::release)
/// exactly once.
pub trait ImageBackend: Sync {
    /// One decoded image.
    type Resource;

    /// Decode the file at `path` in a single forward pass.
    fn open(&self, path: &Path) -> Result<Self::Resource, BackendError>;

    /// Current pixel dimensions of a resource.
    fn dimensions(&self, resource: &Self::Resource) -> Dimensions;

    /// Resolution the source file recorded, carried across resizes.
    fn resolution(&self, resource: &Self::Resource) -> Resolution;

    /// Produce a new resource scaled to exactly `target`.
    fn resize(
        &self,
        resource: &Self::Resource,
        target: Dimensions,
    ) -> Result<Self::Resource, BackendError>;

    /// Encode a resource as JPEG and write it to `path`.
    fn jpeg_save(
        &self,
        resource: &Self::Resource,
        path: &Path,
        opts: &JpegOptions,
    ) -> Result<(), BackendError>;

    /// Encode a resource as PNG and write it to `path`.
    fn png_save(
        &self,
        resource: &Self::Resource,
        path: &Path,
        opts: &PngOptions,
    ) -> Result<(), BackendError>;

    /// Free a resource. The default simply drops it.
    fn release(&self, resource: Self::Resource) {
        drop(resource);
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock backend that records operations without executing them.
    ///
    /// Clones share one operation log, so a test can keep a clone to inspect
    /// after moving the backend into a handle.
    #[derive(Clone, Default)]
    pub struct MockBackend {
        pub operations: Arc<Mutex<Vec<RecordedOp>>>,
        pub open_result: Option<(Dimensions, Resolution)>,
        pub fail_resize: bool,
        pub fail_encode: bool,
    }

    /// Stand-in for a decoded image.
    #[derive(Debug, Clone, PartialEq)]
    pub struct MockResource {
        pub source: String,
        pub dimensions: Dimensions,
        pub resolution: Resolution,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Open(String),
        Resize {
            from: Dimensions,
            to: Dimensions,
        },
        JpegSave {
            output: String,
            dimensions: Dimensions,
            quality: u8,
        },
        PngSave {
            output: String,
            dimensions: Dimensions,
            interlace: bool,
        },
        Release(Dimensions),
    }

    impl MockBackend {
        /// Backend whose `open` always succeeds with the given size.
        pub fn with_dimensions(width: u32, height: u32) -> Self {
            Self {
                open_result: Some((Dimensions { width, height }, Resolution::default())),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn releases(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Release(_)))
                .count()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl ImageBackend for MockBackend {
        type Resource = MockResource;

        fn open(&self, path: &Path) -> Result<MockResource, BackendError> {
            let source = path.to_string_lossy().to_string();
            self.record(RecordedOp::Open(source.clone()));
            let (dimensions, resolution) = self.open_result.ok_or_else(|| {
                BackendError::ProcessingFailed(format!("{source}: file not found"))
            })?;
            Ok(MockResource {
                source,
                dimensions,
                resolution,
            })
        }

        fn dimensions(&self, resource: &MockResource) -> Dimensions {
            resource.dimensions
        }

        fn resolution(&self, resource: &MockResource) -> Resolution {
            resource.resolution
        }

        fn resize(
            &self,
            resource: &MockResource,
            target: Dimensions,
        ) -> Result<MockResource, BackendError> {
            if self.fail_resize {
                return Err(BackendError::ProcessingFailed("resize: out of range".into()));
            }
            self.record(RecordedOp::Resize {
                from: resource.dimensions,
                to: target,
            });
            Ok(MockResource {
                dimensions: target,
                ..resource.clone()
            })
        }

        fn jpeg_save(
            &self,
            resource: &MockResource,
            path: &Path,
            opts: &JpegOptions,
        ) -> Result<(), BackendError> {
            if self.fail_encode {
                return Err(BackendError::ProcessingFailed("jpegsave: write failed".into()));
            }
            self.record(RecordedOp::JpegSave {
                output: path.to_string_lossy().to_string(),
                dimensions: resource.dimensions,
                quality: opts.quality.value(),
            });
            Ok(())
        }

        fn png_save(
            &self,
            resource: &MockResource,
            path: &Path,
            opts: &PngOptions,
        ) -> Result<(), BackendError> {
            if self.fail_encode {
                return Err(BackendError::ProcessingFailed("pngsave: write failed".into()));
            }
            self.record(RecordedOp::PngSave {
                output: path.to_string_lossy().to_string(),
                dimensions: resource.dimensions,
                interlace: opts.interlace,
            });
            Ok(())
        }

        fn release(&self, resource: MockResource) {
            self.record(RecordedOp::Release(resource.dimensions));
        }
    }

    #[test]
    fn mock_records_open() {
        let backend = MockBackend::with_dimensions(800, 600);

        let resource = backend.open(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(backend.dimensions(&resource), Dimensions { width: 800, height: 600 });

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Open(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_open_without_result_errors() {
        let backend = MockBackend::default();
        let err = backend.open(Path::new("/missing.jpg")).unwrap_err();
        assert!(err.to_string().contains("/missing.jpg"));
    }

    #[test]
    fn mock_records_resize_and_release() {
        let backend = MockBackend::with_dimensions(800, 600);
        let resource = backend.open(Path::new("/a.jpg")).unwrap();
        let target = Dimensions { width: 400, height: 300 };

        let resized = backend.resize(&resource, target).unwrap();
        backend.release(resource);

        assert_eq!(resized.dimensions, target);
        assert_eq!(backend.releases(), 1);
        assert!(backend.get_operations().contains(&RecordedOp::Resize {
            from: Dimensions { width: 800, height: 600 },
            to: target,
        }));
    }

    #[test]
    fn clones_share_operation_log() {
        let backend = MockBackend::with_dimensions(10, 10);
        let observer = backend.clone();
        backend.open(Path::new("/x.png")).unwrap();
        assert_eq!(observer.get_operations().len(), 1);
    }
}
