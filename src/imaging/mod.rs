//! Image processing, statically linked into the binary.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with allocation limits |
//! | **Resize** | `resize_exact` with a configurable filter |
//! | **Encode JPEG** | `mozjpeg`, progressive, no metadata |
//! | **Encode PNG** | `lodepng`, Adam7 interlaced |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Resolution**: Density read from JFIF / pHYs headers
//! - **Encode**: JPEG and PNG encoder calls
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
pub(crate) mod encode;
mod params;
mod resolution;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_scale, calculate_scaled_dimensions};
pub use params::{JpegOptions, PngOptions, Quality, ResizeFilter, Scale};
pub use resolution::{Resolution, parse_resolution, read_resolution};
pub use rust_backend::{DecodedImage, RustBackend, supported_input_extensions};
