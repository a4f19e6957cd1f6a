//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the [`Image`](crate::Image) handle (which records
//! intent) and the [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Encoder quality (0–100, default 85). Validated, never clamped.
//! - [`Scale`]: Pending uniform resize factor (positive, finite, default 1.0).
//! - [`ResizeFilter`]: Resampling kernel handed to the backend.
//! - [`JpegOptions`] / [`PngOptions`]: The fixed encode profile for each format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 100;

    /// Validate a caller-supplied quality.
    ///
    /// Returns `None` for anything outside `0..=100`.
    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Uniform scale factor waiting to be applied at the next save.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Scale(f64);

impl Scale {
    pub const IDENTITY: Scale = Scale(1.0);

    /// Returns `None` unless `factor` is finite and strictly positive.
    pub fn new(factor: f64) -> Option<Self> {
        (factor.is_finite() && factor > 0.0).then_some(Self(factor))
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    pub fn is_identity(self) -> bool {
        self.0 == 1.0
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Resampling kernel used when a pending scale is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl ResizeFilter {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// JPEG encode profile.
///
/// JPEGs are always progressive. Encoders never write EXIF, XMP, IPTC or ICC
/// segments, so every save is stripped and profile-free regardless of what
/// the source carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegOptions {
    pub quality: Quality,
    /// Compute per-image Huffman tables instead of the standard ones.
    pub optimize_coding: bool,
}

impl JpegOptions {
    /// The profile every handle save uses.
    pub fn web(quality: Quality) -> Self {
        Self {
            quality,
            optimize_coding: true,
        }
    }
}

/// PNG encode profile. Quality does not apply to this lossless format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngOptions {
    /// Adam7 interlaced layout.
    pub interlace: bool,
}

impl PngOptions {
    pub fn web() -> Self {
        Self { interlace: true }
    }
}
