//! Shared test utilities: synthetic images and fixture files.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("test.jpg");
//! write_test_jpeg(&path, 200, 150);
//! ```

use image::{DynamicImage, ImageEncoder, RgbImage};
use std::path::Path;

/// An RGB gradient, distinct enough per pixel to catch row or column mixups.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

/// Write a small valid baseline JPEG with the given dimensions.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height).to_rgb8();
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Allocate a fresh temp dir holding one JPEG fixture named `name`.
pub fn jpeg_fixture(name: &str, width: u32, height: u32) -> (tempfile::TempDir, std::path::PathBuf) {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join(name);
    write_test_jpeg(&path, width, height);
    (tmp, path)
}
