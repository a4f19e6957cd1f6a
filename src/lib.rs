//! # image-handle
//!
//! Load an image, say how big it should be and how hard to compress it, and
//! write it back out as a web-ready JPEG or PNG.
//!
//! ```no_run
//! use image_handle::{AfterSave, Image, lifecycle};
//!
//! # fn main() -> image_handle::Result<()> {
//! lifecycle::init()?;
//! let mut image = Image::new_from_file("photo.tif")?;
//! image.resize(800, 0)?.quality(90)?;
//! image.jpeg_save("photo-800.jpg", AfterSave::Close)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture: Record Now, Apply at Save
//!
//! An [`Image`] handle holds one decoded resource and two pieces of deferred
//! configuration. `resize` and `quality` only validate and record; pixels are
//! touched when a save runs:
//!
//! ```text
//! 1. Apply     pending scale  →  new resource   (old one released)
//! 2. Encode    resource       →  file           (fixed web profile)
//! 3. Release   optional       →  handle closed  (AfterSave::Close)
//! ```
//!
//! Keeping mutation and encoding apart means a chain of calls costs one
//! resample at most, and tests can exercise the whole pipeline against a
//! recording backend without encoding a single pixel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`handle`] | The [`Image`] handle: intent recording, save pipeline, release |
//! | [`lifecycle`] | Process-wide `init` / `shutdown` gate |
//! | [`imaging`] | Backend trait, pure-Rust backend, dimension math, encoders |
//! | [`convert`] | One-file and batch conversions used by the CLI |
//! | [`config`] | `image-handle.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//! | [`error`] | The [`Error`] every handle operation returns |
//!
//! # Design Decisions
//!
//! ## Uniform, Cover-Fit Scaling
//!
//! Resizes never distort. A single requested dimension is matched exactly and
//! the other follows the aspect ratio. With both given, the larger of the two
//! ratios wins, so the result covers the requested box.
//!
//! ## Fixed Encode Profile
//!
//! Every JPEG is progressive with optimized Huffman tables; every PNG is Adam7
//! interlaced. Neither carries EXIF, XMP, IPTC or an ICC profile. PNG is
//! lossless and ignores the handle's quality.
//!
//! ## One Release per Resource
//!
//! The resource lives in an `Option` and every release path takes it out, so
//! `close`, [`AfterSave::Close`] and `Drop` can overlap freely without a
//! double free. A closed handle answers [`Error::Closed`] to anything that
//! needs pixels.

pub mod config;
pub mod convert;
pub mod error;
pub mod handle;
pub mod imaging;
pub mod lifecycle;
pub mod output;

pub use error::{Error, Result};
pub use handle::{AfterSave, Image};

#[cfg(test)]
pub(crate) mod test_helpers;
