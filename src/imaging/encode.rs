//! JPEG and PNG encoders used by [`RustBackend`](super::RustBackend).
//!
//! | Format | Implementation |
//! |---|---|
//! | JPEG | `mozjpeg`, progressive scans, per-image Huffman tables |
//! | PNG | `lodepng`, Adam7 interlaced, source bit depth kept |
//!
//! Neither encoder writes metadata: no EXIF/XMP segments, no `iCCP`, `tEXt`
//! or `pHYs` chunks. Both return the complete file in memory so a failed
//! encode never leaves a truncated file behind.

use super::backend::BackendError;
use super::params::{JpegOptions, PngOptions};
use image::DynamicImage;
use lodepng::ColorType;
use mozjpeg::{ColorSpace, Compress};
use std::borrow::Cow;

/// Encode `img` as a progressive JPEG.
///
/// Alpha is dropped; 8-bit grayscale stays single-channel, everything else
/// is encoded as RGB.
pub fn encode_jpeg(img: &DynamicImage, opts: &JpegOptions) -> Result<Vec<u8>, BackendError> {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "cannot encode empty image ({w}x{h})"
        )));
    }

    let (color_space, channels, samples): (ColorSpace, usize, Cow<'_, [u8]>) = match img {
        DynamicImage::ImageLuma8(gray) => (ColorSpace::JCS_GRAYSCALE, 1, Cow::Borrowed(gray.as_raw())),
        DynamicImage::ImageRgb8(rgb) => (ColorSpace::JCS_RGB, 3, Cow::Borrowed(rgb.as_raw())),
        other => (ColorSpace::JCS_RGB, 3, Cow::Owned(other.to_rgb8().into_raw())),
    };

    let mut comp = Compress::new(color_space);
    comp.set_size(w as usize, h as usize);
    comp.set_quality(opts.quality.value() as f32);
    comp.set_progressive_mode();
    comp.set_optimize_coding(opts.optimize_coding);

    let mut output = Vec::with_capacity((w as usize * h as usize * channels / 10).max(4096));
    let mut writer = comp
        .start_compress(&mut output)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;

    let stride = w as usize * channels;
    for row in samples.chunks(stride) {
        writer
            .write_scanlines(row)
            .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    }
    writer
        .finish()
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;

    Ok(output)
}

// =============================================================================
// PNG
// =============================================================================

/// Raw big-endian samples plus the PNG color type and bit depth they carry.
fn png_samples(img: &DynamicImage) -> (ColorType, u32, Cow<'_, [u8]>) {
    fn be16(samples: &[u16]) -> Cow<'static, [u8]> {
        Cow::Owned(samples.iter().flat_map(|s| s.to_be_bytes()).collect())
    }

    match img {
        DynamicImage::ImageLuma8(i) => (ColorType::GREY, 8, Cow::Borrowed(i.as_raw())),
        DynamicImage::ImageLumaA8(i) => (ColorType::GREY_ALPHA, 8, Cow::Borrowed(i.as_raw())),
        DynamicImage::ImageRgb8(i) => (ColorType::RGB, 8, Cow::Borrowed(i.as_raw())),
        DynamicImage::ImageRgba8(i) => (ColorType::RGBA, 8, Cow::Borrowed(i.as_raw())),
        DynamicImage::ImageLuma16(i) => (ColorType::GREY, 16, be16(i.as_raw())),
        DynamicImage::ImageLumaA16(i) => (ColorType::GREY_ALPHA, 16, be16(i.as_raw())),
        DynamicImage::ImageRgb16(i) => (ColorType::RGB, 16, be16(i.as_raw())),
        DynamicImage::ImageRgba16(i) => (ColorType::RGBA, 16, be16(i.as_raw())),
        other if other.color().has_alpha() => {
            (ColorType::RGBA, 8, Cow::Owned(other.to_rgba8().into_raw()))
        }
        other => (ColorType::RGB, 8, Cow::Owned(other.to_rgb8().into_raw())),
    }
}

/// Encode `img` as a PNG, Adam7-interlaced when `opts.interlace` is set.
///
/// The source color type and bit depth are kept as-is. Output contains only
/// `IHDR`, `IDAT` and `IEND`.
pub fn encode_png(img: &DynamicImage, opts: &PngOptions) -> Result<Vec<u8>, BackendError> {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "cannot encode empty image ({w}x{h})"
        )));
    }

    let (color_type, bit_depth, samples) = png_samples(img);

    let mut encoder = lodepng::Encoder::new();
    encoder.set_auto_convert(false);
    let raw = encoder.info_raw_mut();
    raw.colortype = color_type;
    raw.set_bitdepth(bit_depth);
    let info = encoder.info_png_mut();
    info.color.colortype = color_type;
    info.color.set_bitdepth(bit_depth);
    info.interlace_method = u8::from(opts.interlace);

    encoder
        .encode(&samples, w as usize, h as usize)
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))
}
