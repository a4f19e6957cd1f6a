//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the uniform scale factor that brings `source` up (or down) to
/// the requested `target`.
///
/// A target dimension of `0` means "unspecified". With both dimensions given
/// the larger of the two ratios wins, so the result covers the target box in
/// both directions and matches it exactly in one.
///
/// # Returns
/// * `None` when neither dimension is given, or the source is empty
///
/// # Examples
/// ```
/// # use image_handle::imaging::calculate_scale;
/// // 1000x500 to width 800 → 0.8
/// assert_eq!(calculate_scale((1000, 500), (800, 0)), Some(0.8));
///
/// // 1000x500 covering 400x400 → height drives: 400/500
/// assert_eq!(calculate_scale((1000, 500), (400, 400)), Some(0.8));
/// ```
pub fn calculate_scale(source: (u32, u32), target: (u32, u32)) -> Option<f64> {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    if src_w == 0 || src_h == 0 {
        return None;
    }

    let by_width = tgt_w as f64 / src_w as f64;
    let by_height = tgt_h as f64 / src_h as f64;

    match (tgt_w, tgt_h) {
        (0, 0) => None,
        (_, 0) => Some(by_width),
        (0, _) => Some(by_height),
        // Cover-fit: the larger factor satisfies both minimums
        _ => Some(by_width.max(by_height)),
    }
}

/// Calculate the dimensions an image ends up with after a uniform scale.
///
/// Each side is rounded to the nearest pixel and never drops below 1.
pub fn calculate_scaled_dimensions(source: (u32, u32), scale: f64) -> (u32, u32) {
    let (src_w, src_h) = source;
    let w = (src_w as f64 * scale).round().max(1.0);
    let h = (src_h as f64 * scale).round().max(1.0);
    (
        w.min(u32::MAX as f64) as u32,
        h.min(u32::MAX as f64) as u32,
    )
}
