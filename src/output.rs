//! CLI output formatting.
//!
//! Output is information-first: each line leads with what happened to an
//! image (its size change and format), with paths as indented context.
//!
//! ## Convert
//!
//! ```text
//! photo.jpg: 3000x2000 → 800x533 JPEG q90
//!     Output: out/photo.jpg
//! ```
//!
//! ## Info
//!
//! ```text
//! photo.jpg
//!     Size: 3000x2000
//!     Resolution: 300x300 ppi
//!     Quality: 85
//! ```
//!
//! ## Batch
//!
//! ```text
//! a.jpg: 1200x800 → 600x400 PNG
//! b.jpg: failed: Failed to decode b.jpg: ...
//!
//! Converted 1 image, 1 failed
//! ```
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::convert::{BatchEvent, BatchSummary, ConvertReport, ImageInfo};
use std::path::Path;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

fn report_line(report: &ConvertReport) -> String {
    let (ow, oh) = report.original_size;
    let (fw, fh) = report.final_size;
    let quality = report
        .quality
        .map(|q| format!(" q{q}"))
        .unwrap_or_default();
    format!(
        "{}: {ow}x{oh} \u{2192} {fw}x{fh} {}{quality}",
        display_name(&report.source),
        report.format
    )
}

/// Format the result of a single `convert`.
pub fn format_convert_report(report: &ConvertReport) -> Vec<String> {
    vec![
        report_line(report),
        format!("    Output: {}", report.output.display()),
    ]
}

pub fn print_convert_report(report: &ConvertReport) {
    for line in format_convert_report(report) {
        println!("{}", line);
    }
}

/// Format `info` output for one image.
pub fn format_info(info: &ImageInfo) -> Vec<String> {
    vec![
        display_name(&info.path),
        format!("    Size: {}x{}", info.width, info.height),
        format!(
            "    Resolution: {}x{} ppi",
            info.resolution.0, info.resolution.1
        ),
        format!("    Quality: {}", info.quality),
    ]
}

pub fn print_info(info: &ImageInfo) {
    for line in format_info(info) {
        println!("{}", line);
    }
}

/// Format one batch progress event.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Converted(report) => vec![report_line(report)],
        BatchEvent::Failed { input, error } => {
            vec![format!("{}: failed: {}", display_name(input), error)]
        }
    }
}

/// Format the closing line of a batch.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let mut line = format!("Converted {}", plural(summary.converted, "image"));
    if summary.failed > 0 {
        line.push_str(&format!(", {} failed", summary.failed));
    }
    vec![String::new(), line]
}

pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}
