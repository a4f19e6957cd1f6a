//! High-level conversions built on the image handle.
//!
//! A conversion opens one handle, records the requested resize and quality,
//! and saves with [`AfterSave::Close`]. `batch` plans one conversion per
//! decodable file under a directory; the CLI runs the plan on a rayon pool.

use crate::error::{Error, Result};
use crate::handle::{AfterSave, Image};
use crate::imaging::{ImageBackend, Quality, supported_input_extensions};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Infer the format from an output path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "JPEG"),
            Self::Png => write!(f, "PNG"),
        }
    }
}

/// What to do to each image.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    /// Target width, `0` for unspecified.
    pub width: i64,
    /// Target height, `0` for unspecified.
    pub height: i64,
    /// JPEG quality; the config default applies when absent.
    pub quality: Option<i64>,
    /// Output format; inferred from the output path when absent.
    pub format: Option<OutputFormat>,
}

/// Result of one conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub original_size: (u32, u32),
    pub final_size: (u32, u32),
    pub format: OutputFormat,
    /// Quality used for the encode. `None` for PNG.
    pub quality: Option<u8>,
}

/// One planned conversion within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Convert a single file.
pub fn convert_file<B: ImageBackend>(
    backend: B,
    input: &Path,
    output: &Path,
    request: &ConvertRequest,
    default_quality: Quality,
) -> Result<ConvertReport> {
    let format = match request.format {
        Some(format) => format,
        None => OutputFormat::from_path(output).ok_or_else(|| {
            Error::Validation(format!(
                "cannot infer output format from {}; use --format",
                output.display()
            ))
        })?,
    };

    let mut image = Image::new_from_file_with(backend, input)?;
    let original_size = image.get_size()?;
    image.quality(
        request
            .quality
            .unwrap_or_else(|| i64::from(default_quality.value())),
    )?;
    image.resize(request.width, request.height)?;
    let final_size = projected_size(original_size, image.pending_scale());

    debug!(
        input = %input.display(),
        output = %output.display(),
        %format,
        "converting"
    );
    let quality = match format {
        OutputFormat::Jpeg => {
            let q = image.get_quality();
            image.jpeg_save(output, AfterSave::Close)?;
            Some(q)
        }
        OutputFormat::Png => {
            image.png_save(output, AfterSave::Close)?;
            None
        }
    };

    Ok(ConvertReport {
        source: input.to_path_buf(),
        output: output.to_path_buf(),
        original_size,
        final_size,
        format,
        quality,
    })
}

fn projected_size(size: (u32, u32), scale: f64) -> (u32, u32) {
    crate::imaging::calculate_scaled_dimensions(size, scale)
}

/// Plan one conversion per decodable file under `input_dir`.
///
/// The directory structure is mirrored under `output_dir`; each output keeps
/// its stem and takes the extension of `format`. Jobs are sorted by input
/// path so batch output is deterministic.
pub fn plan_batch(
    input_dir: &Path,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<Vec<BatchJob>> {
    if !input_dir.is_dir() {
        return Err(Error::Validation(format!(
            "{} is not a directory",
            input_dir.display()
        )));
    }
    let supported = supported_input_extensions();
    let mut jobs: Vec<BatchJob> = WalkDir::new(input_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| supported.contains(&e.to_ascii_lowercase().as_str()))
        })
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(input_dir).ok()?;
            Some(BatchJob {
                input: entry.path().to_path_buf(),
                output: output_dir.join(relative).with_extension(format.extension()),
            })
        })
        .collect();
    jobs.sort_by(|a, b| a.input.cmp(&b.input));
    Ok(jobs)
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Converted(ConvertReport),
    Failed { input: PathBuf, error: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub converted: usize,
    pub failed: usize,
}

/// Run planned jobs in parallel on the current rayon pool.
///
/// Every job gets its own handle. A failing file is reported and skipped;
/// the rest of the batch still runs.
pub fn run_batch<B>(
    backend: &B,
    jobs: &[BatchJob],
    request: &ConvertRequest,
    default_quality: Quality,
    events: Option<Sender<BatchEvent>>,
) -> BatchSummary
where
    B: ImageBackend + Clone + Send,
{
    let outcomes: Vec<bool> = jobs
        .par_iter()
        .map_with(events, |events, job| {
            let event = match run_job(backend.clone(), job, request, default_quality) {
                Ok(report) => BatchEvent::Converted(report),
                Err(e) => {
                    warn!(input = %job.input.display(), error = %e, "conversion failed");
                    BatchEvent::Failed {
                        input: job.input.clone(),
                        error: e.to_string(),
                    }
                }
            };
            let ok = matches!(event, BatchEvent::Converted(_));
            if let Some(tx) = events {
                // Receiver gone means nobody is listening; keep converting
                let _ = tx.send(event);
            }
            ok
        })
        .collect();

    let converted = outcomes.iter().filter(|ok| **ok).count();
    BatchSummary {
        converted,
        failed: outcomes.len() - converted,
    }
}

fn run_job<B: ImageBackend>(
    backend: B,
    job: &BatchJob,
    request: &ConvertRequest,
    default_quality: Quality,
) -> Result<ConvertReport> {
    if let Some(parent) = job.output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::Library(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    convert_file(backend, &job.input, &job.output, request, default_quality)
}

/// What `info` reports about one image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Pixels per inch, horizontal then vertical.
    pub resolution: (u32, u32),
    pub quality: u8,
}

/// Open `path`, read its geometry, and close the handle again.
pub fn inspect_file<B: ImageBackend>(backend: B, path: &Path) -> Result<ImageInfo> {
    let mut image = Image::new_from_file_with(backend, path)?;
    let (width, height) = image.get_size()?;
    let resolution = image.get_res()?;
    let quality = image.get_quality();
    image.close();
    Ok(ImageInfo {
        path: path.to_path_buf(),
        width,
        height,
        resolution,
        quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::lifecycle;
    use std::fs;
    use tempfile::TempDir;

    fn request(width: i64, height: i64) -> ConvertRequest {
        ConvertRequest {
            width,
            height,
            ..ConvertRequest::default()
        }
    }

    #[test]
    fn format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("a.JPG")), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_path(Path::new("a.jpeg")), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_path(Path::new("a.png")), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_path(Path::new("a.webp")), None);
        assert_eq!(OutputFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn convert_jpeg_uses_backend() {
        lifecycle::init().unwrap();
        let backend = MockBackend::with_dimensions(2000, 1000);
        let observer = backend.clone();

        let report = convert_file(
            backend,
            Path::new("/in/a.tif"),
            Path::new("/out/a.jpg"),
            &ConvertRequest {
                quality: Some(90),
                ..request(800, 0)
            },
            Quality::default(),
        )
        .unwrap();

        assert_eq!(report.original_size, (2000, 1000));
        assert_eq!(report.final_size, (800, 400));
        assert_eq!(report.format, OutputFormat::Jpeg);
        assert_eq!(report.quality, Some(90));

        let ops = observer.get_operations();
        assert!(ops.contains(&RecordedOp::JpegSave {
            output: "/out/a.jpg".into(),
            dimensions: Dimensions { width: 800, height: 400 },
            quality: 90,
        }));
        // Resize replaced one resource, save-and-close released the other
        assert_eq!(observer.releases(), 2);
    }

    #[test]
    fn convert_falls_back_to_default_quality() {
        lifecycle::init().unwrap();
        let backend = MockBackend::with_dimensions(100, 100);
        let report = convert_file(
            backend,
            Path::new("/in/a.png"),
            Path::new("/out/a.jpg"),
            &request(0, 0),
            Quality::new(60).unwrap(),
        )
        .unwrap();
        assert_eq!(report.quality, Some(60));
        assert_eq!(report.final_size, (100, 100));
    }

    #[test]
    fn convert_png_ignores_quality() {
        lifecycle::init().unwrap();
        let backend = MockBackend::with_dimensions(100, 50);
        let observer = backend.clone();
        let report = convert_file(
            backend,
            Path::new("/in/a.jpg"),
            Path::new("/out/a.png"),
            &request(0, 0),
            Quality::default(),
        )
        .unwrap();

        assert_eq!(report.quality, None);
        assert!(
            observer
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::PngSave { interlace: true, .. }))
        );
    }

    #[test]
    fn convert_explicit_format_overrides_extension() {
        lifecycle::init().unwrap();
        let backend = MockBackend::with_dimensions(10, 10);
        let report = convert_file(
            backend,
            Path::new("/in/a.jpg"),
            Path::new("/out/a.bin"),
            &ConvertRequest {
                format: Some(OutputFormat::Png),
                ..ConvertRequest::default()
            },
            Quality::default(),
        )
        .unwrap();
        assert_eq!(report.format, OutputFormat::Png);
    }

    #[test]
    fn convert_unknown_extension_is_validation_error() {
        lifecycle::init().unwrap();
        let backend = MockBackend::with_dimensions(10, 10);
        let observer = backend.clone();
        let result = convert_file(
            backend,
            Path::new("/in/a.jpg"),
            Path::new("/out/a.gif"),
            &ConvertRequest::default(),
            Quality::default(),
        );
        assert!(matches!(result, Err(Error::Validation(_))));
        // Rejected before opening anything
        assert!(observer.get_operations().is_empty());
    }

    #[test]
    fn convert_invalid_quality_is_validation_error() {
        lifecycle::init().unwrap();
        let backend = MockBackend::with_dimensions(10, 10);
        let observer = backend.clone();
        let result = convert_file(
            backend,
            Path::new("/in/a.jpg"),
            Path::new("/out/a.jpg"),
            &ConvertRequest {
                quality: Some(150),
                ..ConvertRequest::default()
            },
            Quality::default(),
        );
        assert!(matches!(result, Err(Error::Validation(_))));
        // Handle dropped on the error path still releases
        assert_eq!(observer.releases(), 1);
    }

    #[test]
    fn plan_batch_mirrors_tree() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        fs::create_dir_all(input.join("nested")).unwrap();
        fs::write(input.join("b.JPG"), b"").unwrap();
        fs::write(input.join("a.png"), b"").unwrap();
        fs::write(input.join("nested/c.tiff"), b"").unwrap();
        fs::write(input.join("notes.txt"), b"").unwrap();

        let output = tmp.path().join("out");
        let jobs = plan_batch(&input, &output, OutputFormat::Jpeg).unwrap();

        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].input, input.join("a.png"));
        assert_eq!(jobs[0].output, output.join("a.jpg"));
        assert_eq!(jobs[1].output, output.join("b.jpg"));
        assert_eq!(jobs[2].output, output.join("nested/c.jpg"));
    }

    fn jobs_in(tmp: &TempDir, names: &[&str]) -> Vec<BatchJob> {
        names
            .iter()
            .map(|name| BatchJob {
                input: PathBuf::from(format!("/in/{name}.jpg")),
                output: tmp.path().join("out/sub").join(format!("{name}.png")),
            })
            .collect()
    }

    #[test]
    fn run_batch_converts_every_job() {
        lifecycle::init().unwrap();
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(400, 300);
        let jobs = jobs_in(&tmp, &["a", "b", "c"]);
        let (tx, rx) = std::sync::mpsc::channel();

        let summary = run_batch(
            &backend,
            &jobs,
            &ConvertRequest {
                format: Some(OutputFormat::Png),
                ..request(200, 0)
            },
            Quality::default(),
            Some(tx),
        );

        assert_eq!(summary, BatchSummary { converted: 3, failed: 0 });
        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| matches!(
            e,
            BatchEvent::Converted(report) if report.final_size == (200, 150)
        )));
        // Output directories are created on demand
        assert!(tmp.path().join("out/sub").is_dir());
    }

    #[test]
    fn run_batch_reports_failures_and_continues() {
        lifecycle::init().unwrap();
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::default();
        let jobs = jobs_in(&tmp, &["x", "y"]);
        let (tx, rx) = std::sync::mpsc::channel();

        let summary = run_batch(&backend, &jobs, &ConvertRequest::default(), Quality::default(), Some(tx));

        assert_eq!(summary, BatchSummary { converted: 0, failed: 2 });
        let failed: Vec<String> = rx
            .iter()
            .filter_map(|e| match e {
                BatchEvent::Failed { error, .. } => Some(error),
                BatchEvent::Converted(_) => None,
            })
            .collect();
        assert_eq!(failed.len(), 2);
        assert!(failed.iter().all(|msg| !msg.is_empty()));
    }

    #[test]
    fn run_batch_without_listener() {
        lifecycle::init().unwrap();
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(10, 10);
        let summary = run_batch(
            &backend,
            &jobs_in(&tmp, &["only"]),
            &ConvertRequest::default(),
            Quality::default(),
            None,
        );
        assert_eq!(summary.converted, 1);
    }

    #[test]
    fn inspect_reports_geometry_and_closes() {
        lifecycle::init().unwrap();
        let backend = MockBackend::with_dimensions(640, 480);
        let observer = backend.clone();

        let info = inspect_file(backend, Path::new("/in/a.jpg")).unwrap();

        assert_eq!((info.width, info.height), (640, 480));
        assert_eq!(info.resolution, (72, 72));
        assert_eq!(info.quality, 85);
        assert_eq!(observer.releases(), 1);
    }

    #[test]
    fn plan_batch_requires_directory() {
        let tmp = TempDir::new().unwrap();
        let result = plan_batch(
            &tmp.path().join("missing"),
            tmp.path(),
            OutputFormat::Png,
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
