use clap::{Parser, Subcommand};
use image_handle::convert::{self, ConvertRequest, OutputFormat};
use image_handle::imaging::RustBackend;
use image_handle::{config, lifecycle, output};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Resize and quality flags shared by `convert` and `batch`.
#[derive(clap::Args, Clone)]
struct ConvertArgs {
    /// Target width in pixels (omit to derive from height)
    #[arg(long, default_value_t = 0)]
    width: i64,

    /// Target height in pixels (omit to derive from width)
    #[arg(long, default_value_t = 0)]
    height: i64,

    /// JPEG quality 0-100 (defaults to [image] quality from config)
    #[arg(long, allow_negative_numbers = true)]
    quality: Option<i64>,

    /// Output format (defaults to the output file extension)
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

impl ConvertArgs {
    fn to_request(&self) -> ConvertRequest {
        ConvertRequest {
            width: self.width,
            height: self.height,
            quality: self.quality,
            format: self.format,
        }
    }
}

#[derive(Parser)]
#[command(name = "image-handle")]
#[command(about = "Resize and re-encode images as web-ready JPEG or PNG")]
#[command(long_about = "\
Resize and re-encode images as web-ready JPEG or PNG

Resizing is uniform. With only --width or --height the other side follows the
aspect ratio; with both the image is scaled to cover the box.

Output profile:
  JPEG  progressive, optimized Huffman tables, no metadata or ICC profile
  PNG   Adam7 interlaced, no metadata or ICC profile (quality is ignored)

Run 'image-handle gen-config' to generate a documented image-handle.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./image-handle.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one image
    Convert {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        args: ConvertArgs,
    },
    /// Show size, resolution and default quality of an image
    Info {
        input: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Convert every image under a directory in parallel
    Batch {
        input_dir: PathBuf,
        output_dir: PathBuf,
        #[command(flatten)]
        args: ConvertArgs,
    },
    /// Print a stock image-handle.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let cwd = std::env::current_dir()?;
    let config = config::load_config(cli.config.as_deref(), &cwd)?;

    lifecycle::init()?;
    let result = run(cli.command, &config);
    lifecycle::shutdown();
    result
}

fn run(command: Command, config: &config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::from_config(config);

    match command {
        Command::Convert {
            input,
            output: output_path,
            args,
        } => {
            let report = convert::convert_file(
                backend,
                &input,
                &output_path,
                &args.to_request(),
                config.default_quality(),
            )?;
            output::print_convert_report(&report);
        }
        Command::Info { input, json } => {
            let info = convert::inspect_file(backend, &input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_info(&info);
            }
        }
        Command::Batch {
            input_dir,
            output_dir,
            args,
        } => {
            run_batch(backend, &input_dir, &output_dir, &args, config)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_batch(
    backend: RustBackend,
    input_dir: &Path,
    output_dir: &Path,
    args: &ConvertArgs,
    config: &config::Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = args.to_request();
    let format = *request.format.get_or_insert(OutputFormat::Jpeg);
    let jobs = convert::plan_batch(input_dir, output_dir, format)?;

    init_thread_pool(&config.processing);
    info!(
        images = jobs.len(),
        threads = rayon::current_num_threads(),
        "==> Converting {}",
        input_dir.display()
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_batch_event(&event) {
                println!("{}", line);
            }
        }
    });
    let summary = convert::run_batch(&backend, &jobs, &request, config.default_quality(), Some(tx));
    printer
        .join()
        .map_err(|_| "batch output thread panicked")?;
    output::print_batch_summary(&summary);

    if summary.failed > 0 {
        return Err(format!("{} of {} images failed", summary.failed, jobs.len()).into());
    }
    Ok(())
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` switches from info to debug.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
