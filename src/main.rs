use clap::{Parser, Subcommand};
use squarefit::imaging::RustBackend;
use squarefit::{config, output, process};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let hash = env!("SQUAREFIT_GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{}+{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "squarefit")]
#[command(about = "Fit images into fixed-size squares under a byte budget")]
#[command(long_about = "\
Fit images into fixed-size squares under a byte budget

Every output is an opaque RGB PNG of exactly the target size (1080x1080 by
default). Transparent areas are composited onto white. Without an explicit
crop the image is scaled to cover the square and centered (smart fill).

When the lossless PNG is larger than the budget (5 MiB by default), the
image is degraded step by step until it fits:

  1. lossless PNG
  2. 256-color palette
  3. downscale to 95%, 90%, ... 50% of the target
  4. 128, 64, then 32 colors

If nothing fits, the smallest attempt is kept and reported as over budget.

Crops file (--crops) maps input file names to pixel rectangles:

  { \"beach.jpg\": { \"x\": 100, \"y\": 50, \"width\": 400, \"height\": 400 } }

Run 'squarefit gen-config' to generate a documented squarefit.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults apply when it does not exist)
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize and fit images, writing PNGs and an archive
    Fit {
        /// Image files or directories (walked recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// JSON file mapping input file names to crop rectangles
        #[arg(long)]
        crops: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "output")]
        output: PathBuf,

        /// Skip writing the archive
        #[arg(long)]
        no_archive: bool,

        /// Print the batch response as JSON (base64 payloads) instead of writing files
        #[arg(long)]
        json: bool,
    },
    /// Decode inputs and report their dimensions and color mode
    Check {
        /// Image files or directories (walked recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print a stock squarefit.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Fit {
            inputs,
            crops,
            output: output_dir,
            no_archive,
            json,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);

            let options = FitOptions {
                crops,
                output_dir,
                with_archive: !no_archive,
                json,
            };
            if !run_fit(&inputs, &config, &options)? {
                std::process::exit(1);
            }
        }
        Command::Check { inputs } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);

            let files = process::collect_inputs(&inputs, &config.output)?;
            let (images, unreadable) = process::load_inputs(&files, &HashMap::new());
            let mut entries: Vec<process::CheckEntry> =
                unreadable.into_iter().map(Into::into).collect();
            entries.extend(process::check_inputs(
                &RustBackend::new(),
                &images,
                &config.output,
            ));
            output::print_check_output(&entries);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Output choices for `fit` beyond the config file.
struct FitOptions {
    crops: Option<PathBuf>,
    output_dir: PathBuf,
    with_archive: bool,
    json: bool,
}

/// Run the `fit` command.
///
/// Returns whether at least one image was processed; the caller exits
/// non-zero otherwise, including when no input file was found.
fn run_fit(
    inputs: &[PathBuf],
    config: &config::FitConfig,
    options: &FitOptions,
) -> Result<bool, Box<dyn std::error::Error>> {
    let files = process::collect_inputs(inputs, &config.output)?;
    if files.is_empty() {
        eprintln!("No images found");
        return Ok(false);
    }
    let crops = match &options.crops {
        Some(path) => process::load_crops(path)?,
        None => HashMap::new(),
    };
    let (images, unreadable) = process::load_inputs(&files, &crops);

    if options.json {
        let report =
            process::process_batch(&images, config, None)?.with_load_errors(unreadable);
        println!("{}", serde_json::to_string_pretty(&report.response())?);
        return Ok(!report.processed.is_empty());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let report =
        process::process_batch(&images, config, Some(tx))?.with_load_errors(unreadable);
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;

    let archive_path = write_outputs(&report, &options.output_dir, options.with_archive)?;
    output::print_batch_summary(&report, archive_path.as_deref());

    Ok(!report.processed.is_empty())
}

/// Write every processed image, and the archive when requested.
///
/// Returns the archive path if one was written.
fn write_outputs(
    report: &process::BatchReport,
    output_dir: &Path,
    with_archive: bool,
) -> std::io::Result<Option<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    for image in &report.processed {
        std::fs::write(output_dir.join(&image.processed_name), &image.bytes)?;
    }
    match &report.archive {
        Some(zip) if with_archive => {
            let path = output_dir.join(&report.archive_name);
            std::fs::write(&path, zip)?;
            Ok(Some(path))
        }
        _ => Ok(None),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
