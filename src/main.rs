use clap::{Parser, Subcommand};
use optimize_images::config::{self, ConfigOverrides, DEFAULT_CONFIG_FILE, OptimizeConfig};
use optimize_images::process::ProcessEvent;
use optimize_images::types::OutputFormat;
use optimize_images::{output, process};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once; only called at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "optimize-images")]
#[command(about = "Build-time image optimizer for static sites")]
#[command(long_about = "\
Build-time image optimizer for static sites

Mirrors the source tree into the output tree:

  public/images/                public/optimized/images/
  ├── hero.png          →       ├── hero.webp      (≤ max width, re-encoded)
  ├── logo.svg          →       ├── logo.svg       (copied as-is)
  ├── notes.txt                 │                  (ignored)
  └── blog/cover.JPG    →       └── blog/cover.webp

Rasters: .jpg .jpeg .png .gif .webp .avif .tif .tiff
Outputs that exist, are non-empty, and are not older than their source are
skipped. A file that fails to process is reported and skipped; the rest of
the tree is still processed.

Run 'optimize-images gen-config' to generate a documented optimize.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[command(subcommand)]
    command: Command,
}

/// Flags layered over `optimize.toml`.
#[derive(clap::Args, Clone)]
struct SettingsArgs {
    /// Config file [default: optimize.toml, if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source image directory
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Maximum output width in pixels
    #[arg(long, global = true)]
    max_width: Option<u32>,

    /// Encoder quality (1-100)
    #[arg(long, global = true)]
    quality: Option<u32>,

    /// Output format for raster images
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Maximum parallel workers (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Rebuild every output, ignoring modification times
    #[arg(long)]
    force: bool,

    /// Only print warnings and the summary
    #[arg(long)]
    quiet: bool,

    /// Print the summary as JSON instead of a text line
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize the source tree into the output tree
    Run(RunArgs),
    /// Show what a run would do, without writing anything
    Check,
    /// Print a stock optimize.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Run(args) => {
            let config = load_config(&cli.settings)?;
            init_thread_pool(&config.processing);
            let quiet = args.quiet;
            let summary = with_printer(
                move |event| output::print_process_event(event, quiet),
                |tx| process::optimize(&config, args.force, Some(tx)),
            )??;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", output::format_summary(&summary));
            }
        }
        Command::Check => {
            let config = load_config(&cli.settings)?;
            if !config.source.exists() {
                println!("{}", output::format_source_missing(&config.source));
                return Ok(());
            }
            let planned = process::plan(&config)?;
            output::print_plan(&planned);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run `job` while a printer thread drains the events it sends.
///
/// The printer is joined before `job`'s result is handed back, so every
/// queued event is shown even when the job fails.
fn with_printer<T>(
    print: impl Fn(&ProcessEvent) + Send + 'static,
    job: impl FnOnce(Sender<ProcessEvent>) -> T,
) -> Result<T, &'static str> {
    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            print(&event);
        }
    });
    let result = job(tx);
    printer.join().map_err(|_| "output thread panicked")?;
    Ok(result)
}

/// Resolve config: defaults → config file → command-line flags.
fn load_config(settings: &SettingsArgs) -> Result<OptimizeConfig, config::ConfigError> {
    let overrides = ConfigOverrides {
        source: settings.source.clone(),
        output: settings.output.clone(),
        max_width: settings.max_width,
        quality: settings.quality,
        format: settings.format,
        threads: settings.threads,
    };
    match &settings.config {
        Some(path) => config::load_config(path, true, &overrides),
        None => config::load_config(Path::new(DEFAULT_CONFIG_FILE), false, &overrides),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
