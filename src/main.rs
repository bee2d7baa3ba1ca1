use clap::{Args, Parser, Subcommand};
use print_pad::config::{self, ConfigOverrides, ConflictPolicy, PadConfig};
use print_pad::conflict::{ConflictDecision, ConflictResolver, FixedResolver, PromptResolver};
use print_pad::imaging::RustBackend;
use print_pad::{output, process};
use std::path::{Path, PathBuf};

/// Flags shared by commands that resolve a configuration.
#[derive(Args, Clone)]
struct SettingsArgs {
    /// Target ratio as "short:long" (2:3, 4:5, 1:1, 8.5:11) or "even"
    #[arg(long)]
    ratio: Option<String>,

    /// Border in percent of the padded image (5 = 5%)
    #[arg(long)]
    border: Option<f64>,

    /// Padding and border color as #rrggbb
    #[arg(long)]
    background: Option<String>,

    /// Drop EXIF and DPI (the ICC profile is always kept)
    #[arg(long)]
    no_extra_metadata: bool,

    /// Config file to use instead of <INPUT>/print-pad.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "print-pad")]
#[command(about = "Pad photos to a print aspect ratio without cropping")]
#[command(long_about = "\
Pad photos to a print aspect ratio without cropping

Every supported image (jpg, jpeg, png, tif, tiff, webp) directly inside
INPUT is centered on a canvas of the target ratio, optionally wrapped in a
uniform border, and written to OUTPUT as <name>_padded.<ext>. Source pixels
are never resized or resampled.

The ICC color profile is always carried over. EXIF and DPI are carried over
unless --no-extra-metadata is given.

Settings come from, lowest priority first:
  built-in defaults → INPUT/print-pad.toml (or --config) → command-line flags

Run 'print-pad gen-config' to generate a documented print-pad.toml.")]
#[command(version)]
struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pad every image in a folder
    Pad {
        /// Folder with the source images
        input: PathBuf,
        /// Folder for the padded images (created if missing)
        output: PathBuf,
        #[command(flatten)]
        settings: SettingsArgs,
        /// Appended to each output file stem
        #[arg(long)]
        suffix: Option<String>,
        /// When an output exists: ask, overwrite, skip or abort
        #[arg(long)]
        on_conflict: Option<String>,
    },
    /// Show the planned sizes without writing anything
    Check {
        /// Folder with the source images
        input: PathBuf,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    /// Print a stock print-pad.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Pad {
            input,
            output: output_dir,
            settings,
            suffix,
            on_conflict,
        } => {
            let mut overrides = overrides_from(&settings);
            overrides.suffix = suffix;
            overrides.on_conflict = on_conflict;
            let config = load(&input, &settings, &overrides)?;

            println!("==> Padding {} → {}", input.display(), output_dir.display());
            let mut resolver = resolver_for(config.output.on_conflict);
            let summary = process::pad_directory(
                &input,
                &output_dir,
                &config,
                resolver.as_mut(),
                &mut output::print_pad_event,
            )?;
            output::print_summary(&summary);
        }
        Command::Check { input, settings } => {
            let config = load(&input, &settings, &overrides_from(&settings))?;
            let jobs = process::enumerate_jobs(
                &input,
                &input,
                &config.output.suffix,
                config.pad_settings()?,
            )?;

            println!("==> Checking {} (ratio {})", input.display(), config.ratio);
            let backend = RustBackend::new();
            let plans: Vec<_> = jobs
                .iter()
                .map(|job| {
                    let plan = process::plan_job(&backend, job).map_err(|e| e.to_string());
                    (job.input.as_path(), plan)
                })
                .collect();
            output::print_check_output(&plans);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Route `tracing` output to stderr.
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "warn,print_pad=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn overrides_from(settings: &SettingsArgs) -> ConfigOverrides {
    ConfigOverrides {
        ratio: settings.ratio.clone(),
        border_percent: settings.border,
        background: settings.background.clone(),
        preserve_extra_metadata: settings.no_extra_metadata.then_some(false),
        ..Default::default()
    }
}

fn load(
    input: &Path,
    settings: &SettingsArgs,
    overrides: &ConfigOverrides,
) -> Result<PadConfig, config::ConfigError> {
    config::load_config(input, settings.config.as_deref(), overrides)
}

fn resolver_for(policy: ConflictPolicy) -> Box<dyn ConflictResolver> {
    match policy {
        ConflictPolicy::Ask => Box::new(PromptResolver::terminal()),
        ConflictPolicy::Overwrite => Box::new(FixedResolver(ConflictDecision::Overwrite)),
        ConflictPolicy::Skip => Box::new(FixedResolver(ConflictDecision::Skip)),
        ConflictPolicy::Abort => Box::new(FixedResolver(ConflictDecision::AbortBatch)),
    }
}
