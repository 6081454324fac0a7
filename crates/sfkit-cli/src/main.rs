//! sfkit - mirror and erase application file trees
//!
//! Command-line front end for the sfkit engine: place a staged bundle with
//! `ditto`, retire an old install with `wipe`, and inspect trees with `ls`
//! and `exists`.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use globset::{Glob, GlobSetBuilder};
use sfkit_config::{Config, ConfigLoader, LoggingConfig};
use sfkit_engine::{DittoOptions, Engine, EngineSlot};
use sfkit_types::{ConcurrencyLimit, Operation};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

mod display;
mod json_output;
mod progress;

use display::{
    display_ditto_stats, display_error, display_info, display_listing, display_success, display_warning,
    display_wipe_stats,
};
use json_output::{print_json, print_listing_json, OperationReportJson};
use progress::ProgressReporter;

static ENGINE: EngineSlot = EngineSlot::new();

/// sfkit - mirror and erase application file trees
#[derive(Parser)]
#[command(
    name = "sfkit",
    version = env!("CARGO_PKG_VERSION"),
    about = "Mirror and erase application file trees",
    long_about = "sfkit places downloaded application bundles onto disk and removes\n\
                  superseded installs. Mirroring is additive and keeps symlinks and\n\
                  permission bits; erasing is idempotent and safe to retry."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit machine-readable JSON instead of styled text
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Maximum concurrent file operations (overrides configuration)
    #[arg(short = 'j', long, global = true)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror SOURCE into DESTINATION without pruning existing entries
    Ditto {
        /// Source path
        source: PathBuf,
        /// Destination path
        destination: PathBuf,
        /// Rename files into place instead of copying them
        #[arg(long = "move")]
        move_files: bool,
        /// Skip files whose relative path matches this glob (repeatable)
        #[arg(long)]
        skip: Vec<String>,
    },
    /// Remove a file or directory tree; missing paths are not an error
    Wipe {
        /// Path to remove
        path: PathBuf,
    },
    /// Check whether a path exists (exit code 1 when it does not)
    Exists {
        /// Path to check
        path: PathBuf,
    },
    /// List a directory tree as seen by the engine
    Ls {
        /// Root directory
        root: PathBuf,
    },
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
        /// Write the configuration to this file (YAML, TOML or JSON by extension)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => report_failure(&e),
    }
}

fn report_failure(error: &anyhow::Error) -> ExitCode {
    display_error(&format!("{:#}", error));
    ExitCode::FAILURE
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ConfigLoader::load_default()?,
    };
    if let Some(limit) = cli.concurrency {
        config.engine.concurrency_limit = ConcurrencyLimit::new(limit).map_err(|e| anyhow!(e))?;
    }

    init_logging(&cli, &config.logging)?;

    info!("sfkit v{} starting", env!("CARGO_PKG_VERSION"));

    ENGINE.install(Engine::from_config(&config)?)?;

    let quiet = cli.quiet || cli.json;
    match cli.command {
        Commands::Ditto {
            source,
            destination,
            move_files,
            skip,
        } => {
            ditto_command(&source, &destination, move_files, &skip, quiet, cli.json).await?;
        }
        Commands::Wipe { path } => {
            wipe_command(&path, quiet, cli.json).await?;
        }
        Commands::Exists { path } => {
            return exists_command(&path, cli.quiet, cli.json).await;
        }
        Commands::Ls { root } => {
            ls_command(&root, cli.json).await?;
        }
        Commands::Config { default, output } => {
            config_command(&config, default, output.as_deref(), cli.json)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(cli: &Cli, logging: &LoggingConfig) -> Result<()> {
    use std::sync::Mutex;
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let result = match (&logging.log_file, logging.json_format) {
        (Some(path), true) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder.json().with_writer(Mutex::new(file)).try_init()
        }
        (Some(path), false) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        (None, true) => builder.json().with_writer(std::io::stderr).try_init(),
        (None, false) => builder
            .with_ansi(logging.colored_output)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

async fn ditto_command(
    source: &Path,
    destination: &Path,
    move_files: bool,
    skip: &[String],
    quiet: bool,
    json: bool,
) -> Result<()> {
    let engine = ENGINE.get()?;
    let operation = if move_files {
        Operation::Move
    } else {
        Operation::Copy
    };

    info!("Source: {}", source.display());
    info!("Destination: {}", destination.display());
    info!("Operation: {:?}", operation);

    if !quiet {
        println!(
            "{} {} {} to {}",
            style("→").green().bold(),
            if move_files { "Moving" } else { "Copying" },
            style(source.display()).cyan(),
            style(destination.display()).cyan()
        );
    }

    let reporter = ProgressReporter::new(quiet, "Placing files");
    let mut options = DittoOptions::new()
        .operation(operation)
        .on_progress(reporter.callback());

    if !skip.is_empty() {
        let mut builder = GlobSetBuilder::new();
        for pattern in skip {
            builder.add(Glob::new(pattern).with_context(|| format!("Invalid --skip glob {}", pattern))?);
        }
        let skip_set = builder.build()?;
        options = options.should_skip(move |relative| skip_set.is_match(relative));
    }

    let stats = match engine.ditto(source, destination, options).await {
        Ok(stats) => stats,
        Err(e) => {
            reporter.finish_and_clear();
            return Err(e.into());
        }
    };
    reporter.finish("Mirror completed");

    if json {
        print_json(&OperationReportJson::new(
            "ditto",
            Some(source),
            destination,
            &stats,
        ))?;
    } else if !quiet {
        display_ditto_stats(&stats);
        if stats.skipped > 0 {
            display_warning(&format!("{} entries skipped", stats.skipped));
        }
    }

    Ok(())
}

async fn wipe_command(path: &Path, quiet: bool, json: bool) -> Result<()> {
    let engine = ENGINE.get()?;

    if !quiet {
        println!(
            "{} Wiping {}",
            style("✗").red().bold(),
            style(path.display()).cyan()
        );
    }

    let reporter = ProgressReporter::new(quiet, "Removing entries");
    let stats = match engine.wipe_with_progress(path, reporter.callback()).await {
        Ok(stats) => stats,
        Err(e) => {
            reporter.finish_and_clear();
            return Err(e.into());
        }
    };
    reporter.finish("Wipe completed");

    if json {
        print_json(&OperationReportJson::new("wipe", None, path, &stats))?;
    } else if !quiet {
        display_wipe_stats(&stats);
    }

    Ok(())
}

async fn exists_command(path: &Path, quiet: bool, json: bool) -> Result<ExitCode> {
    let exists = ENGINE.get()?.exists(path).await?;

    if json {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "exists": exists,
        }))?;
    } else if !quiet {
        if exists {
            display_success(&format!("{} exists", path.display()));
        } else {
            display_info(&format!("{} does not exist", path.display()));
        }
    }

    Ok(if exists {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

async fn ls_command(root: &Path, json: bool) -> Result<()> {
    let listing = ENGINE.get()?.enumerate(root).await?;

    if json {
        print_listing_json(&listing)?;
    } else {
        display_listing(&listing);
    }

    Ok(())
}

fn config_command(
    config: &Config,
    default: bool,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let shown = if default {
        Config::default()
    } else {
        config.clone()
    };

    if let Some(path) = output {
        ConfigLoader::save_to_file(&shown, path)?;
        display_success(&format!("Configuration written to {}", path.display()));
        return Ok(());
    }

    if json {
        print_json(&shown)?;
        return Ok(());
    }

    if default {
        println!("{} Default configuration:", style("⚙").blue().bold());
    } else {
        println!("{} Current configuration:", style("⚙").blue().bold());
        if ConfigLoader::config_exists().is_none() {
            display_info("No configuration file found, showing defaults");
        }
    }
    print!("{}", serde_yaml::to_string(&shown)?);

    Ok(())
}
