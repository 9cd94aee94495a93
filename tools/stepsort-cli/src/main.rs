//! Stepsort CLI: drive a positioning actuator from classifier output.
//!
//! Usage:
//!   stepsort run [OPTIONS]         Run the control loop against a device
//!   stepsort replay <EVENTS>       Replay a recorded classifier stream offline
//!   stepsort check                 Validate the configuration
//!   stepsort init                  Write a default configuration file

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use stepsort_common::config::{AppConfig, LoggingConfig};
use stepsort_common::logging;

mod commands;

#[derive(Parser)]
#[command(
    name = "stepsort",
    about = "Debounced actuator control from per-frame classifications",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/stepsort/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop
    Run {
        /// Classifier JSONL stream; "-" reads standard input
        #[arg(short, long, default_value = "-")]
        events: PathBuf,

        /// Actuator device (overrides the configured one)
        #[arg(short, long)]
        device: Option<PathBuf>,

        /// Minimum confidence to accept a classification
        #[arg(long)]
        threshold: Option<f64>,

        /// Number of accepted labels the majority vote runs over
        #[arg(long)]
        capacity: Option<usize>,

        /// Write commands to stdout instead of the device
        #[arg(long)]
        dry_run: bool,
    },

    /// Replay a recorded classifier stream and print the resulting commands
    Replay {
        /// Path to the recorded JSONL stream
        events: PathBuf,

        /// Minimum confidence to accept a classification
        #[arg(long)]
        threshold: Option<f64>,

        /// Number of accepted labels the majority vote runs over
        #[arg(long)]
        capacity: Option<usize>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and show the class table
    Check,

    /// Write the default configuration
    Init {
        /// Where to write it (defaults to --config or the standard location)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            events,
            device,
            threshold,
            capacity,
            dry_run,
        } => {
            let config = setup(cli.config.as_deref(), cli.verbose)?;
            commands::run::run(config, events, device, threshold, capacity, dry_run).await
        }
        Commands::Replay {
            events,
            threshold,
            capacity,
            json,
        } => {
            let config = setup(cli.config.as_deref(), cli.verbose)?;
            commands::replay::run(config, events, threshold, capacity, json)
        }
        Commands::Check => {
            let config = setup(cli.config.as_deref(), cli.verbose)?;
            commands::check::run(config)
        }
        Commands::Init { output, force } => {
            logging::init_logging(&LoggingConfig::default(), cli.verbose);
            commands::init::run(output.or(cli.config), force)
        }
    }
}

/// Load configuration and initialize logging from it.
fn setup(config_path: Option<&Path>, verbose: bool) -> anyhow::Result<AppConfig> {
    let config = commands::load_config(config_path)?;
    logging::init_logging(&config.logging, verbose);
    Ok(config)
}
