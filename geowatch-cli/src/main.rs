//! Geowatch CLI - command-line interface
//!
//! Checks points against geofence feeds, replays recorded fixes through the
//! monitor, and manages the config file.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use geowatch::logging::{init_logging, LoggingConfig, LoggingGuard};

use commands::check::CheckArgs;
use commands::common::{load_config, StatusArg};
use commands::config::ConfigCommands;
use commands::replay::ReplayArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "geowatch")]
#[command(version, about = "Geofence exit detection and status reporting", long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a point is inside any active geofence
    Check {
        /// Geofence feed JSON file
        #[arg(short, long)]
        geofences: PathBuf,

        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Evaluation time in Unix milliseconds (default: now)
        #[arg(long)]
        at: Option<i64>,
    },

    /// Replay recorded fixes through the monitor
    Replay {
        /// Geofence feed JSON file
        #[arg(short, long)]
        geofences: PathBuf,

        /// JSON-lines file of {lat, lng, timestamp_ms, device_id?}
        #[arg(short, long)]
        fixes: PathBuf,

        /// Device id for lines without one
        #[arg(short, long)]
        device: Option<String>,

        /// Persisted status to seed each device with before its first fix
        #[arg(long, value_enum)]
        seed: Option<StatusArg>,

        /// Inject periodic report ticks in replay time
        #[arg(long)]
        ticks: bool,

        /// Report interval in seconds (default: from config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: Option<u64>,
    },

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config commands print plain output; everything else logs.
    let _guard = match &cli.command {
        Commands::Config { .. } => None,
        _ => match setup_logging(cli.verbose) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) -> Result<LoggingGuard, CliError> {
    let mut config = LoggingConfig::from(&load_config());
    if verbose {
        config.level = "debug".to_string();
    }
    Ok(init_logging(&config)?)
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Check {
            geofences,
            lat,
            lng,
            at,
        } => commands::check::run(CheckArgs {
            geofences,
            lat,
            lng,
            at,
        }),
        Commands::Replay {
            geofences,
            fixes,
            device,
            seed,
            ticks,
            interval_secs,
        } => commands::replay::run(ReplayArgs {
            geofences,
            fixes,
            device,
            seed,
            ticks,
            interval_secs,
        }),
        Commands::Config { command } => commands::config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "geowatch",
            "replay",
            "-g",
            "fences.json",
            "-f",
            "fixes.jsonl",
            "--seed",
            "inside",
            "--ticks",
        ])
        .unwrap();
        match cli.command {
            Commands::Replay { seed, ticks, .. } => {
                assert_eq!(seed, Some(StatusArg::Inside));
                assert!(ticks);
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "geowatch", "check", "-g", "f.json", "--lat", "-33.9", "--lng", "18.4",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Check { lat, .. } if lat < 0.0));
    }
}
