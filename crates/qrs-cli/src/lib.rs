//! QRS command line interface
//!
//! # Usage
//!
//! ```bash
//! # Detect beats in a recording, one sample per line
//! qrs detect recording.csv --sampling-rate 360
//!
//! # Write ten seconds of synthetic ECG
//! qrs simulate --bpm 72 --duration 10 --noise --output ecg.csv
//!
//! # Run the online detector against a live simulated stream
//! qrs stream --bpm 90 --duration 15
//! ```

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod detect;
pub mod simulate;
pub mod stream;

/// Pan–Tompkins QRS detection toolkit
#[derive(Parser, Debug)]
#[command(name = "qrs")]
#[command(author, version, about = "QRS complex detection for single-lead ECG")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect beats in a delimited text recording
    Detect(detect::DetectArgs),

    /// Generate a synthetic ECG recording
    Simulate(simulate::SimulateArgs),

    /// Detect beats online from a simulated real-time stream
    Stream(stream::StreamArgs),
}

/// Log filter for a `-v` count; `RUST_LOG` takes precedence when set
pub fn log_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the fmt subscriber on stderr
pub fn init_logging(verbosity: u8) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter(verbosity))))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(2), "debug");
        assert_eq!(log_filter(9), "trace");
    }

    #[test]
    fn test_parse_detect() {
        let cli = Cli::try_parse_from(["qrs", "-vv", "detect", "ecg.csv", "--sampling-rate", "360", "--json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Detect(args) => {
                assert_eq!(args.file.to_str(), Some("ecg.csv"));
                assert_eq!(args.sampling_rate, Some(360.0));
                assert!(args.json);
                assert_eq!(args.preview, 0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::try_parse_from(["qrs", "simulate"]).unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.sampling_rate, 250.0);
                assert_eq!(args.bpm, 72.0);
                assert!(!args.noise);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_detect_requires_file() {
        assert!(Cli::try_parse_from(["qrs", "detect"]).is_err());
    }
}
