//! `qrs simulate`: write a synthetic recording

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use qrs_simulation::{BeatMorphology, EcgConfig, EcgSimulator, NoiseConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Morphology {
    /// Single-sample spikes
    Impulse,
    /// QRS complex with P and T waves
    #[default]
    Gaussian,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Sampling rate in Hz
    #[arg(short = 's', long, default_value_t = 250.0)]
    pub sampling_rate: f64,

    /// Heart rate in beats per minute
    #[arg(long, default_value_t = 72.0)]
    pub bpm: f64,

    /// Recording length in seconds
    #[arg(short, long, default_value_t = 10.0)]
    pub duration: f64,

    /// Beat shape
    #[arg(long, value_enum, default_value_t = Morphology::Gaussian)]
    pub morphology: Morphology,

    /// Beat amplitude
    #[arg(long, default_value_t = 1.0)]
    pub amplitude: f64,

    /// Add Gaussian noise, baseline wander and power line interference
    #[arg(long)]
    pub noise: bool,

    /// Random seed for reproducible noise
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl SimulateArgs {
    pub fn ecg_config(&self) -> EcgConfig {
        ecg_config(
            self.sampling_rate,
            self.bpm,
            self.morphology,
            self.amplitude,
            self.noise,
            self.seed,
        )
    }
}

/// Simulator configuration shared by `simulate` and `stream`
pub fn ecg_config(
    sampling_rate_hz: f64,
    heart_rate_bpm: f64,
    morphology: Morphology,
    amplitude: f64,
    noise: bool,
    seed: Option<u64>,
) -> EcgConfig {
    let morphology = match morphology {
        Morphology::Impulse => BeatMorphology::Impulse { amplitude },
        Morphology::Gaussian => BeatMorphology::Gaussian {
            amplitude,
            width_s: 0.1,
        },
    };

    EcgConfig {
        sampling_rate_hz,
        heart_rate_bpm,
        morphology,
        noise: if noise { NoiseConfig::default() } else { NoiseConfig::none() },
        seed,
    }
}

/// Write one sample per line
pub fn write_samples<W: Write>(writer: &mut W, samples: &[f64]) -> io::Result<()> {
    for sample in samples {
        writeln!(writer, "{}", sample)?;
    }
    writer.flush()
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    let mut simulator = EcgSimulator::new(args.ecg_config()).context("Invalid simulation parameters")?;
    let signal = simulator.generate(args.duration)?;
    let beats = simulator.beat_indices(signal.len()).len();

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
            write_samples(&mut BufWriter::new(file), signal.samples())
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            write_samples(&mut stdout.lock(), signal.samples())?;
        }
    }

    info!(samples = signal.len(), beats, "Simulated recording written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_samples() {
        let mut out = Vec::new();
        write_samples(&mut out, &[1.0, -0.5, 0.0]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\n-0.5\n0\n");
    }

    #[test]
    fn test_ecg_config_mapping() {
        let config = ecg_config(500.0, 60.0, Morphology::Impulse, 2.0, false, Some(3));
        assert_eq!(config.morphology, BeatMorphology::Impulse { amplitude: 2.0 });
        assert_eq!(config.noise.gaussian_std, 0.0);
        assert_eq!(config.seed, Some(3));

        let noisy = ecg_config(500.0, 60.0, Morphology::Gaussian, 1.0, true, None);
        assert!(noisy.noise.gaussian_std > 0.0);
    }

    #[test]
    fn test_simulated_output_round_trips_through_ingestion() {
        let config = ecg_config(250.0, 60.0, Morphology::Gaussian, 1.0, true, Some(11));
        let signal = EcgSimulator::new(config).unwrap().generate(2.0).unwrap();

        let mut out = Vec::new();
        write_samples(&mut out, signal.samples()).unwrap();
        let ingested = qrs_core::read_samples(out.as_slice()).unwrap();

        assert_eq!(ingested.samples, signal.samples());
        assert_eq!(ingested.skipped, 0);
    }
}
