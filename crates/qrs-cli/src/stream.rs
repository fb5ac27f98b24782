//! `qrs stream`: online detection against a live simulated stream

use crate::simulate::{ecg_config, Morphology};
use anyhow::{Context, Result};
use clap::Args;
use qrs_processing::{DefaultSample, DetectionResult, DetectorConfig, StreamingPipeline};
use qrs_simulation::{start_ecg_stream, StreamCommand, StreamConfig};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Sampling rate in Hz
    #[arg(short = 's', long, default_value_t = 250.0)]
    pub sampling_rate: f64,

    /// Heart rate in beats per minute
    #[arg(long, default_value_t = 72.0)]
    pub bpm: f64,

    /// Stream length in seconds
    #[arg(short, long, default_value_t = 10.0)]
    pub duration: f64,

    /// Chunk length in milliseconds
    #[arg(long, default_value_t = 100)]
    pub chunk_ms: u64,

    /// Add Gaussian noise, baseline wander and power line interference
    #[arg(long)]
    pub noise: bool,

    /// Random seed for reproducible noise
    #[arg(long)]
    pub seed: Option<u64>,
}

impl StreamArgs {
    /// Stream configuration emitting one chunk per chunk period
    pub fn stream_config(&self) -> StreamConfig {
        let chunk_duration_s = self.chunk_ms as f64 / 1000.0;
        StreamConfig {
            ecg_config: ecg_config(
                self.sampling_rate,
                self.bpm,
                Morphology::Gaussian,
                1.0,
                self.noise,
                self.seed,
            ),
            chunk_duration_s,
            buffer_size: 64,
            update_rate_hz: 1.0 / chunk_duration_s,
        }
    }

    fn target_samples(&self) -> usize {
        (self.duration * self.sampling_rate).round().max(0.0) as usize
    }

    /// Samples carried by one stream chunk
    fn chunk_samples(&self) -> usize {
        (self.chunk_ms as f64 / 1000.0 * self.sampling_rate).round() as usize
    }
}

/// Stream time of a beat, counting samples lost to receiver lag
fn stream_time_s(beat: usize, dropped: usize, sampling_rate: f64) -> f64 {
    (beat + dropped) as f64 / sampling_rate
}

pub async fn execute(args: StreamArgs) -> Result<()> {
    let mut pipeline = StreamingPipeline::<DefaultSample>::new(DetectorConfig::new(args.sampling_rate))
        .context("Invalid detector parameters")?;
    let (mut chunks, control) = start_ecg_stream(args.stream_config())
        .await
        .context("Invalid stream parameters")?;

    let target = args.target_samples();
    // beat indices count processed samples only; dropped chunks shift stream time
    let mut dropped = 0usize;
    control.send(StreamCommand::Start).await?;
    info!(target, "Streaming started");

    while pipeline.samples_seen() + dropped < target {
        match chunks.recv().await {
            Ok(chunk) => {
                let remaining = target.saturating_sub(pipeline.samples_seen() + dropped);
                for &sample in chunk.samples().iter().take(remaining) {
                    for beat in pipeline.push(sample) {
                        let time_s = stream_time_s(beat, dropped, args.sampling_rate);
                        info!(beat, time_s, "Beat detected");
                        println!("beat {:>8} at {:>8.3} s", beat, time_s);
                    }
                }
            }
            Err(RecvError::Lagged(missed)) => {
                dropped += missed as usize * args.chunk_samples();
                warn!(
                    missed,
                    drift_s = dropped as f64 / args.sampling_rate,
                    "Detector fell behind the stream, chunks dropped"
                );
            }
            Err(RecvError::Closed) => {
                warn!("Stream closed early");
                break;
            }
        }
    }

    // Task may already be gone; nothing left to stop then
    let _ = control.send(StreamCommand::Shutdown).await;

    print_summary(&pipeline.finish());
    Ok(())
}

fn print_summary(result: &DetectionResult<DefaultSample>) {
    println!("Beats:      {}", result.beat_count());
    if result.heart_rate_bpm > 0 {
        println!("Heart rate: {} bpm", result.heart_rate_bpm);
    } else {
        println!("Heart rate: unavailable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(duration: f64) -> StreamArgs {
        StreamArgs {
            sampling_rate: 250.0,
            bpm: 120.0,
            duration,
            chunk_ms: 20,
            noise: false,
            seed: Some(5),
        }
    }

    #[test]
    fn test_stream_config() {
        let config = args(1.0).stream_config();
        assert_eq!(config.chunk_duration_s, 0.02);
        assert_eq!(config.update_rate_hz, 50.0);
        assert!(config.validate().is_ok());
        assert_eq!(args(2.5).target_samples(), 625);
    }

    #[test]
    fn test_dropped_chunks_shift_beat_times() {
        let args = args(1.0);
        assert_eq!(args.chunk_samples(), 5);

        assert_eq!(stream_time_s(100, 0, 250.0), 0.4);
        let dropped = 3 * args.chunk_samples();
        assert_eq!(stream_time_s(100, dropped, 250.0), 0.46);
    }

    #[tokio::test]
    async fn test_stream_execute_completes() {
        assert!(execute(args(1.0)).await.is_ok());
    }
}
