//! EcgSignal: container for a single-lead ECG recording

use crate::error::{check_sampling_rate, QrsError, QrsResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Single-lead ECG recording sampled at a constant rate
///
/// The sample buffer is immutable once captured; processing borrows it
/// read-only through [`EcgSignal::samples`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcgSignal {
    /// Unique identifier for this recording
    pub id: Uuid,
    samples: Vec<f64>,
    sampling_rate: f64,
    /// Creation timestamp (ms since epoch)
    pub created_at: u64,
}

impl EcgSignal {
    /// Create a new recording from raw samples
    pub fn new(samples: Vec<f64>, sampling_rate: f64) -> QrsResult<Self> {
        check_sampling_rate(sampling_rate)?;

        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(QrsError::InvalidSignalData {
                reason: format!("Sample {} is not a finite number", pos),
            });
        }

        Ok(EcgSignal {
            id: Uuid::new_v4(),
            samples,
            sampling_rate,
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the recording holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Borrow the sample buffer
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sampling rate in Hz
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Recording duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_rate
    }

    /// Basic amplitude statistics
    pub fn stats(&self) -> SignalStats {
        SignalStats::calculate(&self.samples)
    }

    /// Consume the recording and return its samples
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// Basic statistics for a sample sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub mean: f64,
    pub rms: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
}

impl SignalStats {
    pub fn calculate(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let rms = (data.iter().map(|x| x * x).sum::<f64>() / n).sqrt();

        let variance = data.iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak: max - min,
        }
    }
}
