//! Configuration management for QRS detection

use qrs_core::error::{check_cutoff, check_sampling_rate};
use qrs_core::{QrsError, QrsResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Detector configuration
///
/// Durations are given in seconds and converted to sample counts against
/// `sampling_rate_hz` with round-to-nearest and a floor of one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Sampling rate of the input (Hz)
    pub sampling_rate_hz: f64,
    /// Low-pass cutoff (Hz)
    pub low_pass_cutoff_hz: f64,
    /// High-pass cutoff (Hz)
    pub high_pass_cutoff_hz: f64,
    /// Moving-window integration width (s)
    pub integration_window_s: f64,
    /// Minimum spacing between accepted beats (s)
    pub refractory_period_s: f64,
    /// Leading segment used to seed SPKI/NPKI (s)
    pub init_segment_s: f64,
    /// Shortest recording that is processed at all (s)
    pub min_duration_s: f64,
}

impl DetectorConfig {
    /// Defaults at the given sampling rate
    pub fn new(sampling_rate_hz: f64) -> Self {
        Self {
            sampling_rate_hz,
            ..Self::default()
        }
    }

    /// Builder-style sampling rate override
    pub fn with_sampling_rate(mut self, sampling_rate_hz: f64) -> Self {
        self.sampling_rate_hz = sampling_rate_hz;
        self
    }

    /// Builder-style band-pass override
    pub fn with_band(mut self, low_pass_cutoff_hz: f64, high_pass_cutoff_hz: f64) -> Self {
        self.low_pass_cutoff_hz = low_pass_cutoff_hz;
        self.high_pass_cutoff_hz = high_pass_cutoff_hz;
        self
    }

    /// Validate entire configuration
    pub fn validate(&self) -> QrsResult<()> {
        let fs = check_sampling_rate(self.sampling_rate_hz)?;
        check_cutoff("low-pass", self.low_pass_cutoff_hz)?;
        check_cutoff("high-pass", self.high_pass_cutoff_hz)?;

        Self::check_duration("integration window", self.integration_window_s)?;
        Self::check_duration("refractory period", self.refractory_period_s)?;
        Self::check_duration("initialization segment", self.init_segment_s)?;

        if !self.min_duration_s.is_finite() || self.min_duration_s < 0.0 {
            return Err(QrsError::InvalidWindow {
                name: "minimum duration",
                value: self.min_duration_s,
            });
        }

        let nyquist = fs / 2.0;
        if self.low_pass_cutoff_hz >= nyquist {
            warn!(
                cutoff = self.low_pass_cutoff_hz,
                nyquist,
                "Low-pass cutoff at or above Nyquist frequency"
            );
        }
        if self.high_pass_cutoff_hz >= self.low_pass_cutoff_hz {
            warn!(
                low_pass = self.low_pass_cutoff_hz,
                high_pass = self.high_pass_cutoff_hz,
                "High-pass cutoff is not below low-pass cutoff, pass band is empty"
            );
        }

        Ok(())
    }

    fn check_duration(name: &'static str, value: f64) -> QrsResult<()> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(QrsError::InvalidWindow { name, value })
        }
    }

    fn seconds_to_samples(&self, seconds: f64) -> usize {
        ((seconds * self.sampling_rate_hz).round() as usize).max(1)
    }

    /// Moving-window integration width in samples
    pub fn integration_window(&self) -> usize {
        self.seconds_to_samples(self.integration_window_s)
    }

    /// Refractory period in samples
    pub fn refractory_samples(&self) -> usize {
        self.seconds_to_samples(self.refractory_period_s)
    }

    /// Threshold seeding segment in samples (before clipping to the input)
    pub fn init_segment_samples(&self) -> usize {
        self.seconds_to_samples(self.init_segment_s)
    }

    /// Minimum number of samples a recording needs, as a real count
    pub fn min_samples(&self) -> f64 {
        self.min_duration_s * self.sampling_rate_hz
    }

    /// Whether a recording of `len` samples is long enough to process
    pub fn is_sufficient(&self, len: usize) -> bool {
        len as f64 >= self.min_samples()
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> QrsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| QrsError::Serialization {
            reason: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> QrsResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| QrsError::Serialization {
            reason: format!("Failed to deserialize configuration: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            sampling_rate_hz: 250.0,
            low_pass_cutoff_hz: 15.0,
            high_pass_cutoff_hz: 5.0,
            integration_window_s: 0.150,
            refractory_period_s: 0.200,
            init_segment_s: 2.0,
            min_duration_s: 0.5,
        }
    }
}
