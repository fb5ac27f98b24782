//! Synthetic single-lead ECG with regular beats

use qrs_core::error::check_sampling_rate;
use qrs_core::{config_error, EcgSignal, QrsError, QrsResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// P and T waves relative to the R peak: (amplitude ratio, offset s, sigma s)
const P_WAVE: (f64, f64, f64) = (0.12, -0.18, 0.025);
const T_WAVE: (f64, f64, f64) = (0.3, 0.28, 0.04);
/// Distance from the R peak beyond which a beat contributes nothing
const BEAT_SUPPORT_S: f64 = 0.5;

/// Shape of a single heartbeat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BeatMorphology {
    /// One non-zero sample per beat
    Impulse { amplitude: f64 },
    /// Gaussian QRS complex of width `width_s` with small P and T waves
    Gaussian { amplitude: f64, width_s: f64 },
}

impl BeatMorphology {
    fn validate(&self) -> QrsResult<()> {
        match *self {
            BeatMorphology::Impulse { amplitude } if amplitude.is_finite() => Ok(()),
            BeatMorphology::Gaussian { amplitude, width_s }
                if amplitude.is_finite() && width_s.is_finite() && width_s > 0.0 =>
            {
                Ok(())
            }
            other => Err(config_error!("Invalid beat morphology: {:?}", other)),
        }
    }

    /// Waveform value `offset_s` seconds away from the R peak
    fn value_at(&self, offset_s: f64) -> f64 {
        match *self {
            BeatMorphology::Impulse { amplitude } => {
                if offset_s == 0.0 {
                    amplitude
                } else {
                    0.0
                }
            }
            BeatMorphology::Gaussian { amplitude, width_s } => {
                let qrs = gaussian(offset_s, 0.0, width_s / 6.0);
                let p = P_WAVE.0 * gaussian(offset_s, P_WAVE.1, P_WAVE.2);
                let t = T_WAVE.0 * gaussian(offset_s, T_WAVE.1, T_WAVE.2);
                amplitude * (qrs + p + t)
            }
        }
    }
}

fn gaussian(x: f64, center: f64, sigma: f64) -> f64 {
    let z = (x - center) / sigma;
    (-0.5 * z * z).exp()
}

/// Noise configuration for realistic ECG simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
    /// Baseline wander amplitude
    pub baseline_wander: f64,
    /// Baseline wander frequency (Hz)
    pub baseline_wander_hz: f64,
    /// Power line interference amplitude
    pub powerline_amplitude: f64,
    /// Power line frequency (Hz)
    pub powerline_hz: f64,
}

impl NoiseConfig {
    /// Noise-free configuration
    pub fn none() -> Self {
        Self {
            gaussian_std: 0.0,
            baseline_wander: 0.0,
            baseline_wander_hz: 0.3,
            powerline_amplitude: 0.0,
            powerline_hz: 50.0,
        }
    }

    fn validate(&self) -> QrsResult<()> {
        let fields = [
            ("gaussian_std", self.gaussian_std),
            ("baseline_wander", self.baseline_wander),
            ("baseline_wander_hz", self.baseline_wander_hz),
            ("powerline_amplitude", self.powerline_amplitude),
            ("powerline_hz", self.powerline_hz),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            Some((name, value)) => Err(config_error!("Noise parameter {} must be non-negative, got {}", name, value)),
            None => Ok(()),
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 0.02,
            baseline_wander: 0.05,
            baseline_wander_hz: 0.3,
            powerline_amplitude: 0.02,
            powerline_hz: 50.0,
        }
    }
}

/// Configuration for ECG simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcgConfig {
    /// Sampling rate in Hz
    pub sampling_rate_hz: f64,
    /// Constant heart rate in beats per minute
    pub heart_rate_bpm: f64,
    /// Beat shape
    pub morphology: BeatMorphology,
    /// Noise configuration
    pub noise: NoiseConfig,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl EcgConfig {
    pub fn validate(&self) -> QrsResult<()> {
        check_sampling_rate(self.sampling_rate_hz)?;

        if !self.heart_rate_bpm.is_finite() || self.heart_rate_bpm <= 0.0 {
            return Err(config_error!("Heart rate must be positive, got {}", self.heart_rate_bpm));
        }
        if 60.0 * self.sampling_rate_hz / self.heart_rate_bpm < 1.0 {
            return Err(config_error!(
                "Heart rate {} bpm exceeds one beat per sample at {} Hz",
                self.heart_rate_bpm,
                self.sampling_rate_hz
            ));
        }

        self.morphology.validate()?;
        self.noise.validate()
    }

    /// Samples between consecutive beats
    pub fn beat_period_samples(&self) -> usize {
        ((60.0 * self.sampling_rate_hz / self.heart_rate_bpm).round() as usize).max(1)
    }

    /// Index of the first beat; half a period in so the first complex is whole
    pub fn first_beat_sample(&self) -> usize {
        self.beat_period_samples() / 2
    }
}

impl Default for EcgConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 250.0,
            heart_rate_bpm: 72.0,
            morphology: BeatMorphology::Gaussian {
                amplitude: 1.0,
                width_s: 0.1,
            },
            noise: NoiseConfig::default(),
            seed: None,
        }
    }
}

/// ECG signal simulator
///
/// Successive [`EcgSimulator::generate`] calls continue the same recording,
/// so chunked generation matches one long call with the same seed.
pub struct EcgSimulator {
    config: EcgConfig,
    rng: StdRng,
    normal_dist: Normal<f64>,
    position: usize,
}

impl EcgSimulator {
    /// Create new ECG simulator with configuration
    pub fn new(config: EcgConfig) -> QrsResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let normal_dist = Self::noise_distribution(&config.noise)?;

        debug!(
            fs = config.sampling_rate_hz,
            bpm = config.heart_rate_bpm,
            period = config.beat_period_samples(),
            seed = ?config.seed,
            "Created ECG simulator"
        );

        Ok(EcgSimulator {
            config,
            rng,
            normal_dist,
            position: 0,
        })
    }

    fn noise_distribution(noise: &NoiseConfig) -> QrsResult<Normal<f64>> {
        Normal::new(0.0, noise.gaussian_std).map_err(|e| QrsError::SimulationError {
            message: format!("Failed to create normal distribution: {}", e),
        })
    }

    /// Generate the next `duration_s` seconds of signal
    pub fn generate(&mut self, duration_s: f64) -> QrsResult<EcgSignal> {
        if !duration_s.is_finite() || duration_s < 0.0 {
            return Err(QrsError::SimulationError {
                message: format!("Invalid duration: {}", duration_s),
            });
        }

        let fs = self.config.sampling_rate_hz;
        let count = (duration_s * fs).round() as usize;
        let data: Vec<f64> = (self.position..self.position + count)
            .map(|n| self.beat_value(n) + self.noise_value(n as f64 / fs))
            .collect();

        debug!(start = self.position, count, "Generated ECG chunk");
        self.position += count;

        EcgSignal::new(data, fs)
    }

    /// Beat positions in a fresh recording of `len` samples
    pub fn beat_indices(&self, len: usize) -> Vec<usize> {
        let first = self.config.first_beat_sample();
        if first >= len {
            return Vec::new();
        }
        (first..len).step_by(self.config.beat_period_samples()).collect()
    }

    /// Clean waveform value at absolute sample `n`
    fn beat_value(&self, n: usize) -> f64 {
        let fs = self.config.sampling_rate_hz;
        let period = self.config.beat_period_samples() as i64;
        let first = self.config.first_beat_sample() as i64;
        let support = (BEAT_SUPPORT_S * fs).ceil() as i64;
        let n = n as i64;

        let lo = (n - support - first).div_euclid(period).max(0);
        let hi = (n + support - first).div_euclid(period);

        (lo..=hi)
            .map(|k| first + k * period)
            .filter(|&beat| (n - beat).abs() <= support)
            .map(|beat| self.config.morphology.value_at((n - beat) as f64 / fs))
            .sum()
    }

    fn noise_value(&mut self, time: f64) -> f64 {
        let noise = &self.config.noise;
        let mut value = self.normal_dist.sample(&mut self.rng);

        // Baseline wander (slow drift)
        value += noise.baseline_wander * (2.0 * PI * noise.baseline_wander_hz * time).sin();
        value += noise.powerline_amplitude * (2.0 * PI * noise.powerline_hz * time).sin();

        value
    }

    /// Change the heart rate for subsequent samples
    pub fn set_heart_rate(&mut self, bpm: f64) -> QrsResult<()> {
        let mut config = self.config.clone();
        config.heart_rate_bpm = bpm;
        self.update_config(config)
    }

    /// Replace the configuration; the random stream is kept
    pub fn update_config(&mut self, config: EcgConfig) -> QrsResult<()> {
        config.validate()?;
        self.normal_dist = Self::noise_distribution(&config.noise)?;
        self.config = config;
        Ok(())
    }

    /// Reset time offset (useful for restarting simulation)
    pub fn reset_time(&mut self) {
        self.position = 0;
    }

    /// Samples generated since the last reset
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get current configuration
    pub fn config(&self) -> &EcgConfig {
        &self.config
    }
}

/// `len` zero samples with `amplitude` at `first`, `first + spacing`, ...
///
/// A zero `spacing` places a single impulse.
pub fn impulse_train(len: usize, first: usize, spacing: usize, amplitude: f64) -> Vec<f64> {
    let mut signal = vec![0.0; len];
    if spacing == 0 {
        if let Some(sample) = signal.get_mut(first) {
            *sample = amplitude;
        }
        return signal;
    }

    for idx in (first..len).step_by(spacing) {
        signal[idx] = amplitude;
    }
    signal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_config(morphology: BeatMorphology) -> EcgConfig {
        EcgConfig {
            sampling_rate_hz: 250.0,
            heart_rate_bpm: 60.0,
            morphology,
            noise: NoiseConfig::none(),
            seed: Some(7),
        }
    }

    #[test]
    fn test_ecg_simulator_basic() {
        let mut simulator = EcgSimulator::new(EcgConfig::default()).unwrap();
        let signal = simulator.generate(2.0).unwrap();

        assert_eq!(signal.len(), 500);
        assert_eq!(signal.sampling_rate(), 250.0);
        assert_eq!(simulator.position(), 500);
    }

    #[test]
    fn test_beat_indices() {
        let simulator = EcgSimulator::new(clean_config(BeatMorphology::Impulse { amplitude: 1.0 })).unwrap();
        assert_eq!(simulator.beat_indices(600), vec![125, 375]);
        assert!(simulator.beat_indices(100).is_empty());
    }

    #[test]
    fn test_impulse_morphology_places_beats() {
        let mut simulator = EcgSimulator::new(clean_config(BeatMorphology::Impulse { amplitude: 3.0 })).unwrap();
        let signal = simulator.generate(4.0).unwrap();

        let nonzero: Vec<usize> = signal
            .samples()
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(nonzero, simulator.beat_indices(signal.len()));
        assert_eq!(signal.samples()[125], 3.0);
    }

    #[test]
    fn test_gaussian_peaks_at_beats() {
        let config = clean_config(BeatMorphology::Gaussian {
            amplitude: 1.0,
            width_s: 0.1,
        });
        let mut simulator = EcgSimulator::new(config).unwrap();
        let signal = simulator.generate(4.0).unwrap();
        let samples = signal.samples();

        for beat in simulator.beat_indices(samples.len()) {
            assert!(samples[beat] > samples[beat - 1]);
            assert!(samples[beat] > samples[beat + 1]);
            assert!((samples[beat] - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_chunked_generation_is_continuous() {
        let config = EcgConfig {
            seed: Some(42),
            ..EcgConfig::default()
        };

        let mut whole = EcgSimulator::new(config.clone()).unwrap();
        let mut chunked = EcgSimulator::new(config).unwrap();

        let full = whole.generate(2.0).unwrap();
        let mut pieces = chunked.generate(1.0).unwrap().into_samples();
        pieces.extend(chunked.generate(1.0).unwrap().into_samples());

        assert_eq!(full.samples(), pieces.as_slice());
    }

    #[test]
    fn test_reset_time_restarts_waveform() {
        let mut simulator = EcgSimulator::new(clean_config(BeatMorphology::Gaussian {
            amplitude: 1.0,
            width_s: 0.1,
        }))
        .unwrap();

        let first = simulator.generate(1.0).unwrap();
        simulator.reset_time();
        let second = simulator.generate(1.0).unwrap();
        assert_eq!(first.samples(), second.samples());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = EcgConfig::default();
        config.heart_rate_bpm = 0.0;
        assert!(matches!(EcgSimulator::new(config), Err(QrsError::InvalidConfig { .. })));

        let mut config = EcgConfig::default();
        config.sampling_rate_hz = -1.0;
        assert!(matches!(EcgSimulator::new(config), Err(QrsError::InvalidSamplingRate { .. })));

        let mut config = EcgConfig::default();
        config.noise.gaussian_std = -0.1;
        assert!(EcgSimulator::new(config).is_err());

        let mut config = EcgConfig::default();
        config.morphology = BeatMorphology::Gaussian {
            amplitude: 1.0,
            width_s: 0.0,
        };
        assert!(EcgSimulator::new(config).is_err());

        let mut simulator = EcgSimulator::new(EcgConfig::default()).unwrap();
        assert!(simulator.generate(-1.0).is_err());
        assert!(simulator.set_heart_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_set_heart_rate() {
        let mut simulator = EcgSimulator::new(clean_config(BeatMorphology::Impulse { amplitude: 1.0 })).unwrap();
        simulator.set_heart_rate(120.0).unwrap();
        assert_eq!(simulator.config().beat_period_samples(), 125);
        assert_eq!(simulator.beat_indices(300), vec![62, 187]);
    }

    #[test]
    fn test_impulse_train() {
        let signal = impulse_train(10, 2, 3, 5.0);
        assert_eq!(signal, vec![0.0, 0.0, 5.0, 0.0, 0.0, 5.0, 0.0, 0.0, 5.0, 0.0]);

        let single = impulse_train(4, 1, 0, 2.0);
        assert_eq!(single, vec![0.0, 2.0, 0.0, 0.0]);
        assert_eq!(impulse_train(3, 5, 1, 1.0), vec![0.0; 3]);
    }
}
