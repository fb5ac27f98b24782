//! QRS-Processing: Pan–Tompkins beat detection
//!
//! Band-pass filtering, derivative, squaring and moving-window integration
//! followed by an adaptive-threshold peak detector and heart rate estimate.

pub mod config;
pub mod detector;
pub mod filters;
pub mod heart_rate;
pub mod pipeline;
pub mod processor;
pub mod sample;

pub use config::DetectorConfig;
pub use detector::{detect_peaks, AdaptiveDetector, PeakDetection, ThresholdState};
pub use filters::{
    band_pass, derivative, high_pass, low_pass, moving_average, square, BandPassFilter,
    DerivativeFilter, HighPassFilter, LowPassFilter, MovingAverageFilter, Squarer,
};
pub use heart_rate::{estimate_heart_rate, instantaneous_heart_rates, mean_rr_interval, rr_intervals};
pub use pipeline::*;
pub use processor::{ProcessorType, SignalProcessor};
pub use sample::{DefaultSample, Sample};
