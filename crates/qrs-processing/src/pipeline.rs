//! Pan–Tompkins processing pipeline
//!
//! Stage chain: low-pass → high-pass → derivative → squaring → moving-window
//! integration → adaptive detection → heart rate. The batch entry point
//! ([`PanTompkins::detect`]) drives the same per-sample stages as
//! [`StreamingPipeline`], so online and offline runs are bit-identical.

use crate::config::DetectorConfig;
use crate::detector::AdaptiveDetector;
use crate::filters::{DerivativeFilter, HighPassFilter, LowPassFilter, MovingAverageFilter, Squarer};
use crate::heart_rate::{estimate_heart_rate, instantaneous_heart_rates, rr_intervals};
use crate::processor::{ProcessorType, SignalProcessor};
use crate::sample::Sample;
use qrs_core::{EcgSignal, QrsResult};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info_span, warn};

/// Result of one detection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult<T> {
    /// Moving-window integrated signal, one value per input sample
    pub integrated: Vec<T>,
    /// Accepted beat positions in the integrated signal
    pub peaks: Vec<usize>,
    /// Decision threshold after the last candidate
    pub threshold: T,
    /// Average heart rate in beats per minute (0 if unavailable)
    pub heart_rate_bpm: u32,
    /// Sampling rate the run used (Hz)
    pub sampling_rate_hz: f64,
}

impl<T: Sample> DetectionResult<T> {
    /// Result for input that was too short to process
    pub fn empty(sampling_rate_hz: f64) -> Self {
        Self {
            integrated: Vec::new(),
            peaks: Vec::new(),
            threshold: T::zero(),
            heart_rate_bpm: 0,
            sampling_rate_hz,
        }
    }

    /// Whether any beat was found
    pub fn has_beats(&self) -> bool {
        !self.peaks.is_empty()
    }

    /// Number of accepted beats
    pub fn beat_count(&self) -> usize {
        self.peaks.len()
    }

    /// RR intervals in samples
    pub fn rr_intervals(&self) -> Vec<usize> {
        rr_intervals(&self.peaks)
    }

    /// Beat-to-beat heart rates
    pub fn instantaneous_heart_rates(&self) -> Vec<f64> {
        instantaneous_heart_rates(&self.peaks, self.sampling_rate_hz)
    }

    /// Peak positions in seconds from the start of the recording
    pub fn peak_times(&self) -> Vec<f64> {
        self.peaks
            .iter()
            .map(|&idx| idx as f64 / self.sampling_rate_hz)
            .collect()
    }
}

/// Ordered chain of per-sample processors
pub struct FilterBank<T: Sample> {
    filters: Vec<Box<dyn SignalProcessor<T>>>,
}

impl<T: Sample> FilterBank<T> {
    /// Create new empty filter bank
    pub fn new() -> Self {
        FilterBank {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the end of the chain
    pub fn add_filter(&mut self, filter: Box<dyn SignalProcessor<T>>) {
        self.filters.push(filter);
    }

    /// The five Pan–Tompkins enhancement stages
    pub fn pan_tompkins(config: &DetectorConfig) -> QrsResult<Self> {
        let fs = config.sampling_rate_hz;
        let mut bank = FilterBank::new();

        bank.add_filter(Box::new(LowPassFilter::new(config.low_pass_cutoff_hz, fs)?));
        bank.add_filter(Box::new(HighPassFilter::new(config.high_pass_cutoff_hz, fs)?));
        bank.add_filter(Box::new(DerivativeFilter::new(fs)?));
        bank.add_filter(Box::new(Squarer));
        bank.add_filter(Box::new(MovingAverageFilter::new(config.integration_window())?));

        Ok(bank)
    }

    /// Names of the chained processors, in order
    pub fn filter_names(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.name().to_string()).collect()
    }

    /// Number of chained processors
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<T: Sample> Default for FilterBank<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> SignalProcessor<T> for FilterBank<T> {
    fn step(&mut self, input: T) -> T {
        self.filters
            .iter_mut()
            .fold(input, |sample, filter| filter.step(sample))
    }

    fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    fn name(&self) -> &str {
        "Filter Bank"
    }

    fn processor_type(&self) -> ProcessorType {
        self.filters
            .last()
            .map(|f| f.processor_type())
            .unwrap_or(ProcessorType::Filter)
    }

    fn warmup_samples(&self) -> usize {
        self.filters.iter().map(|f| f.warmup_samples()).sum()
    }
}

/// Online Pan–Tompkins detector
///
/// Push samples as they arrive; accepted beats are reported as soon as the
/// detector can decide on them. [`StreamingPipeline::finish`] applies the
/// short-recording policy and assembles the [`DetectionResult`].
pub struct StreamingPipeline<T: Sample> {
    config: DetectorConfig,
    bank: FilterBank<T>,
    detector: AdaptiveDetector<T>,
    integrated: Vec<T>,
}

impl<T: Sample> StreamingPipeline<T> {
    pub fn new(config: DetectorConfig) -> QrsResult<Self> {
        config.validate()?;
        Self::from_validated(config)
    }

    fn from_validated(config: DetectorConfig) -> QrsResult<Self> {
        let bank = FilterBank::pan_tompkins(&config)?;
        let detector = AdaptiveDetector::new(config.refractory_samples(), config.init_segment_samples());
        debug!(
            fs = config.sampling_rate_hz,
            window = config.integration_window(),
            refractory = config.refractory_samples(),
            "Created streaming pipeline"
        );

        Ok(Self {
            config,
            bank,
            detector,
            integrated: Vec::new(),
        })
    }

    /// Feed one raw sample; returns beats accepted by it
    pub fn push(&mut self, sample: T) -> Vec<usize> {
        let value = self.bank.step(sample);
        self.integrated.push(value);
        self.detector.push(value)
    }

    /// Feed a chunk of raw samples; returns beats accepted by the chunk
    pub fn extend(&mut self, samples: &[T]) -> Vec<usize> {
        samples.iter().flat_map(|&s| self.push(s)).collect()
    }

    /// Samples consumed so far
    pub fn samples_seen(&self) -> usize {
        self.integrated.len()
    }

    /// Beats accepted so far
    pub fn peaks(&self) -> &[usize] {
        self.detector.peaks()
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Close the stream and build the detection result
    pub fn finish(self) -> DetectionResult<T> {
        let fs = self.config.sampling_rate_hz;

        if !self.config.is_sufficient(self.integrated.len()) {
            warn!(
                samples = self.integrated.len(),
                required = self.config.min_samples(),
                "Recording too short for detection"
            );
            return DetectionResult::empty(fs);
        }

        let detection = self.detector.finish();
        let heart_rate_bpm = estimate_heart_rate(&detection.peaks, fs);

        DetectionResult {
            integrated: self.integrated,
            peaks: detection.peaks,
            threshold: detection.threshold,
            heart_rate_bpm,
            sampling_rate_hz: fs,
        }
    }
}

/// Batch Pan–Tompkins detector
#[derive(Debug, Clone)]
pub struct PanTompkins {
    config: DetectorConfig,
}

impl PanTompkins {
    /// Create a detector; the configuration is validated up front
    pub fn new(config: DetectorConfig) -> QrsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Detector with default parameters at `sampling_rate_hz`
    pub fn with_sampling_rate(sampling_rate_hz: f64) -> QrsResult<Self> {
        Self::new(DetectorConfig::new(sampling_rate_hz))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run the full pipeline over a complete recording
    pub fn detect<T: Sample>(&self, samples: &[T]) -> QrsResult<DetectionResult<T>> {
        let span = info_span!("pan_tompkins", samples = samples.len(), fs = self.config.sampling_rate_hz);
        let _enter = span.enter();

        if !self.config.is_sufficient(samples.len()) {
            warn!(
                samples = samples.len(),
                required = self.config.min_samples(),
                "Recording too short for detection"
            );
            return Ok(DetectionResult::empty(self.config.sampling_rate_hz));
        }

        let start = Instant::now();
        let mut pipeline = StreamingPipeline::from_validated(self.config.clone())?;
        for &sample in samples {
            pipeline.push(sample);
        }
        let result = pipeline.finish();

        debug!(
            beats = result.peaks.len(),
            heart_rate = result.heart_rate_bpm,
            threshold = result.threshold.as_f64(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Detection complete"
        );
        Ok(result)
    }

    /// Run the pipeline over a recording; its sampling rate overrides the
    /// configured one
    pub fn detect_signal(&self, signal: &EcgSignal) -> QrsResult<DetectionResult<f64>> {
        let span = info_span!("recording", id = %signal.id);
        let _enter = span.enter();

        if signal.sampling_rate() == self.config.sampling_rate_hz {
            self.detect(signal.samples())
        } else {
            let config = self.config.clone().with_sampling_rate(signal.sampling_rate());
            PanTompkins::new(config)?.detect(signal.samples())
        }
    }
}
