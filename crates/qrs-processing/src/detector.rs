//! Adaptive SPKI/NPKI peak detector
//!
//! Two leaky integrators track the running signal-peak (SPKI) and
//! noise-peak (NPKI) levels; the decision threshold sits a quarter of the
//! way from NPKI to SPKI. Local maxima of the integrated signal are accepted
//! as beats when they clear the threshold outside the refractory window and
//! fold into NPKI otherwise.

use crate::sample::Sample;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Weight of a new peak in the SPKI/NPKI averages
pub const PEAK_WEIGHT: f64 = 0.125;
/// Retained weight of the previous level
pub const LEVEL_DECAY: f64 = 0.875;
/// Threshold position between NPKI and SPKI
pub const THRESHOLD_RATIO: f64 = 0.25;
/// Initial SPKI as a fraction of the seed segment maximum
pub const INITIAL_SIGNAL_FRACTION: f64 = 0.25;
/// Initial NPKI as a fraction of the seed segment mean
pub const INITIAL_NOISE_FRACTION: f64 = 0.5;

/// Running signal/noise levels and the derived threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdState<T> {
    /// Signal-peak estimate
    pub spki: T,
    /// Noise-peak estimate
    pub npki: T,
    /// Current decision threshold
    pub threshold: T,
}

impl<T: Sample> ThresholdState<T> {
    /// Seed the levels from the leading segment of the integrated signal
    pub fn seed(segment: &[T]) -> Self {
        if segment.is_empty() {
            return Self::from_levels(T::zero(), T::zero());
        }

        let max = segment.iter().fold(segment[0], |acc, &v| acc.max(v));
        let sum = segment.iter().fold(T::zero(), |acc, &v| acc + v);
        let mean = sum / T::cast(segment.len() as f64);

        Self::from_levels(
            T::cast(INITIAL_SIGNAL_FRACTION) * max,
            T::cast(INITIAL_NOISE_FRACTION) * mean,
        )
    }

    fn from_levels(spki: T, npki: T) -> Self {
        Self {
            spki,
            npki,
            threshold: derive_threshold(spki, npki),
        }
    }

    /// Fold an accepted peak into SPKI
    pub fn record_signal_peak(&mut self, value: T) {
        self.spki = T::cast(PEAK_WEIGHT) * value + T::cast(LEVEL_DECAY) * self.spki;
        self.threshold = derive_threshold(self.spki, self.npki);
    }

    /// Fold a rejected peak into NPKI
    pub fn record_noise_peak(&mut self, value: T) {
        self.npki = T::cast(PEAK_WEIGHT) * value + T::cast(LEVEL_DECAY) * self.npki;
        self.threshold = derive_threshold(self.spki, self.npki);
    }
}

fn derive_threshold<T: Sample>(spki: T, npki: T) -> T {
    npki + T::cast(THRESHOLD_RATIO) * (spki - npki)
}

/// Outcome of a finished detection run
#[derive(Debug, Clone, PartialEq)]
pub struct PeakDetection<T> {
    /// Accepted peak indices, strictly increasing
    pub peaks: Vec<usize>,
    /// Threshold after the last candidate
    pub threshold: T,
}

/// Streaming adaptive peak detector
///
/// Samples arrive one at a time. A candidate at index `i` is recognised when
/// sample `i + 1` arrives. Until `seed_len` samples have been seen the
/// threshold levels do not exist yet, so candidates are queued and replayed
/// in order once the levels are seeded; decisions are therefore identical to
/// a batch pass over the full sequence.
#[derive(Debug, Clone)]
pub struct AdaptiveDetector<T: Sample> {
    refractory: usize,
    seed_len: usize,
    seed_buffer: Vec<T>,
    pending: Vec<(usize, T)>,
    state: Option<ThresholdState<T>>,
    last_accepted: Option<usize>,
    peaks: Vec<usize>,
    // last two samples: (x[n-2], x[n-1])
    prev2: Option<T>,
    prev: Option<T>,
    index: usize,
}

impl<T: Sample> AdaptiveDetector<T> {
    /// `seed_len` samples initialise the levels; accepted peaks are at least
    /// `refractory` samples apart
    pub fn new(refractory: usize, seed_len: usize) -> Self {
        let seed_len = seed_len.max(1);
        debug!(refractory, seed_len, "Created adaptive detector");

        Self {
            refractory,
            seed_len,
            seed_buffer: Vec::new(),
            pending: Vec::new(),
            state: None,
            last_accepted: None,
            peaks: Vec::new(),
            prev2: None,
            prev: None,
            index: 0,
        }
    }

    /// Feed the next integrated sample; returns peaks accepted by it
    pub fn push(&mut self, value: T) -> Vec<usize> {
        let mut accepted = Vec::new();

        if let (Some(left), Some(center)) = (self.prev2, self.prev) {
            if left < center && center >= value {
                let candidate = (self.index - 1, center);
                if self.state.is_some() {
                    accepted.extend(self.decide(candidate));
                } else {
                    self.pending.push(candidate);
                }
            }
        }

        if self.state.is_none() {
            self.seed_buffer.push(value);
            if self.seed_buffer.len() >= self.seed_len {
                accepted.extend(self.seed_and_replay());
            }
        }

        self.prev2 = self.prev;
        self.prev = Some(value);
        self.index += 1;
        accepted
    }

    /// Finish the run, seeding from a short buffer if the stream ended early
    pub fn finish(mut self) -> PeakDetection<T> {
        if self.state.is_none() {
            self.seed_and_replay();
        }

        PeakDetection {
            threshold: self.state.map(|s| s.threshold).unwrap_or_else(T::zero),
            peaks: self.peaks,
        }
    }

    /// Current levels, once seeded
    pub fn state(&self) -> Option<&ThresholdState<T>> {
        self.state.as_ref()
    }

    /// Peaks accepted so far
    pub fn peaks(&self) -> &[usize] {
        &self.peaks
    }

    /// Number of samples consumed
    pub fn samples_seen(&self) -> usize {
        self.index
    }

    fn seed_and_replay(&mut self) -> Vec<usize> {
        let state = ThresholdState::seed(&self.seed_buffer);
        debug!(
            spki = state.spki.as_f64(),
            npki = state.npki.as_f64(),
            threshold = state.threshold.as_f64(),
            segment = self.seed_buffer.len(),
            "Seeded detection thresholds"
        );
        self.state = Some(state);
        self.seed_buffer = Vec::new();

        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .filter_map(|candidate| self.decide(candidate))
            .collect()
    }

    fn decide(&mut self, (idx, value): (usize, T)) -> Option<usize> {
        let state = self.state.as_mut()?;

        let outside_refractory = self
            .last_accepted
            .map_or(true, |last| idx - last >= self.refractory);

        if value >= state.threshold && outside_refractory {
            state.record_signal_peak(value);
            self.last_accepted = Some(idx);
            self.peaks.push(idx);
            trace!(idx, value = value.as_f64(), threshold = state.threshold.as_f64(), "Accepted peak");
            Some(idx)
        } else {
            state.record_noise_peak(value);
            trace!(idx, value = value.as_f64(), threshold = state.threshold.as_f64(), "Rejected peak");
            None
        }
    }
}

/// Run the adaptive detector over a complete integrated signal
pub fn detect_peaks<T: Sample>(integrated: &[T], refractory: usize, seed_len: usize) -> PeakDetection<T> {
    let mut detector = AdaptiveDetector::new(refractory, seed_len);
    for &value in integrated {
        detector.push(value);
    }
    detector.finish()
}
