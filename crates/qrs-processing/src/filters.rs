//! Digital filters for QRS enhancement
//!
//! Every stage is a small owned state machine implementing
//! [`SignalProcessor`]; the free functions at the bottom run a fresh stage
//! over a whole sequence and are what batch callers use.

use crate::processor::{ProcessorType, SignalProcessor};
use crate::sample::Sample;
use qrs_core::error::{check_cutoff, check_sampling_rate};
use qrs_core::{QrsError, QrsResult};
use std::collections::VecDeque;
use tracing::debug;

/// Number of leading derivative outputs forced to zero
pub const DERIVATIVE_WARMUP: usize = 4;

/// RC time constant for a cutoff frequency
fn rc_constant(cutoff_hz: f64) -> f64 {
    1.0 / (2.0 * std::f64::consts::PI * cutoff_hz)
}

/// Single-pole recursive low-pass filter
///
/// `y[0] = x[0]`, then `y[n] = y[n-1] + α·(x[n] − y[n-1])` with
/// `α = dt / (rc + dt)`.
#[derive(Debug, Clone)]
pub struct LowPassFilter<T: Sample> {
    alpha: T,
    prev_y: T,
    initialized: bool,
}

impl<T: Sample> LowPassFilter<T> {
    pub fn new(cutoff_hz: f64, sampling_rate_hz: f64) -> QrsResult<Self> {
        let fs = check_sampling_rate(sampling_rate_hz)?;
        let fc = check_cutoff("low-pass", cutoff_hz)?;

        let dt = 1.0 / fs;
        let rc = rc_constant(fc);
        let alpha = dt / (rc + dt);
        debug!(fs, fc, alpha, "Created low-pass filter");

        Ok(Self {
            alpha: T::cast(alpha),
            prev_y: T::zero(),
            initialized: false,
        })
    }
}

impl<T: Sample> SignalProcessor<T> for LowPassFilter<T> {
    fn step(&mut self, x: T) -> T {
        if !self.initialized {
            self.initialized = true;
            self.prev_y = x;
            return x;
        }

        let y = self.prev_y + self.alpha * (x - self.prev_y);
        self.prev_y = y;
        y
    }

    fn reset(&mut self) {
        self.prev_y = T::zero();
        self.initialized = false;
    }

    fn name(&self) -> &str {
        "Low-pass Filter"
    }
}

/// Single-pole recursive high-pass filter
///
/// `y[0] = x[0]`, then `y[n] = α·(y[n-1] + x[n] − x[n-1])` with
/// `α = rc / (rc + dt)`.
#[derive(Debug, Clone)]
pub struct HighPassFilter<T: Sample> {
    alpha: T,
    prev_x: T,
    prev_y: T,
    initialized: bool,
}

impl<T: Sample> HighPassFilter<T> {
    pub fn new(cutoff_hz: f64, sampling_rate_hz: f64) -> QrsResult<Self> {
        let fs = check_sampling_rate(sampling_rate_hz)?;
        let fc = check_cutoff("high-pass", cutoff_hz)?;

        let dt = 1.0 / fs;
        let rc = rc_constant(fc);
        let alpha = rc / (rc + dt);
        debug!(fs, fc, alpha, "Created high-pass filter");

        Ok(Self {
            alpha: T::cast(alpha),
            prev_x: T::zero(),
            prev_y: T::zero(),
            initialized: false,
        })
    }
}

impl<T: Sample> SignalProcessor<T> for HighPassFilter<T> {
    fn step(&mut self, x: T) -> T {
        if !self.initialized {
            self.initialized = true;
            self.prev_x = x;
            self.prev_y = x;
            return x;
        }

        let y = self.alpha * (self.prev_y + x - self.prev_x);
        self.prev_x = x;
        self.prev_y = y;
        y
    }

    fn reset(&mut self) {
        self.prev_x = T::zero();
        self.prev_y = T::zero();
        self.initialized = false;
    }

    fn name(&self) -> &str {
        "High-pass Filter"
    }
}

/// Band-pass built from a low-pass stage feeding a high-pass stage
///
/// The order is fixed: the high-pass difference term consumes the smoothed
/// low-pass output.
#[derive(Debug, Clone)]
pub struct BandPassFilter<T: Sample> {
    low: LowPassFilter<T>,
    high: HighPassFilter<T>,
}

impl<T: Sample> BandPassFilter<T> {
    pub fn new(low_cutoff_hz: f64, high_cutoff_hz: f64, sampling_rate_hz: f64) -> QrsResult<Self> {
        Ok(Self {
            low: LowPassFilter::new(low_cutoff_hz, sampling_rate_hz)?,
            high: HighPassFilter::new(high_cutoff_hz, sampling_rate_hz)?,
        })
    }
}

impl<T: Sample> SignalProcessor<T> for BandPassFilter<T> {
    fn step(&mut self, x: T) -> T {
        let smoothed = self.low.step(x);
        self.high.step(smoothed)
    }

    fn reset(&mut self) {
        self.low.reset();
        self.high.reset();
    }

    fn name(&self) -> &str {
        "Band-pass Filter"
    }
}

/// Five-tap causal derivative
///
/// `y[n] = (2·x[n] + x[n-1] − x[n-3] − 2·x[n-4]) / (8·t)` with `t = 1/fs`.
/// The first [`DERIVATIVE_WARMUP`] outputs are zero.
#[derive(Debug, Clone)]
pub struct DerivativeFilter<T: Sample> {
    denominator: T,
    // history[0] = x[n-1] .. history[3] = x[n-4]
    history: [T; DERIVATIVE_WARMUP],
    seen: usize,
}

impl<T: Sample> DerivativeFilter<T> {
    pub fn new(sampling_rate_hz: f64) -> QrsResult<Self> {
        let fs = check_sampling_rate(sampling_rate_hz)?;
        let t = T::cast(1.0 / fs);
        debug!(fs, "Created derivative filter");

        Ok(Self {
            denominator: T::cast(8.0) * t,
            history: [T::zero(); DERIVATIVE_WARMUP],
            seen: 0,
        })
    }
}

impl<T: Sample> SignalProcessor<T> for DerivativeFilter<T> {
    fn step(&mut self, x: T) -> T {
        let two = T::cast(2.0);
        let output = if self.seen < DERIVATIVE_WARMUP {
            T::zero()
        } else {
            let [x1, _x2, x3, x4] = self.history;
            (two * x + x1 - x3 - two * x4) / self.denominator
        };

        self.history.rotate_right(1);
        self.history[0] = x;
        self.seen = self.seen.saturating_add(1);
        output
    }

    fn reset(&mut self) {
        self.history = [T::zero(); DERIVATIVE_WARMUP];
        self.seen = 0;
    }

    fn name(&self) -> &str {
        "Derivative Filter"
    }

    fn warmup_samples(&self) -> usize {
        DERIVATIVE_WARMUP
    }
}

/// Pointwise square
#[derive(Debug, Clone, Copy, Default)]
pub struct Squarer;

impl<T: Sample> SignalProcessor<T> for Squarer {
    fn step(&mut self, x: T) -> T {
        x * x
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "Squaring"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Transform
    }
}

/// Causal moving-window integrator
///
/// The divisor grows from 1 to `window_size` while the window fills, so the
/// leading outputs are averages of what has been seen rather than
/// zero-padded.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter<T: Sample> {
    window_size: usize,
    buffer: VecDeque<T>,
    sum: T,
}

impl<T: Sample> MovingAverageFilter<T> {
    pub fn new(window_size: usize) -> QrsResult<Self> {
        if window_size == 0 {
            return Err(QrsError::InvalidWindow {
                name: "moving average window",
                value: 0.0,
            });
        }
        debug!(window_size, "Created moving average filter");

        Ok(Self {
            window_size,
            buffer: VecDeque::new(),
            sum: T::zero(),
        })
    }
}

impl<T: Sample> SignalProcessor<T> for MovingAverageFilter<T> {
    fn step(&mut self, x: T) -> T {
        self.buffer.push_back(x);
        self.sum = self.sum + x;

        if self.buffer.len() > self.window_size {
            if let Some(oldest) = self.buffer.pop_front() {
                self.sum = self.sum - oldest;
            }
        }

        self.sum / T::cast(self.buffer.len() as f64)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.sum = T::zero();
    }

    fn name(&self) -> &str {
        "Moving Window Integrator"
    }

    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Integrator
    }
}

/// Low-pass filter a whole sequence
pub fn low_pass<T: Sample>(signal: &[T], cutoff_hz: f64, sampling_rate_hz: f64) -> QrsResult<Vec<T>> {
    Ok(LowPassFilter::new(cutoff_hz, sampling_rate_hz)?.process(signal))
}

/// High-pass filter a whole sequence
pub fn high_pass<T: Sample>(signal: &[T], cutoff_hz: f64, sampling_rate_hz: f64) -> QrsResult<Vec<T>> {
    Ok(HighPassFilter::new(cutoff_hz, sampling_rate_hz)?.process(signal))
}

/// Low-pass at `low_cutoff_hz`, then high-pass at `high_cutoff_hz`
pub fn band_pass<T: Sample>(
    signal: &[T],
    low_cutoff_hz: f64,
    high_cutoff_hz: f64,
    sampling_rate_hz: f64,
) -> QrsResult<Vec<T>> {
    let smoothed = low_pass(signal, low_cutoff_hz, sampling_rate_hz)?;
    high_pass(&smoothed, high_cutoff_hz, sampling_rate_hz)
}

/// Five-tap derivative of a whole sequence
pub fn derivative<T: Sample>(signal: &[T], sampling_rate_hz: f64) -> QrsResult<Vec<T>> {
    Ok(DerivativeFilter::new(sampling_rate_hz)?.process(signal))
}

/// Square every sample
pub fn square<T: Sample>(signal: &[T]) -> Vec<T> {
    signal.iter().map(|&x| x * x).collect()
}

/// Moving-window integration with a growing divisor
pub fn moving_average<T: Sample>(signal: &[T], window_size: usize) -> QrsResult<Vec<T>> {
    Ok(MovingAverageFilter::new(window_size)?.process(signal))
}
