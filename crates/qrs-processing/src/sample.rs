//! Floating-point sample abstraction
//!
//! The pipeline is written once over [`Sample`] and instantiated for `f32`
//! and `f64`. `f64` is the canonical width: recordings, ingestion and the
//! command line all carry `f64`, and the exponential threshold recursion
//! drifts measurably in `f32` over long recordings.

use num_traits::Float;
use std::fmt::Debug;

/// Canonical sample width
pub type DefaultSample = f64;

/// Floating-point type the pipeline can run on
pub trait Sample: Float + Debug + Default + Send + Sync + 'static {
    /// Convert a constant or coefficient into this width
    fn cast(value: f64) -> Self;

    /// Widen to `f64` for reporting
    fn as_f64(self) -> f64;
}

impl Sample for f32 {
    #[inline]
    fn cast(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f64 {
    #[inline]
    fn cast(value: f64) -> Self {
        value
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}
