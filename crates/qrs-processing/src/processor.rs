//! Core signal processor trait

use crate::sample::Sample;
use serde::{Deserialize, Serialize};

/// Core trait for all per-sample pipeline stages
///
/// Stages are causal: `step` sees each sample exactly once, in index order,
/// and may only look back over its own fixed history.
pub trait SignalProcessor<T: Sample>: Send {
    /// Process one sample and return the stage output for it
    fn step(&mut self, input: T) -> T;

    /// Reset processor internal state
    fn reset(&mut self);

    /// Get processor name/identifier
    fn name(&self) -> &str;

    /// Get processor type for pipeline organization
    fn processor_type(&self) -> ProcessorType {
        ProcessorType::Filter
    }

    /// Number of leading samples whose output is warm-up rather than signal
    fn warmup_samples(&self) -> usize {
        0
    }

    /// Process a whole sequence, producing one output per input
    fn process(&mut self, input: &[T]) -> Vec<T> {
        input.iter().map(|&sample| self.step(sample)).collect()
    }
}

/// Types of signal processors for pipeline organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorType {
    /// Linear filtering (low-pass, high-pass, derivative)
    Filter,
    /// Pointwise nonlinear transform (squaring)
    Transform,
    /// Windowed integration
    Integrator,
}

impl<T: Sample, P: SignalProcessor<T> + ?Sized> SignalProcessor<T> for Box<P> {
    fn step(&mut self, input: T) -> T {
        (**self).step(input)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn processor_type(&self) -> ProcessorType {
        (**self).processor_type()
    }

    fn warmup_samples(&self) -> usize {
        (**self).warmup_samples()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl SignalProcessor<f64> for Doubler {
        fn step(&mut self, input: f64) -> f64 {
            input * 2.0
        }

        fn reset(&mut self) {}

        fn name(&self) -> &str {
            "Doubler"
        }
    }

    #[test]
    fn test_default_process_maps_every_sample() {
        let mut doubler = Doubler;
        assert_eq!(doubler.process(&[1.0, -2.0, 0.5]), vec![2.0, -4.0, 1.0]);
        assert_eq!(doubler.processor_type(), ProcessorType::Filter);
    }

    #[test]
    fn test_boxed_processor_delegates() {
        let mut boxed: Box<dyn SignalProcessor<f64>> = Box::new(Doubler);
        assert_eq!(boxed.step(3.0), 6.0);
        assert_eq!(boxed.name(), "Doubler");
    }
}
