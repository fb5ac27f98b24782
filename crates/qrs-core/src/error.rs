//! Error handling for the QRS detection framework
//!
//! Every configuration or ingestion failure is reported through [`QrsError`].
//! Insufficient data is *not* an error: the pipeline answers it with an empty
//! detection result instead.

use core::fmt;

/// Result type alias for QRS framework operations
pub type QrsResult<T> = Result<T, QrsError>;

/// Error type for all QRS framework operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum QrsError {
    /// Sampling rate is zero, negative or not finite
    InvalidSamplingRate {
        /// Provided sampling rate
        rate: f64,
    },

    /// Filter cutoff is zero, negative or not finite
    InvalidCutoff {
        /// Filter stage the cutoff belongs to
        stage: &'static str,
        /// Provided cutoff frequency in Hz
        cutoff: f64,
    },

    /// Window or duration parameter that cannot produce a usable sample count
    InvalidWindow {
        /// Parameter name
        name: &'static str,
        /// Provided value
        value: f64,
    },

    /// Any other rejected configuration value
    InvalidConfig {
        /// Description of the configuration error
        reason: String,
    },

    /// Signal data does not match its declared shape
    InvalidSignalData {
        /// Description of the data issue
        reason: String,
    },

    /// Synthetic signal generation failed
    SimulationError {
        /// Description of the simulation failure
        message: String,
    },

    /// Reading input records failed
    Io {
        /// Underlying I/O error description
        reason: String,
    },

    /// Serialization/deserialization error
    Serialization {
        /// Serialization error description
        reason: String,
    },
}

impl fmt::Display for QrsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QrsError::InvalidSamplingRate { rate } => {
                write!(f, "Invalid sampling rate: {}Hz, must be positive and finite", rate)
            }
            QrsError::InvalidCutoff { stage, cutoff } => {
                write!(f, "Invalid {} cutoff: {}Hz, must be positive and finite", stage, cutoff)
            }
            QrsError::InvalidWindow { name, value } => {
                write!(f, "Invalid {}: {}", name, value)
            }
            QrsError::InvalidConfig { reason } => {
                write!(f, "Invalid configuration: {}", reason)
            }
            QrsError::InvalidSignalData { reason } => {
                write!(f, "Invalid signal data: {}", reason)
            }
            QrsError::SimulationError { message } => {
                write!(f, "Simulation error: {}", message)
            }
            QrsError::Io { reason } => {
                write!(f, "I/O error: {}", reason)
            }
            QrsError::Serialization { reason } => {
                write!(f, "Serialization error: {}", reason)
            }
        }
    }
}

impl std::error::Error for QrsError {}

impl From<std::io::Error> for QrsError {
    fn from(err: std::io::Error) -> Self {
        QrsError::Io {
            reason: err.to_string(),
        }
    }
}

/// Validate a sampling rate, returning it unchanged when usable
pub fn check_sampling_rate(rate: f64) -> QrsResult<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(QrsError::InvalidSamplingRate { rate })
    }
}

/// Validate a filter cutoff frequency
pub fn check_cutoff(stage: &'static str, cutoff: f64) -> QrsResult<f64> {
    if cutoff.is_finite() && cutoff > 0.0 {
        Ok(cutoff)
    } else {
        Err(QrsError::InvalidCutoff { stage, cutoff })
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)+) => {
        $crate::error::QrsError::InvalidConfig {
            reason: format!($($arg)+),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = QrsError::InvalidCutoff {
            stage: "low-pass",
            cutoff: -15.0,
        };
        let display = format!("{}", error);
        assert!(display.contains("low-pass"));
        assert!(display.contains("-15"));
    }

    #[test]
    fn test_error_equality() {
        let error1 = QrsError::InvalidSamplingRate { rate: 0.0 };
        let error2 = QrsError::InvalidSamplingRate { rate: 0.0 };
        assert_eq!(error1, error2);
    }

    #[test]
    fn test_rate_and_cutoff_checks() {
        assert_eq!(check_sampling_rate(250.0), Ok(250.0));
        assert!(check_sampling_rate(0.0).is_err());
        assert!(check_sampling_rate(-1.0).is_err());
        assert!(check_sampling_rate(f64::NAN).is_err());
        assert!(check_cutoff("high-pass", 5.0).is_ok());
        assert!(check_cutoff("high-pass", f64::INFINITY).is_err());
    }

    #[test]
    fn test_config_error_macro() {
        let err = config_error!("window {} too small", 0);
        assert_eq!(
            err,
            QrsError::InvalidConfig {
                reason: "window 0 too small".to_string()
            }
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.csv");
        let err: QrsError = io.into();
        assert!(matches!(err, QrsError::Io { .. }));
        assert!(err.to_string().contains("missing.csv"));
    }
}
