//! QRS-Core: Foundation types for ECG beat detection
//!
//! Error taxonomy, the single-lead recording container and text ingestion.

pub mod error;
pub mod ingest;
pub mod signal;

pub use error::{QrsError, QrsResult};
pub use ingest::{extract_numeric_value, read_samples, IngestedRecords};
pub use signal::{EcgSignal, SignalStats};
