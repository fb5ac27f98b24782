//! QRS-Simulation: synthetic ECG generation
//!
//! Regular-rhythm ECG with configurable beat shape and noise, plus a tokio
//! driven real-time stream of signal chunks.

pub mod ecg_simulator;
pub mod real_time_stream;

pub use ecg_simulator::*;
pub use real_time_stream::*;
