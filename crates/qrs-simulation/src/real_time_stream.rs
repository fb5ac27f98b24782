//! Real-time ECG signal streaming

use crate::ecg_simulator::{EcgConfig, EcgSimulator};
use qrs_core::{EcgSignal, QrsError, QrsResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration, Instant};
use tracing::{debug, error, info, warn};

/// Configuration for real-time streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// ECG simulation configuration
    pub ecg_config: EcgConfig,
    /// Chunk duration in seconds (e.g., 0.1 for 100ms chunks)
    pub chunk_duration_s: f64,
    /// Broadcast buffer size (number of chunks a slow receiver may lag)
    pub buffer_size: usize,
    /// Update rate in Hz (how often to send new data)
    pub update_rate_hz: f64,
}

impl StreamConfig {
    pub fn validate(&self) -> QrsResult<()> {
        self.ecg_config.validate()?;

        if !self.chunk_duration_s.is_finite() || self.chunk_duration_s <= 0.0 {
            return Err(QrsError::InvalidWindow {
                name: "chunk duration",
                value: self.chunk_duration_s,
            });
        }
        if !self.update_rate_hz.is_finite() || self.update_rate_hz <= 0.0 {
            return Err(qrs_core::config_error!("Update rate must be positive, got {}", self.update_rate_hz));
        }
        if self.buffer_size == 0 {
            return Err(qrs_core::config_error!("Stream buffer size must be at least 1"));
        }
        Ok(())
    }

    fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.update_rate_hz)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ecg_config: EcgConfig::default(),
            chunk_duration_s: 0.1,
            buffer_size: 50,
            update_rate_hz: 10.0,
        }
    }
}

/// Commands for controlling the stream
#[derive(Debug, Clone)]
pub enum StreamCommand {
    Start,
    /// Halt and rewind the simulator to time zero
    Stop,
    Pause,
    Resume,
    SetHeartRate(f64),
    UpdateConfig(StreamConfig),
    /// End the stream task
    Shutdown,
}

/// Stream statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStats {
    pub is_running: bool,
    pub chunks_generated: u64,
    pub samples_generated: u64,
    pub total_duration_s: f64,
    pub last_chunk_time_s: f64,
}

/// Real-time ECG signal stream
pub struct RealTimeEcgStream {
    config: StreamConfig,
    simulator: EcgSimulator,
    data_sender: broadcast::Sender<EcgSignal>,
    control_receiver: mpsc::Receiver<StreamCommand>,
    control_sender: mpsc::Sender<StreamCommand>,
    stats: Arc<Mutex<StreamStats>>,
}

impl RealTimeEcgStream {
    /// Create new real-time ECG stream
    pub fn new(config: StreamConfig) -> QrsResult<Self> {
        config.validate()?;

        let simulator = EcgSimulator::new(config.ecg_config.clone())?;
        let (data_sender, _) = broadcast::channel(config.buffer_size);
        let (control_sender, control_receiver) = mpsc::channel(32);

        Ok(RealTimeEcgStream {
            config,
            simulator,
            data_sender,
            control_receiver,
            control_sender,
            stats: Arc::new(Mutex::new(StreamStats::default())),
        })
    }

    /// Get a receiver for data updates
    pub fn subscribe(&self) -> broadcast::Receiver<EcgSignal> {
        self.data_sender.subscribe()
    }

    /// Get control sender for sending commands
    pub fn control_handle(&self) -> mpsc::Sender<StreamCommand> {
        self.control_sender.clone()
    }

    /// Shared handle to the live statistics
    pub fn stats_handle(&self) -> Arc<Mutex<StreamStats>> {
        Arc::clone(&self.stats)
    }

    /// Drive the stream until shutdown
    pub async fn run(&mut self) -> QrsResult<()> {
        let mut interval_timer = interval(self.config.tick_period());
        let mut running = false;

        info!(
            update_rate_hz = self.config.update_rate_hz,
            chunk_ms = self.config.chunk_duration_s * 1000.0,
            "ECG stream ready"
        );

        loop {
            tokio::select! {
                _ = interval_timer.tick(), if running => {
                    self.emit_chunk().await?;
                }

                command = self.control_receiver.recv() => {
                    match command {
                        Some(StreamCommand::Start) | Some(StreamCommand::Resume) => {
                            running = true;
                            self.stats.lock().await.is_running = true;
                            info!("ECG stream running");
                        }
                        Some(StreamCommand::Pause) => {
                            running = false;
                            self.stats.lock().await.is_running = false;
                            info!("ECG stream paused");
                        }
                        Some(StreamCommand::Stop) => {
                            running = false;
                            self.simulator.reset_time();
                            *self.stats.lock().await = StreamStats::default();
                            info!("ECG stream stopped");
                        }
                        Some(StreamCommand::SetHeartRate(bpm)) => {
                            match self.simulator.set_heart_rate(bpm) {
                                Ok(()) => {
                                    self.config.ecg_config.heart_rate_bpm = bpm;
                                    info!(bpm, "ECG stream heart rate updated");
                                }
                                Err(e) => warn!(bpm, error = %e, "Heart rate rejected, keeping previous rate"),
                            }
                        }
                        Some(StreamCommand::UpdateConfig(new_config)) => {
                            if let Err(e) = self.apply_config(new_config) {
                                warn!(error = %e, "Stream configuration rejected, keeping previous one");
                            } else {
                                interval_timer = interval(self.config.tick_period());
                                info!("ECG stream configuration updated");
                            }
                        }
                        Some(StreamCommand::Shutdown) | None => {
                            info!("ECG stream shutting down");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    // Leaves the running configuration untouched on error
    fn apply_config(&mut self, new_config: StreamConfig) -> QrsResult<()> {
        new_config.validate()?;
        self.simulator.update_config(new_config.ecg_config.clone())?;
        self.config = new_config;
        Ok(())
    }

    async fn emit_chunk(&mut self) -> QrsResult<()> {
        let start_time = Instant::now();
        let chunk = self.simulator.generate(self.config.chunk_duration_s)?;
        let generation_time = start_time.elapsed();

        {
            let mut stats = self.stats.lock().await;
            stats.chunks_generated += 1;
            stats.samples_generated += chunk.len() as u64;
            stats.total_duration_s += chunk.duration();
            stats.last_chunk_time_s = generation_time.as_secs_f64();
        }

        if generation_time.as_secs_f64() > self.config.chunk_duration_s {
            warn!(
                elapsed_ms = generation_time.as_millis() as u64,
                chunk_ms = self.config.chunk_duration_s * 1000.0,
                "Chunk generation slower than real time"
            );
        }

        // No receivers is not an error
        if self.data_sender.send(chunk).is_err() {
            debug!("ECG chunk dropped, no subscribers");
        }
        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

/// Helper function to create and start a stream in the background
pub async fn start_ecg_stream(
    config: StreamConfig,
) -> QrsResult<(broadcast::Receiver<EcgSignal>, mpsc::Sender<StreamCommand>)> {
    let mut stream = RealTimeEcgStream::new(config)?;
    let data_receiver = stream.subscribe();
    let control_sender = stream.control_handle();

    tokio::spawn(async move {
        if let Err(e) = stream.run().await {
            error!(error = %e, "ECG stream failed");
        }
    });

    Ok((data_receiver, control_sender))
}
