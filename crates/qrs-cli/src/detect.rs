//! `qrs detect`: offline beat detection on a recording file

use anyhow::{Context, Result};
use clap::Args;
use qrs_core::ingest::split_record;
use qrs_core::{read_samples, EcgSignal};
use qrs_processing::{DetectorConfig, PanTompkins};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Preview cell separator
const PREVIEW_SEPARATOR: &str = " | ";

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Recording with one record per line; the first numeric cell is the sample
    pub file: PathBuf,

    /// Sampling rate in Hz (overrides the configuration file)
    #[arg(short = 's', long)]
    pub sampling_rate: Option<f64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the first N raw records before the result
    #[arg(long, default_value_t = 0)]
    pub preview: usize,

    /// Detector configuration (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Include the integrated signal in JSON output
    #[arg(long)]
    pub include_integrated: bool,
}

/// Detection outcome for one file
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub file: String,
    pub records_read: usize,
    pub samples: usize,
    pub skipped: usize,
    pub sampling_rate_hz: f64,
    pub duration_s: f64,
    pub beats: usize,
    pub heart_rate_bpm: u32,
    pub threshold: f64,
    /// Beat positions in the sample sequence
    pub peaks: Vec<usize>,
    /// Beat positions as source record numbers (zero-based)
    pub peak_records: Vec<usize>,
    pub peak_times_s: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrated: Option<Vec<f64>>,
}

/// Detector configuration from an optional file plus a rate override
pub fn load_config(path: Option<&Path>, sampling_rate: Option<f64>) -> Result<DetectorConfig> {
    let config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read configuration {}", path.display()))?;
            DetectorConfig::from_json(&json)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        }
        None => DetectorConfig::default(),
    };

    Ok(match sampling_rate {
        Some(rate) => config.with_sampling_rate(rate),
        None => config,
    })
}

/// Read a recording, decoding bytes that are not UTF-8 lossily
pub fn read_recording(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Cannot open {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// First `limit` records with their cells joined for display
pub fn preview_lines(content: &str, limit: usize) -> Vec<String> {
    content
        .lines()
        .take(limit)
        .map(|line| split_record(line).join(PREVIEW_SEPARATOR))
        .collect()
}

/// Run detection over file content; `None` when it holds no numeric samples
pub fn analyze(
    label: &str,
    content: &str,
    config: DetectorConfig,
    include_integrated: bool,
) -> Result<Option<DetectionReport>> {
    let ingested = read_samples(content.as_bytes()).context("Failed to read records")?;
    info!(
        records = ingested.records_read,
        samples = ingested.samples.len(),
        skipped = ingested.skipped,
        "Ingested recording"
    );

    if !ingested.has_samples() {
        return Ok(None);
    }

    let detector = PanTompkins::new(config)?;
    let signal = EcgSignal::new(ingested.samples, detector.config().sampling_rate_hz)?;
    let stats = signal.stats();
    debug!(
        id = %signal.id,
        min = stats.min,
        max = stats.max,
        rms = stats.rms,
        "Recording amplitude"
    );
    let result = detector.detect_signal(&signal)?;

    let peak_records = result
        .peaks
        .iter()
        .filter_map(|&idx| ingested.line_numbers.get(idx).copied())
        .collect();

    Ok(Some(DetectionReport {
        file: label.to_string(),
        records_read: ingested.records_read,
        samples: signal.len(),
        skipped: ingested.skipped,
        sampling_rate_hz: result.sampling_rate_hz,
        duration_s: signal.duration(),
        beats: result.beat_count(),
        heart_rate_bpm: result.heart_rate_bpm,
        threshold: result.threshold,
        peak_times_s: result.peak_times(),
        peak_records,
        integrated: include_integrated.then(|| result.integrated.clone()),
        peaks: result.peaks,
    }))
}

fn print_report(report: &DetectionReport) {
    println!("File:       {}", report.file);
    println!(
        "Records:    {} ({} numeric, {} skipped)",
        report.records_read, report.samples, report.skipped
    );
    println!(
        "Duration:   {:.2} s at {} Hz",
        report.duration_s, report.sampling_rate_hz
    );
    println!("Beats:      {}", report.beats);
    if report.heart_rate_bpm > 0 {
        println!("Heart rate: {} bpm", report.heart_rate_bpm);
    } else {
        println!("Heart rate: unavailable");
    }
}

pub fn execute(args: DetectArgs) -> Result<()> {
    let content = read_recording(&args.file)?;
    let config = load_config(args.config.as_deref(), args.sampling_rate)?;

    if args.preview > 0 {
        for line in preview_lines(&content, args.preview) {
            println!("{}", line);
        }
        println!();
    }

    let label = args.file.display().to_string();
    match analyze(&label, &content, config, args.include_integrated)? {
        Some(report) if args.json => println!("{}", serde_json::to_string_pretty(&report)?),
        Some(report) => print_report(&report),
        None => println!("No numeric samples found in {}", label),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording() -> String {
        let mut lines = vec!["time,voltage".to_string()];
        for i in 0..1000 {
            let value = if [100, 350, 600, 850].contains(&i) { 100.0 } else { 0.0 };
            lines.push(format!("{},{}", value, i));
        }
        lines.join("\n")
    }

    #[test]
    fn test_preview_joins_cells() {
        let preview = preview_lines("a,b,c\n1,2\n3\n4", 3);
        assert_eq!(preview, vec!["a | b | c", "1 | 2", "3"]);
    }

    #[test]
    fn test_analyze_recording() {
        let config = DetectorConfig::new(500.0);
        let report = analyze("ecg.csv", &recording(), config, false).unwrap().unwrap();

        assert_eq!(report.records_read, 1001);
        assert_eq!(report.samples, 1000);
        assert_eq!(report.skipped, 1);
        assert!((118..=122).contains(&report.heart_rate_bpm));
        // header record shifts source positions by one
        let shifted: Vec<usize> = report.peaks.iter().map(|p| p + 1).collect();
        assert_eq!(report.peak_records, shifted);
        assert!(report.integrated.is_none());
    }

    #[test]
    fn test_analyze_without_numbers() {
        let report = analyze("text.csv", "a,b\nc,d\n", DetectorConfig::default(), false).unwrap();
        assert!(report.is_none());
    }

    #[test]
    fn test_short_recording_reports_no_beats() {
        let report = analyze("short.csv", "1\n2\n3\n", DetectorConfig::new(250.0), true)
            .unwrap()
            .unwrap();
        assert_eq!(report.beats, 0);
        assert_eq!(report.heart_rate_bpm, 0);
        assert_eq!(report.integrated, Some(Vec::new()));
    }

    #[test]
    fn test_invalid_rate_is_error() {
        assert!(analyze("ecg.csv", &recording(), DetectorConfig::new(-1.0), false).is_err());
    }

    #[test]
    fn test_json_report_shape() {
        let report = analyze("ecg.csv", &recording(), DetectorConfig::new(500.0), false)
            .unwrap()
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("heart_rate_bpm").is_some());
        assert!(json.get("integrated").is_none());
    }

    #[test]
    fn test_recording_with_latin1_header() {
        let path = std::env::temp_dir().join(format!("qrs-detect-{}.csv", std::process::id()));
        let mut bytes = b"time,\xB5V\n".to_vec();
        bytes.extend_from_slice(recording().split_once('\n').unwrap().1.as_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let content = read_recording(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let report = analyze("ecg.csv", &content, DetectorConfig::new(500.0), false)
            .unwrap()
            .unwrap();
        assert_eq!(report.samples, 1000);
        assert_eq!(report.skipped, 1);
        assert!(read_recording(Path::new("/nonexistent/ecg.csv")).is_err());
    }

    #[test]
    fn test_load_config_override() {
        let config = load_config(None, Some(360.0)).unwrap();
        assert_eq!(config.sampling_rate_hz, 360.0);
        assert_eq!(config.low_pass_cutoff_hz, 15.0);
        assert!(load_config(Some(Path::new("/nonexistent/qrs.json")), None).is_err());
    }
}
