//! Heart rate estimation from accepted peaks

/// Sample distances between consecutive peaks
pub fn rr_intervals(peaks: &[usize]) -> Vec<usize> {
    peaks.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Mean RR interval in samples, if at least two peaks exist
pub fn mean_rr_interval(peaks: &[usize]) -> Option<f64> {
    let intervals = rr_intervals(peaks);
    if intervals.is_empty() {
        return None;
    }

    let total: usize = intervals.iter().sum();
    Some(total as f64 / intervals.len() as f64)
}

/// Average heart rate in beats per minute
///
/// Returns 0 when fewer than two peaks are available.
pub fn estimate_heart_rate(peaks: &[usize], sampling_rate_hz: f64) -> u32 {
    match mean_rr_interval(peaks) {
        Some(mean) if mean > 0.0 => (60.0 * sampling_rate_hz / mean).round() as u32,
        _ => 0,
    }
}

/// Beat-to-beat heart rate for every RR interval
pub fn instantaneous_heart_rates(peaks: &[usize], sampling_rate_hz: f64) -> Vec<f64> {
    rr_intervals(peaks)
        .into_iter()
        .filter(|&rr| rr > 0)
        .map(|rr| 60.0 * sampling_rate_hz / rr as f64)
        .collect()
}
