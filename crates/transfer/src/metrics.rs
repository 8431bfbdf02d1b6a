//! Byte-counter and rate helpers: human-readable units plus the
//! instantaneous-rate and smoothing primitives used by the reconciler.

use crate::types::ReconcilePolicy;

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;
const TB: f64 = GB * 1024.0;

/// Converts a byte count to a human-readable size string.
pub fn format_bytes(bytes: i64) -> String {
    let b = bytes.max(0) as f64;
    if b >= TB {
        format!("{:.2} TB", b / TB)
    } else if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{} B", bytes.max(0))
    }
}

/// Formats a rate in bytes/sec.
pub fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec <= 0.0 || !bytes_per_sec.is_finite() {
        return "0 B/s".into();
    }
    format!("{}/s", format_bytes(bytes_per_sec as i64))
}

/// Formats an ETA in seconds. 0 is the "unknown/none" sentinel and renders
/// as a dash.
pub fn format_eta(eta_seconds: i64) -> String {
    if eta_seconds <= 0 {
        return "—".into();
    }
    let secs = eta_seconds % 60;
    let mins = (eta_seconds / 60) % 60;
    let hours = eta_seconds / 3600;
    if hours > 0 {
        format!("{hours}h {mins:02}m")
    } else if mins > 0 {
        format!("{mins}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}

/// Instantaneous rate from two time-stamped samples, in bytes/sec.
///
/// Returns 0.0 unless both deltas are positive.
pub fn instant_rate(delta_bytes: i64, delta_ms: i64) -> f64 {
    if delta_bytes <= 0 || delta_ms <= 0 {
        return 0.0;
    }
    delta_bytes as f64 / (delta_ms as f64 / 1000.0)
}

/// Exponential blend of the previous smoothed speed with a new
/// instantaneous sample. The first sample passes through unsmoothed.
pub fn blend(prev_speed: f64, instant: f64, policy: &ReconcilePolicy) -> f64 {
    if prev_speed > 0.0 {
        prev_speed * policy.smoothing_prev + instant * policy.smoothing_instant
    } else {
        instant
    }
}
