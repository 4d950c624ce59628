//! Throughput and time-remaining estimation shared by training and translation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Progress snapshot for a job that advances through `total` units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEstimate {
    /// Units completed overall, including units done before a resume.
    pub done: usize,
    pub total: usize,
    /// Percent complete (0-100).
    pub percent: f64,
    /// Units per second processed by this process.
    pub per_second: f64,
    /// Estimated seconds remaining at the current rate (0 while no rate is known).
    pub eta_secs: f64,
}

impl RateEstimate {
    /// Build an estimate.
    ///
    /// `processed` counts only the units handled since `elapsed` started, so a
    /// resumed job's rate is not inflated by work done in an earlier process.
    pub fn compute(done: usize, total: usize, processed: usize, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let per_second = if secs > 0.0 { processed as f64 / secs } else { 0.0 };
        let remaining = total.saturating_sub(done);
        let eta_secs = if per_second > 0.0 { remaining as f64 / per_second } else { 0.0 };
        let percent = if total > 0 { done as f64 / total as f64 * 100.0 } else { 100.0 };

        Self { done, total, percent, per_second, eta_secs }
    }

    pub fn eta(&self) -> Duration {
        Duration::from_secs_f64(self.eta_secs.max(0.0))
    }
}

/// Format a duration as `12.3s`, `4.5m` or `1.2h`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}
