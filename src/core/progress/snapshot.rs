//! Progress snapshots

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Significant digits kept when reporting a rate
pub const RATE_SIGNIFICANT_DIGITS: i32 = 5;

/// Immutable view of job progress at the moment the high-water mark advanced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Best cumulative result count observed
    pub results_so_far: u64,

    /// Total to report against; 0 when unknown
    pub total_results: u64,

    /// Seconds since the job started
    pub elapsed_seconds: f64,

    /// When the job started
    pub start_time: DateTime<Utc>,

    /// Batch whose event advanced the high-water mark
    pub job_batch_number: u64,
}

impl ProgressSnapshot {
    /// Whether the known total has been reached; always false when the total is unknown
    pub fn is_complete(&self) -> bool {
        self.total_results > 0 && self.results_so_far >= self.total_results
    }

    /// Records per second, rounded to five significant digits
    ///
    /// `None` until some time has elapsed.
    pub fn rate(&self) -> Option<f64> {
        if self.elapsed_seconds > 0.0 {
            Some(round_significant(
                self.results_so_far as f64 / self.elapsed_seconds,
                RATE_SIGNIFICANT_DIGITS,
            ))
        } else {
            None
        }
    }

    /// Human-readable progress line
    ///
    /// ```
    /// use chrono::Utc;
    /// use datamove::core::progress::ProgressSnapshot;
    ///
    /// let snapshot = ProgressSnapshot {
    ///     results_so_far: 50,
    ///     total_results: 100,
    ///     elapsed_seconds: 2.0,
    ///     start_time: Utc::now(),
    ///     job_batch_number: 5,
    /// };
    /// assert_eq!(snapshot.progress_text(), "Progress: 50 of 100; time 2.000000s; 25.0 records/s");
    /// ```
    pub fn progress_text(&self) -> String {
        if self.total_results == 0 {
            return format!(
                "Progress: {} results so far; time {:.6}s",
                self.results_so_far, self.elapsed_seconds
            );
        }

        let text = format!(
            "Progress: {} of {}; time {:.6}s",
            self.results_so_far, self.total_results, self.elapsed_seconds
        );
        match self.rate() {
            Some(rate) => format!("{text}; {rate:?} records/s"),
            None => text,
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.progress_text())
    }
}

/// Round to a number of significant decimal digits
pub fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = digits - 1 - magnitude;
    if scale >= 0 {
        let factor = 10f64.powi(scale);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-scale);
        (value / factor).round() * factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(results: u64, total: u64, elapsed: f64) -> ProgressSnapshot {
        ProgressSnapshot {
            results_so_far: results,
            total_results: total,
            elapsed_seconds: elapsed,
            start_time: Utc::now(),
            job_batch_number: 1,
        }
    }

    #[test]
    fn test_is_complete() {
        assert!(!snapshot(2, 4, 1.0).is_complete());
        assert!(snapshot(4, 4, 1.0).is_complete());
        assert!(snapshot(5, 4, 1.0).is_complete());
        assert!(!snapshot(1_000, 0, 1.0).is_complete());
    }

    #[test]
    fn test_progress_text_unknown_total() {
        assert_eq!(
            snapshot(30, 0, 1.5).progress_text(),
            "Progress: 30 results so far; time 1.500000s"
        );
    }

    #[test]
    fn test_progress_text_omits_rate_without_elapsed_time() {
        let s = snapshot(10, 40, 0.0);
        assert_eq!(s.rate(), None);
        assert_eq!(s.progress_text(), "Progress: 10 of 40; time 0.000000s");
    }

    #[test]
    fn test_rate_is_rounded() {
        let s = snapshot(100, 300, 3.0);
        assert_eq!(s.rate(), Some(33.333));
        assert_eq!(
            s.progress_text(),
            "Progress: 100 of 300; time 3.000000s; 33.333 records/s"
        );
    }

    #[test]
    fn test_round_significant() {
        assert_eq!(round_significant(123_456.0, 5), 123_460.0);
        assert_eq!(round_significant(0.000_123_456, 5), 0.000_123_46);
        assert_eq!(round_significant(2.5, 5), 2.5);
        assert_eq!(round_significant(0.0, 5), 0.0);
    }
}
