//! Job completion report
//!
//! This module defines the summary returned when a job finishes, stops or
//! fails during teardown.

use super::failure::BatchFailure;
use std::time::Duration;

/// Summary of a finished job
#[derive(Debug, Clone)]
pub struct JobReport {
    /// Job identifier
    pub job_id: String,

    /// Optional job name
    pub job_name: Option<String>,

    /// Number of records in the selection
    pub total_results: u64,

    /// Number of records handed to listeners
    pub results_dispatched: u64,

    /// Number of batches handed to listeners
    pub batches_total: u64,

    /// Number of batches without a reported failure
    pub batches_succeeded: u64,

    /// Number of distinct batches with at least one reported failure
    pub batches_failed: u64,

    /// Whether the job was stopped before every batch was scheduled
    pub stopped: bool,

    /// Duration of the job
    pub duration: Duration,

    /// Failures reported on the job's failure channel
    pub failures: Vec<BatchFailure>,

    /// Errors raised while closing listeners
    pub finish_errors: Vec<String>,
}

impl JobReport {
    /// Create an empty report for a job
    pub fn new(job_id: impl Into<String>, job_name: Option<String>) -> Self {
        Self {
            job_id: job_id.into(),
            job_name,
            total_results: 0,
            results_dispatched: 0,
            batches_total: 0,
            batches_succeeded: 0,
            batches_failed: 0,
            stopped: false,
            duration: Duration::from_secs(0),
            failures: Vec::new(),
            finish_errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Whether every dispatched batch succeeded and every listener closed cleanly
    pub fn is_successful(&self) -> bool {
        self.batches_failed == 0 && self.finish_errors.is_empty()
    }

    /// Share of dispatched batches that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.batches_total == 0 {
            return 100.0;
        }
        (self.batches_succeeded as f64 / self.batches_total as f64) * 100.0
    }

    /// Log the report
    pub fn log_summary(&self) {
        tracing::info!(
            job_id = %self.job_id,
            total_results = self.total_results,
            results_dispatched = self.results_dispatched,
            batches_total = self.batches_total,
            batches_succeeded = self.batches_succeeded,
            batches_failed = self.batches_failed,
            stopped = self.stopped,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Job finished"
        );

        if !self.failures.is_empty() {
            tracing::warn!(
                failure_count = self.failures.len(),
                "Job finished with failed batches"
            );
            for failure in &self.failures {
                tracing::warn!(
                    batch_number = failure.batch_number,
                    message = %failure.message,
                    "Batch failure"
                );
            }
        }

        for error in &self.finish_errors {
            tracing::error!(error = %error, "Listener failed to close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_creation() {
        let report = JobReport::new("job-1", None);
        assert_eq!(report.job_id, "job-1");
        assert_eq!(report.batches_total, 0);
        assert!(!report.stopped);
        assert!(report.is_successful());
        assert_eq!(report.success_rate(), 100.0);
    }

    #[test]
    fn test_report_with_failures() {
        let mut report = JobReport::new("job-1", Some("nightly".to_string()))
            .with_duration(Duration::from_secs(3));
        report.batches_total = 4;
        report.batches_succeeded = 3;
        report.batches_failed = 1;
        report.failures.push(BatchFailure {
            batch_number: 2,
            message: "I/O error: disk full".to_string(),
        });

        assert!(!report.is_successful());
        assert_eq!(report.success_rate(), 75.0);
        assert_eq!(report.duration, Duration::from_secs(3));
    }

    #[test]
    fn test_finish_errors_make_report_unsuccessful() {
        let mut report = JobReport::new("job-1", None);
        report.finish_errors.push("zip trailer".to_string());
        assert!(!report.is_successful());
    }
}
