//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - JSON-formatted file logs with rotation, tagged with the running job
//! - Configurable log levels
//! - Console output for interactive runs
//!
//! # Example
//!
//! ```no_run
//! use datamove::logging::init_logging;
//! use datamove::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, job_span, LoggingGuard};

/// Log the start of a job
///
/// # Example
///
/// ```no_run
/// use datamove::log_job_start;
///
/// log_job_start!("job-1", "export-to-zip", 1200);
/// ```
#[macro_export]
macro_rules! log_job_start {
    ($job_id:expr, $job_kind:expr, $total:expr) => {
        tracing::info!(
            job_id = %$job_id,
            job_kind = %$job_kind,
            total_results = $total,
            "Starting job"
        );
    };
}

/// Log the completion of a job
///
/// # Example
///
/// ```no_run
/// use datamove::log_job_complete;
/// use std::time::Duration;
///
/// log_job_complete!("job-1", 1200, Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! log_job_complete {
    ($job_id:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            job_id = %$job_id,
            count = $count,
            duration_ms = $duration.as_millis(),
            "Job completed"
        );
    };
}

/// Log a processed batch
///
/// ```no_run
/// use datamove::log_batch_processed;
///
/// log_batch_processed!(4, 400);
/// ```
#[macro_export]
macro_rules! log_batch_processed {
    ($batch_number:expr, $results_so_far:expr) => {
        tracing::info!(
            batch_number = $batch_number,
            results_so_far = $results_so_far,
            "Processed batch number [{}]; job results so far: [{}]",
            $batch_number,
            $results_so_far
        );
    };
}

/// Log a failed batch
///
/// ```no_run
/// use datamove::log_batch_failed;
/// use datamove::domain::DatamoveError;
///
/// let error = DatamoveError::Export("disk full".to_string());
/// log_batch_failed!(7, &error);
/// ```
#[macro_export]
macro_rules! log_batch_failed {
    ($batch_number:expr, $error:expr) => {
        tracing::error!(
            batch_number = $batch_number,
            error = %$error,
            "Batch failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::DatamoveError;
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        let error = DatamoveError::Archive("duplicate entry".to_string());
        log_job_start!("job-1", "export-to-file", 10u64);
        log_batch_processed!(1u64, 10u64);
        log_batch_failed!(2u64, &error);
        log_job_complete!("job-1", 10u64, Duration::from_millis(5));
    }
}
