//! Listener that logs every processed batch

use crate::adapters::store::RecordStore;
use crate::core::dispatch::BatchListener;
use crate::domain::{BatchEvent, Result};

/// Logs each batch as it is delivered
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchLoggingListener;

impl BatchLoggingListener {
    /// Create the listener
    pub fn new() -> Self {
        Self
    }

    /// Text logged for a batch
    pub fn message(batch: &BatchEvent) -> String {
        format!(
            "Processed batch number [{}]; job results so far: [{}]",
            batch.job_batch_number, batch.job_results_so_far
        )
    }
}

impl BatchListener for BatchLoggingListener {
    fn name(&self) -> &str {
        "batch-logging"
    }

    fn process_batch(&self, batch: &BatchEvent, _records: &dyn RecordStore) -> Result<()> {
        crate::log_batch_processed!(batch.job_batch_number, batch.job_results_so_far);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message() {
        let batch = BatchEvent::new(vec!["/a".to_string()], 3, 300);
        assert_eq!(
            BatchLoggingListener::message(&batch),
            "Processed batch number [3]; job results so far: [300]"
        );
    }
}
