//! Failure notification channel
//!
//! One [`FailureChannel`] exists per job. The dispatch engine reports its own
//! retrieval failures on it and export listeners report per-batch export
//! failures on it, so callers subscribe in a single place.

use super::listener::panic_message;
use crate::domain::{BatchEvent, DatamoveError, Result};
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, RwLock};

/// Callback invoked when a batch fails
pub trait BatchFailureListener: Send + Sync {
    /// Handle a failed batch
    ///
    /// # Errors
    ///
    /// Errors are logged by the channel and never propagated.
    fn on_failure(&self, batch: &BatchEvent, error: &DatamoveError) -> Result<()>;
}

impl<F> BatchFailureListener for F
where
    F: Fn(&BatchEvent, &DatamoveError) -> Result<()> + Send + Sync,
{
    fn on_failure(&self, batch: &BatchEvent, error: &DatamoveError) -> Result<()> {
        self(batch, error)
    }
}

/// A failure recorded by the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Batch number of the failed batch
    pub batch_number: u64,

    /// Error message
    pub message: String,
}

/// Ordered, fault-isolated list of failure listeners
#[derive(Default)]
pub struct FailureChannel {
    listeners: RwLock<Vec<Arc<dyn BatchFailureListener>>>,
    failures: Mutex<Vec<BatchFailure>>,
}

impl FailureChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; listeners run in registration order
    pub fn register(&self, listener: Arc<dyn BatchFailureListener>) {
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push(listener),
            Err(poisoned) => poisoned.into_inner().push(listener),
        }
    }

    /// Register a closure as a listener
    pub fn on_failure<F>(&self, listener: F)
    where
        F: Fn(&BatchEvent, &DatamoveError) -> Result<()> + Send + Sync + 'static,
    {
        self.register(Arc::new(listener));
    }

    /// Report a failed batch to every listener
    ///
    /// Each listener runs independently: an error or panic in one is logged
    /// and the remaining listeners still run.
    pub fn notify(&self, batch: &BatchEvent, error: &DatamoveError) {
        crate::log_batch_failed!(batch.job_batch_number, error);

        match self.failures.lock() {
            Ok(mut failures) => failures.push(BatchFailure {
                batch_number: batch.job_batch_number,
                message: error.to_string(),
            }),
            Err(poisoned) => poisoned.into_inner().push(BatchFailure {
                batch_number: batch.job_batch_number,
                message: error.to_string(),
            }),
        }

        let listeners: Vec<Arc<dyn BatchFailureListener>> = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        for listener in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener.on_failure(batch, error))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(
                        batch_number = batch.job_batch_number,
                        error = %e,
                        "Failure listener returned an error"
                    );
                }
                Err(payload) => {
                    tracing::error!(
                        batch_number = batch.job_batch_number,
                        error = %panic_message(payload),
                        "Failure listener panicked"
                    );
                }
            }
        }
    }

    /// Every failure reported so far, in report order
    pub fn failures(&self) -> Vec<BatchFailure> {
        match self.failures.lock() {
            Ok(failures) => failures.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Distinct batch numbers that failed
    pub fn failed_batches(&self) -> BTreeSet<u64> {
        self.failures().iter().map(|f| f.batch_number).collect()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for FailureChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureChannel")
            .field("listeners", &self.listener_count())
            .field("failures", &self.failures().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_notify_runs_listeners_in_order() {
        let channel = FailureChannel::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = order.clone();
            channel.on_failure(move |_batch, _error| {
                order.lock().unwrap().push(id);
                Ok(())
            });
        }

        let batch = BatchEvent::new(vec!["/a".to_string()], 4, 10);
        channel.notify(&batch, &DatamoveError::Export("disk full".to_string()));

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(channel.failures().len(), 1);
        assert_eq!(channel.failures()[0].batch_number, 4);
        assert!(channel.failures()[0].message.contains("disk full"));
    }

    #[test]
    fn test_broken_listeners_do_not_stop_later_ones() {
        let channel = FailureChannel::new();
        let calls = Arc::new(AtomicUsize::new(0));

        channel.on_failure(|_b, _e| Err(DatamoveError::Other("listener failed".to_string())));
        channel.on_failure(|_b, _e| panic!("listener panicked"));
        let counter = calls.clone();
        channel.on_failure(move |_b, _e| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let batch = BatchEvent::new(vec!["/a".to_string()], 1, 1);
        channel.notify(&batch, &DatamoveError::Io("broken pipe".to_string()));
        channel.notify(&batch, &DatamoveError::Io("broken pipe".to_string()));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(channel.failed_batches().len(), 1);
    }
}
