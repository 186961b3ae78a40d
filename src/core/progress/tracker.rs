//! Progress tracking over out-of-order batch events
//!
//! Batches complete on many workers in no particular order. The tracker keeps
//! a single atomic high-water mark of the cumulative result count and emits a
//! [`ProgressSnapshot`] only from the event that advanced it, so observers see
//! a non-decreasing sequence with no duplicate counts.

use super::clock::{Clock, SystemClock};
use super::snapshot::ProgressSnapshot;
use crate::adapters::store::RecordStore;
use crate::core::dispatch::listener::{panic_message, BatchListener, JobContext};
use crate::domain::{BatchEvent, Result};
use chrono::{DateTime, Utc};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Callback receiving progress snapshots
pub type ProgressObserver = Box<dyn Fn(&ProgressSnapshot) -> Result<()> + Send + Sync>;

/// Converts batch completion events into a monotonic progress stream
pub struct ProgressTracker {
    high_water_mark: AtomicU64,
    configured_total: u64,
    engine_total: OnceLock<u64>,
    start_time: OnceLock<DateTime<Utc>>,
    clock: Arc<dyn Clock>,
    observers: Vec<ProgressObserver>,
}

impl ProgressTracker {
    /// Create a tracker; a total of 0 means the total is unknown
    pub fn new(total_results: u64) -> Self {
        Self {
            high_water_mark: AtomicU64::new(0),
            configured_total: total_results,
            engine_total: OnceLock::new(),
            start_time: OnceLock::new(),
            clock: Arc::new(SystemClock),
            observers: Vec::new(),
        }
    }

    /// Use another time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register an observer; observers run in registration order
    pub fn on_progress<F>(mut self, observer: F) -> Self
    where
        F: Fn(&ProgressSnapshot) -> Result<()> + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
        self
    }

    /// Record the job start time
    ///
    /// Only the first call has an effect.
    pub fn start(&self) {
        let _ = self.start_time.set(self.clock.now());
    }

    /// Largest cumulative result count observed
    pub fn high_water_mark(&self) -> u64 {
        self.high_water_mark.load(Ordering::Acquire)
    }

    /// Total given at construction; 0 when unknown
    pub fn configured_total(&self) -> u64 {
        self.configured_total
    }

    /// Total used for completion: the configured total, or the engine's when
    /// none was configured
    pub fn effective_total(&self) -> u64 {
        if self.configured_total > 0 {
            self.configured_total
        } else {
            self.engine_total.get().copied().unwrap_or(0)
        }
    }

    /// Account for one batch event
    ///
    /// Safe to call concurrently. Returns the snapshot when this event advanced
    /// the high-water mark, after every observer has seen it.
    pub fn record(&self, event: &BatchEvent) -> Option<ProgressSnapshot> {
        let results = event.job_results_so_far;
        let previous = self.high_water_mark.fetch_max(results, Ordering::AcqRel);
        if results <= previous {
            return None;
        }

        let now = self.clock.now();
        let start_time = *self.start_time.get_or_init(|| now);
        let elapsed_seconds = (now - start_time).num_milliseconds() as f64 / 1000.0;

        // The known total is kept; only the reported total is raised
        let known = self.effective_total();
        let total_results = if known > 0 { known.max(results) } else { 0 };

        let snapshot = ProgressSnapshot {
            results_so_far: results,
            total_results,
            elapsed_seconds,
            start_time,
            job_batch_number: event.job_batch_number,
        };

        for (index, observer) in self.observers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| observer(&snapshot))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(
                        observer = index,
                        progress = %snapshot,
                        error = %e,
                        "Progress observer returned an error"
                    );
                }
                Err(payload) => {
                    tracing::error!(
                        observer = index,
                        progress = %snapshot,
                        error = %panic_message(payload),
                        "Progress observer panicked"
                    );
                }
            }
        }

        Some(snapshot)
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("high_water_mark", &self.high_water_mark())
            .field("configured_total", &self.configured_total)
            .field("engine_total", &self.engine_total.get())
            .field("start_time", &self.start_time.get())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl BatchListener for ProgressTracker {
    fn name(&self) -> &str {
        "progress"
    }

    fn initialize(&self, job: &JobContext) -> Result<()> {
        if let Some(total) = job.total_results {
            let _ = self.engine_total.set(total);
        }
        self.start();
        Ok(())
    }

    fn process_batch(&self, batch: &BatchEvent, _records: &dyn RecordStore) -> Result<()> {
        self.record(batch);
        Ok(())
    }
}
