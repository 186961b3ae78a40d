//! Batch events delivered by the dispatch engine
//!
//! A [`BatchEvent`] is created once per batch and handed to every registered
//! listener. Batches may arrive in any order and on any worker thread; the
//! counters are stamped in construction order, not arrival order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One batch of record identifiers selected by a job
///
/// # Examples
///
/// ```
/// use datamove::domain::BatchEvent;
///
/// let batch = BatchEvent::new(vec!["/a.json".to_string(), "/b.json".to_string()], 3, 250);
/// assert_eq!(batch.job_batch_number, 3);
/// assert_eq!(batch.job_results_so_far, 250);
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEvent {
    /// Record identifiers (URIs) in this batch, in selection order
    pub items: Vec<String>,

    /// Batch number within the job, assigned from 1 in construction order
    pub job_batch_number: u64,

    /// Cumulative results dispatched across the whole job as of this batch
    pub job_results_so_far: u64,

    /// Batch number within the originating partition
    pub forest_batch_number: u64,

    /// Cumulative results within the originating partition
    pub forest_results_so_far: u64,

    /// Name of the originating partition, opaque to this crate
    pub forest: Option<String>,

    /// When the batch was created
    pub timestamp: DateTime<Utc>,
}

impl BatchEvent {
    /// Create a batch event for a single-partition job
    pub fn new(items: Vec<String>, job_batch_number: u64, job_results_so_far: u64) -> Self {
        Self {
            items,
            job_batch_number,
            job_results_so_far,
            forest_batch_number: job_batch_number,
            forest_results_so_far: job_results_so_far,
            forest: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach partition counters to the event
    pub fn with_forest(
        mut self,
        forest: impl Into<String>,
        forest_batch_number: u64,
        forest_results_so_far: u64,
    ) -> Self {
        self.forest = Some(forest.into());
        self.forest_batch_number = forest_batch_number;
        self.forest_results_so_far = forest_results_so_far;
        self
    }

    /// Number of items in the batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
