//! Listener contracts between the dispatch engine and this crate
//!
//! The engine calls [`BatchListener::initialize`] once before any batch,
//! [`BatchListener::process_batch`] once per batch on an arbitrary worker
//! thread in no particular order, and [`BatchListener::finish`] once after the
//! last batch has been processed or the job was stopped.

use crate::adapters::store::RecordStore;
use crate::domain::{BatchEvent, Result};
use chrono::{DateTime, Utc};
use std::any::Any;

/// Job-level information handed to listeners before the first batch
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Job identifier
    pub job_id: String,

    /// Optional human-readable job name
    pub job_name: Option<String>,

    /// Total number of selected results, when the engine knows it
    pub total_results: Option<u64>,

    /// When the job started
    pub started_at: DateTime<Utc>,
}

impl JobContext {
    /// Create a context for a job that starts now
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            job_name: None,
            total_results: None,
            started_at: Utc::now(),
        }
    }

    /// Set the job name
    pub fn with_job_name(mut self, job_name: Option<String>) -> Self {
        self.job_name = job_name;
        self
    }

    /// Set the known total
    pub fn with_total_results(mut self, total: u64) -> Self {
        self.total_results = Some(total);
        self
    }
}

/// Consumer of batch events
///
/// Implementations must be safe to call concurrently from several worker
/// threads.
pub trait BatchListener: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Called once before any batch is delivered
    fn initialize(&self, _job: &JobContext) -> Result<()> {
        Ok(())
    }

    /// Process one batch
    ///
    /// # Errors
    ///
    /// An error is attributed to this batch only. The engine routes it to the
    /// job's failure listeners and keeps processing other batches.
    fn process_batch(&self, batch: &BatchEvent, records: &dyn RecordStore) -> Result<()>;

    /// Called once after the last batch; releases shared resources
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// Render a caught panic payload as text
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}
