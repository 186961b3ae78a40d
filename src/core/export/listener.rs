//! Export listener
//!
//! Fetches the records of each batch and hands them to a [`BatchExporter`].
//! Any error or panic while fetching or exporting fails the batch as a unit:
//! it is reported once on the job's failure channel and never propagated to
//! the dispatch engine.

use super::exporter::BatchExporter;
use crate::adapters::store::RecordStore;
use crate::core::dispatch::listener::panic_message;
use crate::core::dispatch::{BatchListener, FailureChannel};
use crate::domain::{BatchEvent, DatamoveError, Result, ServerTransform};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Listener exporting each batch through an exporter
pub struct ExportBatchesListener {
    name: String,
    exporter: Arc<dyn BatchExporter>,
    transform: Option<ServerTransform>,
    failures: Arc<FailureChannel>,
}

impl ExportBatchesListener {
    /// Create a listener reporting failures on `failures`
    pub fn new(exporter: Arc<dyn BatchExporter>, failures: Arc<FailureChannel>) -> Self {
        Self {
            name: "export".to_string(),
            exporter,
            transform: None,
            failures,
        }
    }

    /// Transform applied by the record source while fetching
    pub fn with_transform(mut self, transform: Option<ServerTransform>) -> Self {
        self.transform = transform;
        self
    }

    /// Name used in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The wrapped exporter
    pub fn exporter(&self) -> &Arc<dyn BatchExporter> {
        &self.exporter
    }

    fn export(&self, batch: &BatchEvent, records: &dyn RecordStore) -> Result<()> {
        let fetched = records.fetch(&batch.items, self.transform.as_ref())?;
        self.exporter.export_batch(batch, &fetched)
    }
}

impl BatchListener for ExportBatchesListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_batch(&self, batch: &BatchEvent, records: &dyn RecordStore) -> Result<()> {
        let error = match catch_unwind(AssertUnwindSafe(|| self.export(batch, records))) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e,
            Err(payload) => DatamoveError::Export(format!(
                "exporting batch {} to {} failed with {}",
                batch.job_batch_number,
                self.exporter.target().location().display(),
                panic_message(payload)
            )),
        };

        tracing::warn!(
            listener = %self.name,
            batch_number = batch.job_batch_number,
            items = batch.len(),
            error = %error,
            "Unable to export batch"
        );
        self.failures.notify(batch, &error);
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        self.exporter.finish()
    }
}
