//! Export to caller-supplied record consumers
//!
//! Fetches the records of each batch and hands every record to each
//! consumer in registration order. Nothing is written by this module; the
//! consumers decide what exporting means.

use crate::adapters::store::RecordStore;
use crate::core::dispatch::listener::panic_message;
use crate::core::dispatch::{BatchListener, FailureChannel};
use crate::domain::{BatchEvent, DatamoveError, Record, Result, ServerTransform};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Callback receiving each exported record
pub type RecordConsumer = Arc<dyn Fn(&Record) -> Result<()> + Send + Sync>;

/// Listener passing every fetched record to a list of consumers
///
/// The first consumer error or panic fails the batch; it is reported once on
/// the failure channel and the remaining records of that batch are skipped.
pub struct RecordConsumersListener {
    name: String,
    consumers: Vec<RecordConsumer>,
    transform: Option<ServerTransform>,
    failures: Arc<FailureChannel>,
}

impl RecordConsumersListener {
    /// Create a listener reporting failures on `failures`
    pub fn new(consumers: Vec<RecordConsumer>, failures: Arc<FailureChannel>) -> Self {
        Self {
            name: "consumers".to_string(),
            consumers,
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

    fn consume(&self, batch: &BatchEvent, records: &dyn RecordStore) -> Result<()> {
        for record in records.fetch(&batch.items, self.transform.as_ref())? {
            for consumer in &self.consumers {
                consumer(&record)?;
            }
        }
        Ok(())
    }
}

impl BatchListener for RecordConsumersListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_batch(&self, batch: &BatchEvent, records: &dyn RecordStore) -> Result<()> {
        let error = match catch_unwind(AssertUnwindSafe(|| self.consume(batch, records))) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => e,
            Err(payload) => DatamoveError::Export(format!(
                "record consumer failed on batch {} with {}",
                batch.job_batch_number,
                panic_message(payload)
            )),
        };

        tracing::warn!(
            listener = %self.name,
            batch_number = batch.job_batch_number,
            error = %error,
            "Record consumer failed"
        );
        self.failures.notify(batch, &error);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::InMemoryStore;
    use std::sync::Mutex;

    #[test]
    fn test_every_consumer_sees_every_record() {
        let store = InMemoryStore::new();
        store.insert(Record::new("/a.json", "1"), &["c"]).unwrap();
        store.insert(Record::new("/b.json", "2"), &["c"]).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = seen.clone();
        let second = seen.clone();
        let consumers: Vec<RecordConsumer> = vec![
            Arc::new(move |r: &Record| {
                first.lock().unwrap().push(format!("1:{}", r.uri));
                Ok(())
            }),
            Arc::new(move |r: &Record| {
                second.lock().unwrap().push(format!("2:{}", r.uri));
                Ok(())
            }),
        ];
        let failures = Arc::new(FailureChannel::new());
        let listener = RecordConsumersListener::new(consumers, failures.clone());

        let batch = BatchEvent::new(vec!["/b.json".into(), "/a.json".into()], 1, 2);
        listener.process_batch(&batch, &store).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["1:/b.json", "2:/b.json", "1:/a.json", "2:/a.json"]
        );
        assert!(failures.failures().is_empty());
    }

    #[test]
    fn test_consumer_error_fails_batch_once() {
        let store = InMemoryStore::new();
        store.insert(Record::new("/a.json", "1"), &["c"]).unwrap();
        store.insert(Record::new("/b.json", "2"), &["c"]).unwrap();

        let consumers: Vec<RecordConsumer> =
            vec![Arc::new(|_r: &Record| Err(DatamoveError::Export("rejected".to_string())))];
        let failures = Arc::new(FailureChannel::new());
        let listener = RecordConsumersListener::new(consumers, failures.clone());

        let batch = BatchEvent::new(vec!["/a.json".into(), "/b.json".into()], 3, 2);
        assert!(listener.process_batch(&batch, &store).is_ok());

        let recorded = failures.failures();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].batch_number, 3);
    }
}
