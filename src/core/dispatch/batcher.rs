//! In-process batch dispatch engine
//!
//! [`LocalBatcher`] partitions a selection into batches and delivers each
//! batch exactly once to every registered listener on a bounded pool of
//! blocking workers. Batches are numbered from 1 in construction order; the
//! order in which workers deliver them is not defined.

use super::failure::FailureChannel;
use super::listener::{panic_message, BatchListener, JobContext};
use super::report::JobReport;
use crate::adapters::store::RecordStore;
use crate::domain::{BatchEvent, DatamoveError, Result, Selection};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::Instrument;

/// Default number of records per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default number of worker threads
pub const DEFAULT_THREAD_COUNT: usize = 8;

/// Largest accepted worker count
pub const MAX_THREAD_COUNT: usize = 256;

/// Batching and scheduling settings for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatcherConfig {
    /// Records per batch
    pub batch_size: usize,

    /// Concurrent workers
    pub thread_count: usize,

    /// Job identifier
    pub job_id: String,

    /// Optional job name
    pub job_name: Option<String>,
}

impl BatcherConfig {
    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DatamoveError::Configuration(
                "batch size must be greater than 0".to_string(),
            ));
        }
        if self.thread_count == 0 || self.thread_count > MAX_THREAD_COUNT {
            return Err(DatamoveError::Configuration(format!(
                "thread count must be between 1 and {MAX_THREAD_COUNT}, got {}",
                self.thread_count
            )));
        }
        if self.job_id.trim().is_empty() {
            return Err(DatamoveError::Configuration(
                "job id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            thread_count: DEFAULT_THREAD_COUNT,
            job_id: uuid::Uuid::new_v4().to_string(),
            job_name: None,
        }
    }
}

/// Handle to a running job
#[derive(Debug)]
pub struct JobTicket {
    job_id: String,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<Result<JobReport>>,
}

impl JobTicket {
    /// Job identifier
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stop scheduling new batches; batches already handed to a worker complete
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// A sender that stops the job when `true` is sent
    pub fn stop_handle(&self) -> watch::Sender<bool> {
        self.stop_tx.clone()
    }

    /// Wait for every scheduled batch and for listener teardown
    pub async fn await_completion(self) -> Result<JobReport> {
        self.handle
            .await
            .map_err(|e| DatamoveError::Dispatch(format!("job task failed: {e}")))?
    }
}

/// Minimal in-process dispatch engine
pub struct LocalBatcher {
    config: BatcherConfig,
    selection: Selection,
    job_kind: String,
    listeners: Vec<Arc<dyn BatchListener>>,
    failures: Arc<FailureChannel>,
}

impl LocalBatcher {
    /// Create a batcher for a selection
    pub fn new(config: BatcherConfig, selection: Selection) -> Self {
        Self {
            config,
            selection,
            job_kind: "custom".to_string(),
            listeners: Vec::new(),
            failures: Arc::new(FailureChannel::new()),
        }
    }

    /// Label used in logs for the job kind
    pub fn with_job_kind(mut self, kind: impl Into<String>) -> Self {
        self.job_kind = kind.into();
        self
    }

    /// Register a listener; listeners see each batch in registration order
    pub fn with_listener(mut self, listener: Arc<dyn BatchListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Share a failure channel with listeners built elsewhere
    pub fn with_failure_channel(mut self, failures: Arc<FailureChannel>) -> Self {
        self.failures = failures;
        self
    }

    /// The job's failure channel
    pub fn failures(&self) -> Arc<FailureChannel> {
        self.failures.clone()
    }

    /// Start the job on the current tokio runtime
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or no runtime is active.
    pub fn start(self, store: Arc<dyn RecordStore>) -> Result<JobTicket> {
        self.config.validate()?;
        self.selection.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            DatamoveError::Dispatch(format!("a tokio runtime is required to start a job: {e}"))
        })?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let job_id = self.config.job_id.clone();
        let span = crate::logging::job_span(&self.config, &self.job_kind);
        let handle = runtime.spawn(self.run(store, stop_rx).instrument(span));

        Ok(JobTicket {
            job_id,
            stop_tx,
            handle,
        })
    }

    async fn run(self, store: Arc<dyn RecordStore>, stop_rx: watch::Receiver<bool>) -> Result<JobReport> {
        let started = Instant::now();
        let listeners = Arc::new(self.listeners);
        let mut report = JobReport::new(&self.config.job_id, self.config.job_name.clone());

        let outcome = dispatch(
            &self.config,
            &self.selection,
            &self.job_kind,
            store,
            listeners.clone(),
            self.failures.clone(),
            stop_rx,
            &mut report,
        )
        .await;

        // Listeners are closed on every exit path, including failed setup
        let finishing = listeners.clone();
        let span = tracing::Span::current();
        let finish_errors = tokio::task::spawn_blocking(move || {
            span.in_scope(|| finish_listeners(&finishing))
        })
        .await
        .map_err(|e| DatamoveError::Dispatch(format!("listener teardown task failed: {e}")))?;
        report.finish_errors = finish_errors;

        outcome?;

        report.failures = self.failures.failures();
        report.batches_failed = self.failures.failed_batches().len() as u64;
        report.batches_succeeded = report.batches_total.saturating_sub(report.batches_failed);
        let report = report.with_duration(started.elapsed());

        crate::log_job_complete!(&report.job_id, report.results_dispatched, report.duration);
        report.log_summary();
        Ok(report)
    }
}

#[allow(clippy::too_many_arguments)]
async fn dispatch(
    config: &BatcherConfig,
    selection: &Selection,
    job_kind: &str,
    store: Arc<dyn RecordStore>,
    listeners: Arc<Vec<Arc<dyn BatchListener>>>,
    failures: Arc<FailureChannel>,
    stop_rx: watch::Receiver<bool>,
    report: &mut JobReport,
) -> Result<()> {
    let select_store = store.clone();
    let select_from = selection.clone();
    let uris = tokio::task::spawn_blocking(move || select_store.select(&select_from))
        .await
        .map_err(|e| DatamoveError::Dispatch(format!("selection task failed: {e}")))??;

    let total = uris.len() as u64;
    report.total_results = total;

    crate::log_job_start!(&config.job_id, job_kind, total);
    tracing::info!(
        job_id = %config.job_id,
        source = %store.describe(),
        selection = %selection,
        batch_size = config.batch_size,
        thread_count = config.thread_count,
        "Dispatching batches"
    );

    let context = JobContext::new(&config.job_id)
        .with_job_name(config.job_name.clone())
        .with_total_results(total);
    for listener in listeners.iter() {
        listener.initialize(&context).map_err(|e| {
            DatamoveError::Dispatch(format!(
                "listener {} failed to initialize: {e}",
                listener.name()
            ))
        })?;
    }

    let semaphore = Arc::new(Semaphore::new(config.thread_count));
    let mut tasks = JoinSet::new();
    let mut results_so_far = 0u64;

    for (index, chunk) in uris.chunks(config.batch_size).enumerate() {
        if *stop_rx.borrow() {
            report.stopped = true;
            break;
        }

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| DatamoveError::Dispatch(format!("worker pool closed: {e}")))?;

        // A stop request may arrive while waiting for a free worker
        if *stop_rx.borrow() {
            report.stopped = true;
            break;
        }

        results_so_far += chunk.len() as u64;
        let batch = BatchEvent::new(chunk.to_vec(), index as u64 + 1, results_so_far);
        report.batches_total += 1;
        report.results_dispatched = results_so_far;

        let listeners = listeners.clone();
        let failures = failures.clone();
        let store = store.clone();
        let span = tracing::Span::current();
        tasks.spawn_blocking(move || {
            let _permit = permit;
            let _entered = span.enter();
            deliver(&listeners, &batch, store.as_ref(), &failures);
        });
    }

    if report.stopped {
        tracing::info!(
            job_id = %config.job_id,
            batches_scheduled = report.batches_total,
            "Job stopped; waiting for in-flight batches"
        );
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Batch worker terminated abnormally");
        }
    }

    Ok(())
}

/// Hand one batch to every listener, isolating each listener's failure
fn deliver(
    listeners: &[Arc<dyn BatchListener>],
    batch: &BatchEvent,
    store: &dyn RecordStore,
    failures: &FailureChannel,
) {
    for listener in listeners {
        let outcome = catch_unwind(AssertUnwindSafe(|| listener.process_batch(batch, store)));
        let error = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(payload) => DatamoveError::Dispatch(format!(
                "listener {} {}",
                listener.name(),
                panic_message(payload)
            )),
        };
        failures.notify(batch, &error);
    }
}

fn finish_listeners(listeners: &[Arc<dyn BatchListener>]) -> Vec<String> {
    let mut errors = Vec::new();
    for listener in listeners {
        match catch_unwind(AssertUnwindSafe(|| listener.finish())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(listener = listener.name(), error = %e, "Listener failed to finish");
                errors.push(format!("{}: {e}", listener.name()));
            }
            Err(payload) => {
                let message = panic_message(payload);
                tracing::error!(listener = listener.name(), error = %message, "Listener panicked while finishing");
                errors.push(format!("{}: {message}", listener.name()));
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::InMemoryStore;
    use crate::domain::Record;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        initialized: AtomicBool,
        finished: AtomicUsize,
        batches: Mutex<Vec<(u64, u64, usize)>>,
        fail_batch: Option<u64>,
    }

    impl BatchListener for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn initialize(&self, job: &JobContext) -> Result<()> {
            assert_eq!(job.total_results, Some(25));
            self.initialized.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn process_batch(&self, batch: &BatchEvent, records: &dyn RecordStore) -> Result<()> {
            assert!(self.initialized.load(Ordering::SeqCst));
            let fetched = records.fetch(&batch.items, None)?;
            self.batches.lock().unwrap().push((
                batch.job_batch_number,
                batch.job_results_so_far,
                fetched.len(),
            ));
            if Some(batch.job_batch_number) == self.fail_batch {
                return Err(DatamoveError::Export("simulated".to_string()));
            }
            Ok(())
        }

        fn finish(&self) -> Result<()> {
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn store_with(count: usize) -> Arc<dyn RecordStore> {
        let store = InMemoryStore::new();
        for i in 0..count {
            store
                .insert(Record::new(format!("/doc/{i:03}.json"), "{}"), &["docs"])
                .unwrap();
        }
        Arc::new(store)
    }

    fn config(batch_size: usize, thread_count: usize) -> BatcherConfig {
        BatcherConfig {
            batch_size,
            thread_count,
            job_id: "test-job".to_string(),
            job_name: None,
        }
    }

    #[test]
    fn test_batcher_config_validation() {
        assert!(BatcherConfig::default().validate().is_ok());
        assert!(config(0, 4).validate().is_err());
        assert!(config(10, 0).validate().is_err());
        assert!(config(10, 257).validate().is_err());
        assert_eq!(BatcherConfig::default().batch_size, 100);
        assert_eq!(BatcherConfig::default().thread_count, 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_every_batch_delivered_once() {
        let listener = Arc::new(Recording::default());
        let ticket = LocalBatcher::new(config(10, 3), Selection::Collections(vec!["docs".into()]))
            .with_listener(listener.clone())
            .start(store_with(25))
            .unwrap();

        let report = ticket.await_completion().await.unwrap();
        assert_eq!(report.total_results, 25);
        assert_eq!(report.batches_total, 3);
        assert_eq!(report.batches_succeeded, 3);
        assert!(report.is_successful());
        assert_eq!(listener.finished.load(Ordering::SeqCst), 1);

        let mut batches = listener.batches.lock().unwrap().clone();
        batches.sort();
        assert_eq!(batches, vec![(1, 10, 10), (2, 20, 10), (3, 25, 5)]);
    }

    #[tokio::test]
    async fn test_listener_error_reaches_failure_channel() {
        let listener = Arc::new(Recording {
            fail_batch: Some(2),
            ..Default::default()
        });
        let batcher = LocalBatcher::new(config(10, 2), Selection::Collections(vec!["docs".into()]))
            .with_listener(listener.clone());
        let failures = batcher.failures();
        let seen = Arc::new(Mutex::new(BTreeSet::new()));
        let sink = seen.clone();
        failures.on_failure(move |batch, _error| {
            sink.lock().unwrap().insert(batch.job_batch_number);
            Ok(())
        });

        let report = batcher
            .start(store_with(25))
            .unwrap()
            .await_completion()
            .await
            .unwrap();

        assert_eq!(report.batches_failed, 1);
        assert_eq!(report.batches_succeeded, 2);
        assert_eq!(*seen.lock().unwrap(), BTreeSet::from([2]));
        assert_eq!(listener.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_before_dispatch_still_finishes_listeners() {
        let listener = Arc::new(Recording::default());
        let ticket = LocalBatcher::new(config(1, 1), Selection::Collections(vec!["docs".into()]))
            .with_listener(listener.clone())
            .start(store_with(25))
            .unwrap();
        ticket.stop();

        let report = ticket.await_completion().await.unwrap();
        assert!(report.stopped);
        assert!(report.batches_total < 25);
        assert_eq!(listener.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_start_requires_runtime() {
        let result = LocalBatcher::new(config(10, 1), Selection::Uris(vec!["/a".into()]))
            .start(store_with(1));
        assert!(matches!(result, Err(DatamoveError::Dispatch(_))));
    }
}
