//! Job lifecycle
//!
//! A [`Job`] combines batching settings, a selection, a job kind and its
//! property registry. Starting a job builds the kind's listener, shares one
//! failure channel between the dispatch engine and the listener, and hands
//! everything to a [`LocalBatcher`].

use super::kinds::{
    ExportBatchesToDirectoryJob, ExportBatchesToZipsJob, ExportToFileJob, ExportToZipJob, JobKind,
};
use super::mutation::{
    AddCollectionsJob, DeleteCollectionsJob, DeleteJob, RemoveCollectionsJob, SetCollectionsJob,
    SetPermissionsJob,
};
use super::property::{JobPropertyRegistry, PropertyDescriptor};
use crate::adapters::store::RecordStore;
use crate::core::dispatch::batcher::MAX_THREAD_COUNT;
use crate::core::dispatch::{
    BatchFailureListener, BatcherConfig, FailureChannel, JobReport, JobTicket, LocalBatcher,
};
use crate::core::progress::{BatchLoggingListener, ProgressTracker};
use crate::domain::{BatchEvent, DatamoveError, Result, Selection};
use std::collections::HashMap;
use std::mem::discriminant;
use std::sync::Arc;

/// Names of every job kind selectable by name, in listing order
pub const JOB_NAMES: [&str; 10] = [
    ExportToFileJob::NAME,
    ExportToZipJob::NAME,
    ExportBatchesToDirectoryJob::NAME,
    ExportBatchesToZipsJob::NAME,
    AddCollectionsJob::NAME,
    SetCollectionsJob::NAME,
    RemoveCollectionsJob::NAME,
    DeleteCollectionsJob::NAME,
    SetPermissionsJob::NAME,
    DeleteJob::NAME,
];

/// Everything a property consumer may change
#[derive(Debug, Clone)]
pub struct JobState<K> {
    /// Batching and scheduling settings
    pub batcher: BatcherConfig,

    /// Records the job operates on
    pub selection: Option<Selection>,

    /// Kind-specific settings
    pub kind: K,
}

impl<K> JobState<K> {
    /// Set the selection; a different kind of selection may not replace an earlier one
    pub fn select(&mut self, selection: Selection) -> Result<()> {
        selection.validate()?;
        if let Some(existing) = &self.selection {
            if discriminant(existing) != discriminant(&selection) {
                return Err(DatamoveError::Validation(
                    "only one of whereUris, whereCollections and whereUriPattern may be set"
                        .to_string(),
                ));
            }
        }
        self.selection = Some(selection);
        Ok(())
    }
}

fn register_common_properties<K: JobKind>(registry: &mut JobPropertyRegistry<JobState<K>>) {
    registry.add_property("batchSize", "Number of records in each batch; defaults to 100", |s, v| {
        let size: usize = v
            .trim()
            .parse()
            .map_err(|_| DatamoveError::Validation(format!("'{v}' is not a positive integer")))?;
        if size == 0 {
            return Err(DatamoveError::Validation(
                "batch size must be greater than 0".to_string(),
            ));
        }
        s.batcher.batch_size = size;
        Ok(())
    });
    registry.add_property(
        "threadCount",
        "Number of threads processing batches; defaults to 8",
        |s, v| {
            let count: usize = v.trim().parse().map_err(|_| {
                DatamoveError::Validation(format!("'{v}' is not a positive integer"))
            })?;
            if count == 0 || count > MAX_THREAD_COUNT {
                return Err(DatamoveError::Validation(format!(
                    "thread count must be between 1 and {MAX_THREAD_COUNT}"
                )));
            }
            s.batcher.thread_count = count;
            Ok(())
        },
    );
    registry.add_property("jobId", "Identifier for the job; defaults to a random UUID", |s, v| {
        if v.trim().is_empty() {
            return Err(DatamoveError::Validation("job id cannot be empty".to_string()));
        }
        s.batcher.job_id = v.to_string();
        Ok(())
    });
    registry.add_property("jobName", "Optional name for the job", |s, v| {
        s.batcher.job_name = Some(v.to_string());
        Ok(())
    });
    if !K::WHERE_PROPERTIES {
        return;
    }
    registry.add_property(
        "whereUris",
        "Comma-delimited list of URIs of the records to process",
        |s, v| s.select(Selection::Uris(Selection::split_list(v))),
    );
    registry.add_property(
        "whereCollections",
        "Comma-delimited list of collections; records in any of them are processed",
        |s, v| s.select(Selection::Collections(Selection::split_list(v))),
    );
    registry.add_property(
        "whereUriPattern",
        "Wildcard pattern matched against record URIs; * matches any run of characters and ? one character",
        |s, v| s.select(Selection::UriPattern(v.trim().to_string())),
    );
}

/// A job of kind `K`
pub struct Job<K: JobKind> {
    state: JobState<K>,
    registry: JobPropertyRegistry<JobState<K>>,
    progress: Option<ProgressTracker>,
    failure_listeners: Vec<Arc<dyn BatchFailureListener>>,
    log_batches: bool,
}

impl<K: JobKind> Job<K> {
    /// Create a job with default settings
    pub fn new(kind: K) -> Self {
        let mut registry = JobPropertyRegistry::new();
        register_common_properties(&mut registry);
        K::register_properties(&mut registry);

        Self {
            state: JobState {
                batcher: BatcherConfig::default(),
                selection: None,
                kind,
            },
            registry,
            progress: None,
            failure_listeners: Vec::new(),
            log_batches: true,
        }
    }

    /// Job kind name
    pub fn name(&self) -> &'static str {
        K::NAME
    }

    /// Current settings
    pub fn state(&self) -> &JobState<K> {
        &self.state
    }

    /// Mutable settings, for programmatic configuration
    pub fn state_mut(&mut self) -> &mut JobState<K> {
        &mut self.state
    }

    /// Property registry, for registering or overriding properties
    pub fn registry_mut(&mut self) -> &mut JobPropertyRegistry<JobState<K>> {
        &mut self.registry
    }

    /// Property descriptors in listing order
    pub fn properties(&self) -> Vec<PropertyDescriptor> {
        self.registry.descriptors()
    }

    /// Apply property values; returns validation errors, empty when all were accepted
    pub fn configure(&mut self, values: &HashMap<String, String>) -> Vec<String> {
        self.registry.configure(&mut self.state, values)
    }

    /// Set the selection
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.state.selection = Some(selection);
        self
    }

    /// Replace the batching settings
    pub fn with_batcher_config(mut self, batcher: BatcherConfig) -> Self {
        self.state.batcher = batcher;
        self
    }

    /// Report progress through a tracker
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress = Some(tracker);
        self
    }

    /// Log every processed batch; on by default
    pub fn with_batch_logging(mut self, enabled: bool) -> Self {
        self.log_batches = enabled;
        self
    }

    /// Register a failure listener
    pub fn on_failure<F>(mut self, listener: F) -> Self
    where
        F: Fn(&BatchEvent, &DatamoveError) -> Result<()> + Send + Sync + 'static,
    {
        self.failure_listeners.push(Arc::new(listener));
        self
    }

    /// The explicit selection, or the kind's default when none was set
    pub fn effective_selection(&self) -> Option<Selection> {
        self.state
            .selection
            .clone()
            .or_else(|| self.state.kind.default_selection())
    }

    /// Sentence describing what the job does
    pub fn description(&self) -> String {
        let selection = self
            .effective_selection()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "with no selection".to_string());
        self.state.kind.description(&selection)
    }

    /// Start the job on the current tokio runtime
    ///
    /// # Errors
    ///
    /// Fails before any batch is dispatched when no selection is set, the
    /// batching settings are invalid, or the output cannot be created.
    pub fn start(self, store: Arc<dyn RecordStore>) -> Result<JobTicket> {
        let selection = self.effective_selection().ok_or_else(|| {
            DatamoveError::Configuration(
                "a selection is required: set whereUris, whereCollections or whereUriPattern"
                    .to_string(),
            )
        })?;
        self.state.batcher.validate()?;

        let failures = Arc::new(FailureChannel::new());
        for listener in self.failure_listeners {
            failures.register(listener);
        }

        tracing::info!(job_id = %self.state.batcher.job_id, "{}", self.state.kind.description(&selection.to_string()));

        let listener = self.state.kind.build_listener(failures.clone())?;

        let mut batcher = LocalBatcher::new(self.state.batcher, selection)
            .with_job_kind(K::NAME)
            .with_failure_channel(failures)
            .with_listener(listener);
        if let Some(progress) = self.progress {
            batcher = batcher.with_listener(Arc::new(progress));
        }
        if self.log_batches {
            batcher = batcher.with_listener(Arc::new(BatchLoggingListener::new()));
        }

        batcher.start(store)
    }

    /// Start the job and wait for it to finish
    pub async fn run(self, store: Arc<dyn RecordStore>) -> Result<JobReport> {
        self.start(store)?.await_completion().await
    }
}

impl<K: JobKind + Default> Default for Job<K> {
    fn default() -> Self {
        Self::new(K::default())
    }
}

/// Object-safe view of a job, for selecting a kind by name at runtime
pub trait ConfigurableJob: Send {
    /// Job kind name
    fn name(&self) -> &'static str;

    /// Sentence describing what the job does
    fn description(&self) -> String;

    /// Property descriptors in listing order
    fn properties(&self) -> Vec<PropertyDescriptor>;

    /// Apply property values; returns validation errors
    fn configure(&mut self, values: &HashMap<String, String>) -> Vec<String>;

    /// Report progress through a tracker
    fn set_progress(&mut self, tracker: ProgressTracker);

    /// Start the job
    fn start(self: Box<Self>, store: Arc<dyn RecordStore>) -> Result<JobTicket>;
}

impl<K: JobKind> ConfigurableJob for Job<K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn description(&self) -> String {
        Job::description(self)
    }

    fn properties(&self) -> Vec<PropertyDescriptor> {
        Job::properties(self)
    }

    fn configure(&mut self, values: &HashMap<String, String>) -> Vec<String> {
        Job::configure(self, values)
    }

    fn set_progress(&mut self, tracker: ProgressTracker) {
        self.progress = Some(tracker);
    }

    fn start(self: Box<Self>, store: Arc<dyn RecordStore>) -> Result<JobTicket> {
        Job::start(*self, store)
    }
}

/// Create a job by kind name
pub fn job_for_name(name: &str) -> Option<Box<dyn ConfigurableJob>> {
    match name {
        ExportToFileJob::NAME => Some(Box::new(Job::new(ExportToFileJob::default()))),
        ExportToZipJob::NAME => Some(Box::new(Job::new(ExportToZipJob::default()))),
        ExportBatchesToDirectoryJob::NAME => {
            Some(Box::new(Job::new(ExportBatchesToDirectoryJob::default())))
        }
        ExportBatchesToZipsJob::NAME => Some(Box::new(Job::new(ExportBatchesToZipsJob::default()))),
        AddCollectionsJob::NAME => Some(Box::new(Job::new(AddCollectionsJob::default()))),
        SetCollectionsJob::NAME => Some(Box::new(Job::new(SetCollectionsJob::default()))),
        RemoveCollectionsJob::NAME => Some(Box::new(Job::new(RemoveCollectionsJob::default()))),
        DeleteCollectionsJob::NAME => Some(Box::new(Job::new(DeleteCollectionsJob::default()))),
        SetPermissionsJob::NAME => Some(Box::new(Job::new(SetPermissionsJob::default()))),
        DeleteJob::NAME => Some(Box::new(Job::new(DeleteJob))),
        _ => None,
    }
}
