//! Core business logic for Datamove.
//!
//! # Modules
//!
//! - [`dispatch`] - Batch listener contracts, failure channel and the local dispatch engine
//! - [`progress`] - Monotonic progress tracking and per-batch logging
//! - [`export`] - Exporters writing batches to files and zip archives
//! - [`mutate`] - Listeners changing collections, permissions or existence of records
//! - [`job`] - Property-configured export and mutation jobs
//!
//! # Job Workflow
//!
//! 1. **Configure**: Apply job properties (selection, batching, output)
//! 2. **Resolve**: The record store turns the selection into an ordered URI list
//! 3. **Dispatch**: URIs are chunked into numbered batches and delivered concurrently
//! 4. **Process**: Each batch is exported or mutated; failures are isolated per batch
//! 5. **Finish**: Shared outputs are closed and a [`dispatch::JobReport`] is produced
//!
//! # Example
//!
//! ```rust,no_run
//! use datamove::adapters::store::DirectoryStore;
//! use datamove::core::job::{ExportToZipJob, Job};
//! use datamove::core::progress::ProgressTracker;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(DirectoryStore::open("./data")?);
//!
//! let mut job = Job::new(ExportToZipJob::default())
//!     .with_progress(ProgressTracker::new(0).on_progress(|snapshot| {
//!         println!("{}", snapshot.progress_text());
//!         Ok(())
//!     }));
//!
//! let properties = HashMap::from([
//!     ("whereCollections".to_string(), "orders".to_string()),
//!     ("exportPath".to_string(), "./orders.zip".to_string()),
//! ]);
//! let errors = job.configure(&properties);
//! assert!(errors.is_empty());
//!
//! let report = job.run(store).await?;
//! println!("Exported {} records", report.results_dispatched);
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod export;
pub mod job;
pub mod mutate;
pub mod progress;
