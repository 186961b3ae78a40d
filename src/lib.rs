// Datamove - Batch Record Export Tool
// Copyright (c) 2025 Datamove Contributors
// Licensed under the MIT License

//! # Datamove - Batch Record Export
//!
//! Datamove moves the records selected from a record store into files and
//! zip archives, batch by batch, on a bounded pool of workers.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Dispatching** selected records as numbered batches to concurrent listeners
//! - **Tracking** progress as a monotonic stream of snapshots
//! - **Exporting** batches to a shared file, per-batch files, per-batch archives or a shared archive
//! - **Configuring** jobs through named, described string properties
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (dispatch, progress, export, jobs)
//! - [`adapters`] - Record stores (directory and in-memory)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datamove::adapters::store::DirectoryStore;
//! use datamove::core::job::{ExportBatchesToDirectoryJob, Job};
//! use datamove::domain::Selection;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(DirectoryStore::open("./records")?);
//!
//!     let mut kind = ExportBatchesToDirectoryJob::default();
//!     kind.export_path = Some("./out".into());
//!
//!     let report = Job::new(kind)
//!         .with_selection(Selection::Collections(vec!["orders".to_string()]))
//!         .run(store)
//!         .await?;
//!
//!     println!("Exported {} records in {} batches", report.results_dispatched, report.batches_total);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Isolation
//!
//! A batch that cannot be fetched or written is reported once on the job's
//! failure channel and the job carries on with the remaining batches:
//!
//! ```rust,no_run
//! use datamove::core::job::{ExportToZipJob, Job};
//!
//! let job = Job::new(ExportToZipJob::default()).on_failure(|batch, error| {
//!     eprintln!("batch {} failed: {}", batch.job_batch_number, error);
//!     Ok(())
//! });
//! ```
//!
//! ## Error Handling
//!
//! Datamove uses the [`domain::DatamoveError`] type for all errors:
//!
//! ```rust,no_run
//! use datamove::domain::DatamoveError;
//!
//! fn example() -> Result<(), DatamoveError> {
//!     let config = datamove::config::load_config("datamove.toml")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Datamove uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!("Starting job");
//! warn!(batch_number = 7, "Unable to export batch");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
