//! Configuration management for Datamove.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Datamove uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `DATAMOVE_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use datamove::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("datamove.toml")?;
//!
//! println!("Batch size: {}", config.batcher.batch_size);
//! if let Some(job) = &config.job.name {
//!     println!("Job: {}", job);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`BatcherSettings`] - Batch size, thread count, job id and name
//! - [`JobConfig`] - Job kind and its raw property values
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [batcher]
//! batch_size = 500
//! thread_count = 8
//!
//! [job]
//! name = "export-batches-to-zips"
//!
//! [job.properties]
//! whereCollections = "orders"
//! exportPath = "${DATAMOVE_EXPORT_DIR}"
//! flattenUri = "true"
//!
//! [logging]
//! local_enabled = true
//! local_path = "logs"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config};
pub use schema::{ApplicationConfig, BatcherSettings, DatamoveConfig, JobConfig, LoggingConfig};
