//! Run command implementation
//!
//! This module implements the `run` command, which configures a job from the
//! configuration file and command-line properties and runs it against a
//! directory of records.

use crate::adapters::store::{DirectoryStore, RecordStore};
use crate::config::load_config;
use crate::core::job::job_for_name;
use crate::core::progress::ProgressTracker;
use crate::domain::DatamoveError;
use clap::Args;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory holding the records to export
    #[arg(short, long)]
    pub source: PathBuf,

    /// Job to run; overrides job.name from the configuration file
    #[arg(short, long)]
    pub job: Option<String>,

    /// Job property as key=value; may be repeated and overrides the configuration file
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Do not print progress snapshots
    #[arg(long)]
    pub quiet: bool,
}

/// Exit code for a configuration error
const EXIT_CONFIG: i32 = 2;

/// Exit code for a fatal error
const EXIT_FATAL: i32 = 5;

/// Split `key=value` arguments into a property map
pub fn parse_properties(pairs: &[String]) -> Result<HashMap<String, String>, String> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(format!("Invalid property '{pair}': expected KEY=VALUE")),
        })
        .collect()
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let Some(job_name) = self.job.clone().or_else(|| config.job.name.clone()) else {
            eprintln!("No job selected: pass --job or set job.name in {config_path}");
            return Ok(EXIT_CONFIG);
        };

        let Some(mut job) = job_for_name(&job_name) else {
            eprintln!("Unknown job '{job_name}'");
            return Ok(EXIT_CONFIG);
        };

        let mut properties = config.job_properties();
        match parse_properties(&self.properties) {
            Ok(overrides) => properties.extend(overrides),
            Err(e) => {
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        }

        let errors = job.configure(&properties);
        if !errors.is_empty() {
            tracing::error!(job = %job_name, errors = errors.len(), "Job configuration failed");
            eprintln!("Job configuration failed:");
            for error in &errors {
                eprintln!("  - {error}");
            }
            return Ok(EXIT_CONFIG);
        }

        if !self.quiet {
            job.set_progress(ProgressTracker::new(0).on_progress(|snapshot| {
                println!("{}", snapshot.progress_text());
                Ok(())
            }));
        }

        let store: Arc<dyn RecordStore> = match DirectoryStore::open(&self.source) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                eprintln!("Unable to open source directory: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("🚀 {}", job.description());
        println!();

        let ticket = match job.start(store) {
            Ok(ticket) => ticket,
            Err(e @ (DatamoveError::Configuration(_) | DatamoveError::Validation(_))) => {
                eprintln!("Unable to start job: {e}");
                return Ok(EXIT_CONFIG);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start job");
                eprintln!("Unable to start job: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let stop = ticket.stop_handle();
        let mut shutdown = shutdown_signal;
        let watcher = tokio::spawn(async move {
            while shutdown.changed().await.is_ok() {
                if *shutdown.borrow() {
                    let _ = stop.send(true);
                    break;
                }
            }
        });

        let result = ticket.await_completion().await;
        watcher.abort();

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Job failed");
                eprintln!("Job failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        println!();
        println!("📊 Job Summary:");
        println!("  Job ID: {}", report.job_id);
        println!("  Results: {}", report.results_dispatched);
        println!("  Batches: {}", report.batches_total);
        println!("  Succeeded: {}", report.batches_succeeded);
        println!("  Failed: {}", report.batches_failed);
        println!("  Duration: {:.2}s", report.duration.as_secs_f64());
        println!("  Success Rate: {:.2}%", report.success_rate());
        println!();

        if !report.failures.is_empty() {
            println!("⚠️  Failed batches:");
            for (i, failure) in report.failures.iter().enumerate() {
                if i < 10 {
                    println!("  - batch {}: {}", failure.batch_number, failure.message);
                }
            }
            if report.failures.len() > 10 {
                println!("  ... and {} more failures", report.failures.len() - 10);
            }
            println!();
        }
        for error in &report.finish_errors {
            println!("⚠️  {error}");
        }

        let exit_code = if report.stopped {
            println!("⚠️  Job stopped before every batch was dispatched.");
            tracing::info!("Job stopped by user signal");
            130
        } else if report.is_successful() {
            println!("✅ Job completed successfully!");
            0
        } else {
            println!("⚠️  Job completed with failures");
            1
        };

        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_properties() {
        let parsed = parse_properties(&[
            "exportPath=/tmp/out".to_string(),
            "transform=redact,field,a=b".to_string(),
            "fileFooter=".to_string(),
        ])
        .unwrap();
        assert_eq!(parsed["exportPath"], "/tmp/out");
        assert_eq!(parsed["transform"], "redact,field,a=b");
        assert_eq!(parsed["fileFooter"], "");
    }

    #[test]
    fn test_parse_properties_rejects_missing_separator() {
        assert!(parse_properties(&["exportPath".to_string()]).is_err());
        assert!(parse_properties(&["=value".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_missing_config_is_configuration_error() {
        let args = RunArgs {
            source: PathBuf::from("."),
            job: Some("export-to-zip".to_string()),
            properties: vec![],
            quiet: true,
        };
        let (_tx, rx) = watch::channel(false);
        let code = args.execute("does-not-exist.toml", rx).await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
