//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Datamove configuration file and the configured job properties.

use crate::config::load_config;
use crate::core::job::job_for_name;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Batch Size: {}", config.batcher.batch_size);
        println!("  Thread Count: {}", config.batcher.thread_count);
        if let Some(job_name) = &config.batcher.job_name {
            println!("  Job Name: {job_name}");
        }
        println!(
            "  File Logging: {}",
            if config.logging.local_enabled {
                format!(
                    "{} ({})",
                    config.logging.local_path, config.logging.local_rotation
                )
            } else {
                "disabled".to_string()
            }
        );

        let Some(name) = &config.job.name else {
            println!("  Job: none configured");
            println!();
            return Ok(0);
        };

        let Some(mut job) = job_for_name(name) else {
            println!("❌ Unknown job '{name}'");
            return Ok(2);
        };
        println!("  Job: {name}");

        let errors = job.configure(&config.job_properties());
        println!();
        if errors.is_empty() {
            println!("✅ Job properties are valid");
            println!("   {}", job.description());
            println!();
            Ok(0)
        } else {
            println!("❌ Job property validation failed");
            for error in &errors {
                println!("   - {error}");
            }
            println!();
            Ok(2)
        }
    }
}
