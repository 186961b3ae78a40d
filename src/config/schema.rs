//! Configuration schema types
//!
//! This module defines the configuration structure for Datamove.

use crate::core::dispatch::batcher::{DEFAULT_BATCH_SIZE, DEFAULT_THREAD_COUNT, MAX_THREAD_COUNT};
use crate::core::dispatch::BatcherConfig;
use crate::core::job::JOB_NAMES;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main Datamove configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatamoveConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Batching and scheduling settings
    #[serde(default)]
    pub batcher: BatcherSettings,

    /// Job selection and properties
    #[serde(default)]
    pub job: JobConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DatamoveConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.batcher.validate()?;
        self.job.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Job properties with the batcher section folded in
    ///
    /// Entries in `[job.properties]` win over the `[batcher]` section.
    pub fn job_properties(&self) -> HashMap<String, String> {
        let mut properties = HashMap::new();
        properties.insert("batchSize".to_string(), self.batcher.batch_size.to_string());
        properties.insert(
            "threadCount".to_string(),
            self.batcher.thread_count.to_string(),
        );
        if let Some(job_id) = &self.batcher.job_id {
            properties.insert("jobId".to_string(), job_id.clone());
        }
        if let Some(job_name) = &self.batcher.job_name {
            properties.insert("jobName".to_string(), job_name.clone());
        }
        properties.extend(self.job.properties.clone());
        properties
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    /// Validates the application section
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Batching settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatcherSettings {
    /// Records per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent workers
    #[serde(default = "default_thread_count")]
    pub thread_count: usize,

    /// Job identifier; a random UUID when unset
    #[serde(default)]
    pub job_id: Option<String>,

    /// Optional job name
    #[serde(default)]
    pub job_name: Option<String>,
}

impl BatcherSettings {
    /// Validates the batcher section
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batcher.batch_size must be greater than 0".to_string());
        }
        if self.thread_count == 0 || self.thread_count > MAX_THREAD_COUNT {
            return Err(format!(
                "batcher.thread_count must be between 1 and {MAX_THREAD_COUNT}"
            ));
        }
        if let Some(job_id) = &self.job_id {
            if job_id.trim().is_empty() {
                return Err("batcher.job_id cannot be empty".to_string());
            }
        }
        Ok(())
    }

    /// Dispatch engine settings
    pub fn to_batcher_config(&self) -> BatcherConfig {
        let defaults = BatcherConfig::default();
        BatcherConfig {
            batch_size: self.batch_size,
            thread_count: self.thread_count,
            job_id: self.job_id.clone().unwrap_or(defaults.job_id),
            job_name: self.job_name.clone(),
        }
    }
}

impl Default for BatcherSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            thread_count: default_thread_count(),
            job_id: None,
            job_name: None,
        }
    }
}

/// Job selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job kind name, one of the names accepted by `job_for_name`
    #[serde(default)]
    pub name: Option<String>,

    /// Raw job property values
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl JobConfig {
    /// Validates the job section
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if !JOB_NAMES.contains(&name.as_str()) {
                return Err(format!(
                    "Invalid job.name '{}'. Must be one of: {}",
                    name,
                    JOB_NAMES.join(", ")
                ));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    /// Validates the logging section
    pub fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_thread_count() -> usize {
    DEFAULT_THREAD_COUNT
}

fn default_true() -> bool {
    true
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
        };
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batcher_settings_validation() {
        let mut settings = BatcherSettings::default();
        assert!(settings.validate().is_ok());

        settings.batch_size = 0;
        assert!(settings.validate().is_err());

        settings.batch_size = 10;
        settings.thread_count = 257;
        assert!(settings.validate().is_err());

        settings.thread_count = 4;
        settings.job_id = Some("  ".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_to_batcher_config_generates_job_id() {
        let settings = BatcherSettings {
            batch_size: 5,
            thread_count: 2,
            job_id: None,
            job_name: Some("nightly".to_string()),
        };
        let config = settings.to_batcher_config();
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.thread_count, 2);
        assert!(!config.job_id.is_empty());
        assert_eq!(config.job_name.as_deref(), Some("nightly"));
    }

    #[test]
    fn test_job_config_validation() {
        let mut job = JobConfig::default();
        assert!(job.validate().is_ok());

        job.name = Some("export-to-zip".to_string());
        assert!(job.validate().is_ok());

        job.name = Some("delete-everything".to_string());
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        for rotation in ["daily", "hourly", "never"] {
            config.local_rotation = rotation.to_string();
            assert!(config.validate().is_ok());
        }
        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_job_properties_override_batcher_section() {
        let mut config = DatamoveConfig::default();
        config.batcher.batch_size = 50;
        config.batcher.job_name = Some("from-batcher".to_string());
        config
            .job
            .properties
            .insert("jobName".to_string(), "from-job".to_string());

        let properties = config.job_properties();
        assert_eq!(properties["batchSize"], "50");
        assert_eq!(properties["threadCount"], "8");
        assert_eq!(properties["jobName"], "from-job");
        assert!(!properties.contains_key("jobId"));
    }
}
