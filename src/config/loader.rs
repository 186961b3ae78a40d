//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::DatamoveConfig;
use crate::domain::errors::DatamoveError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DatamoveConfig
/// 4. Applies environment variable overrides (DATAMOVE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use datamove::config::loader::load_config;
///
/// let config = load_config("datamove.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DatamoveConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DatamoveError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        DatamoveError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Applies the same substitution, overrides and validation as [`load_config`].
pub fn parse_config(contents: &str) -> Result<DatamoveConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: DatamoveConfig = toml::from_str(&contents)
        .map_err(|e| DatamoveError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        DatamoveError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| DatamoveError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(DatamoveError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    let mut result = lines.join("\n");
    if input.ends_with('\n') {
        result.push('\n');
    }
    Ok(result)
}

/// Applies environment variable overrides using DATAMOVE_* prefix
///
/// Environment variables follow the pattern: DATAMOVE_<SECTION>_<KEY>
/// For example: DATAMOVE_BATCHER_THREAD_COUNT, DATAMOVE_JOB_NAME
fn apply_env_overrides(config: &mut DatamoveConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("DATAMOVE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Batcher overrides
    if let Ok(val) = std::env::var("DATAMOVE_BATCHER_BATCH_SIZE") {
        config.batcher.batch_size = parse_override("DATAMOVE_BATCHER_BATCH_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("DATAMOVE_BATCHER_THREAD_COUNT") {
        config.batcher.thread_count = parse_override("DATAMOVE_BATCHER_THREAD_COUNT", &val)?;
    }
    if let Ok(val) = std::env::var("DATAMOVE_BATCHER_JOB_ID") {
        config.batcher.job_id = Some(val);
    }
    if let Ok(val) = std::env::var("DATAMOVE_BATCHER_JOB_NAME") {
        config.batcher.job_name = Some(val);
    }

    // Job overrides
    if let Ok(val) = std::env::var("DATAMOVE_JOB_NAME") {
        config.job.name = Some(val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("DATAMOVE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("DATAMOVE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("DATAMOVE_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

fn parse_override(name: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        DatamoveError::Configuration(format!("{name} must be a positive integer, got '{value}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("DATAMOVE_TEST_EXPORT_DIR", "/srv/out");
        let input = "exportPath = \"${DATAMOVE_TEST_EXPORT_DIR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "exportPath = \"/srv/out\"");
        std::env::remove_var("DATAMOVE_TEST_EXPORT_DIR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("DATAMOVE_TEST_MISSING_VAR");
        let input = "exportPath = \"${DATAMOVE_TEST_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("DATAMOVE_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("DATAMOVE_TEST_COMMENTED_VAR");
        let input = "# exportPath = \"${DATAMOVE_TEST_COMMENTED_VAR}\"\nname = \"x\"\n";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[batcher]
batch_size = 250
thread_count = 4
job_name = "nightly"

[job]
name = "export-batches-to-zips"

[job.properties]
whereCollections = "orders,invoices"
exportPath = "/tmp/exports"
flattenUri = "true"

[logging]
local_enabled = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.batcher.batch_size, 250);
        assert_eq!(config.batcher.thread_count, 4);
        assert_eq!(config.job.name.as_deref(), Some("export-batches-to-zips"));
        assert_eq!(config.job.properties["flattenUri"], "true");
        assert!(!config.logging.local_enabled);
    }

    #[test]
    fn test_parse_config_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.batcher.batch_size, 100);
        assert_eq!(config.batcher.thread_count, 8);
        assert!(config.job.name.is_none());
        assert_eq!(config.logging.local_rotation, "daily");
    }

    #[test]
    fn test_parse_config_rejects_invalid_values() {
        let err = parse_config("[batcher]\nthread_count = 0\n").unwrap_err();
        assert!(err.to_string().contains("thread_count"));

        let err = parse_config("[job]\nname = \"unknown\"\n").unwrap_err();
        assert!(err.to_string().contains("job.name"));
    }
}
