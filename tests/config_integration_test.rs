//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX` to avoid
//! interference between tests.

use datamove::config::load_config;
use datamove::core::job::job_for_name;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("DATAMOVE_APPLICATION_LOG_LEVEL");
    std::env::remove_var("DATAMOVE_BATCHER_BATCH_SIZE");
    std::env::remove_var("DATAMOVE_BATCHER_THREAD_COUNT");
    std::env::remove_var("DATAMOVE_JOB_NAME");
    std::env::remove_var("TEST_DATAMOVE_EXPORT_DIR");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let file = write_config(
        r#"
[application]
log_level = "debug"

[batcher]
batch_size = 500
thread_count = 16
job_id = "nightly-orders"
job_name = "Nightly orders"

[job]
name = "export-to-file"

[job.properties]
whereCollections = "orders"
exportPath = "/tmp/orders.xml"
fileHeader = "<orders>"
fileFooter = "</orders>"

[logging]
local_enabled = false
local_path = "/tmp/datamove"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.batcher.batch_size, 500);
    assert_eq!(config.batcher.thread_count, 16);
    assert_eq!(config.batcher.job_id.as_deref(), Some("nightly-orders"));
    assert_eq!(config.logging.local_rotation, "hourly");

    let mut job = job_for_name(config.job.name.as_deref().unwrap()).unwrap();
    let errors = job.configure(&config.job_properties());
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        job.description(),
        "Exporting documents in collections [\"orders\"] to file at: /tmp/orders.xml"
    );
}

#[test]
fn test_env_substitution_and_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_DATAMOVE_EXPORT_DIR", "/srv/exports");
    std::env::set_var("DATAMOVE_BATCHER_THREAD_COUNT", "2");
    std::env::set_var("DATAMOVE_JOB_NAME", "export-batches-to-directory");

    let file = write_config(
        r#"
# exportPath = "${NOT_SET_BUT_COMMENTED}"
[job]
name = "export-to-zip"

[job.properties]
exportPath = "${TEST_DATAMOVE_EXPORT_DIR}"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.job.properties["exportPath"], "/srv/exports");
    assert_eq!(config.batcher.thread_count, 2);
    assert_eq!(config.job.name.as_deref(), Some("export-batches-to-directory"));

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_fails() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let file = write_config("[job.properties]\nexportPath = \"${TEST_DATAMOVE_EXPORT_DIR}\"\n");

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_DATAMOVE_EXPORT_DIR"));
}

#[test]
fn test_invalid_override_fails() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("DATAMOVE_BATCHER_BATCH_SIZE", "lots");

    let file = write_config("");
    let result = load_config(file.path());
    cleanup_env_vars();

    assert!(result.is_err());
}

#[test]
fn test_invalid_rotation_fails() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let file = write_config("[logging]\nlocal_rotation = \"size\"\n");

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("local_rotation"));
}
