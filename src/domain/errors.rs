//! Domain error types
//!
//! This module defines the error hierarchy for Datamove. Errors are
//! domain-specific and don't expose third-party types in their variants.

use thiserror::Error;

/// Main Datamove error type
///
/// This is the primary error type used throughout the library. Configuration
/// and validation errors are raised before a job starts; export, fetch,
/// mutation and archive errors are attributed to a single batch.
#[derive(Debug, Error)]
pub enum DatamoveError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Record retrieval errors
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Archive writer errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Batch dispatch errors
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Record update or delete errors
    #[error("Mutation error: {0}")]
    Mutation(String),

    /// Operation the record store cannot perform
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl DatamoveError {
    /// Error for a mutex or rwlock poisoned by a panicking holder
    pub fn poisoned(what: &str) -> Self {
        DatamoveError::Export(format!("{what} lock was poisoned by a panicking writer"))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for DatamoveError {
    fn from(err: std::io::Error) -> Self {
        DatamoveError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DatamoveError {
    fn from(err: serde_json::Error) -> Self {
        DatamoveError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DatamoveError {
    fn from(err: toml::de::Error) -> Self {
        DatamoveError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from zip writer/reader errors
impl From<zip::result::ZipError> for DatamoveError {
    fn from(err: zip::result::ZipError) -> Self {
        DatamoveError::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datamove_error_display() {
        let err = DatamoveError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: DatamoveError = io_err.into();
        assert!(matches!(err, DatamoveError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: DatamoveError = json_err.into();
        assert!(matches!(err, DatamoveError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: DatamoveError = toml_err.into();
        assert!(matches!(err, DatamoveError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_zip_error_conversion() {
        let zip_err = zip::result::ZipError::FileNotFound;
        let err: DatamoveError = zip_err.into();
        assert!(matches!(err, DatamoveError::Archive(_)));
    }

    #[test]
    fn test_poisoned_error() {
        let err = DatamoveError::poisoned("zip writer");
        assert!(err.to_string().contains("zip writer lock was poisoned"));
    }

    #[test]
    fn test_datamove_error_implements_std_error() {
        let err = DatamoveError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
