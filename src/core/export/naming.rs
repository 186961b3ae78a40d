//! Output naming
//!
//! Per-batch outputs are named `prefix + batch number + extension`. Archive
//! entries are named after the record URI, optionally flattened to its last
//! path segment and optionally prefixed.

use std::path::{Path, PathBuf};

/// Default file name prefix for per-batch outputs
pub const DEFAULT_FILENAME_PREFIX: &str = "batch-";

/// Default extension for per-batch archives
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Name derivation for per-batch outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchNaming {
    /// Text before the batch number
    pub prefix: String,

    /// Text after the batch number, including any leading dot
    pub extension: String,
}

impl BatchNaming {
    /// Create a naming rule
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    /// Defaults for per-batch files: `batch-<n>`
    pub fn plain() -> Self {
        Self::new(DEFAULT_FILENAME_PREFIX, "")
    }

    /// Defaults for per-batch archives: `batch-<n>.zip`
    pub fn archive() -> Self {
        Self::new(DEFAULT_FILENAME_PREFIX, ARCHIVE_EXTENSION)
    }

    /// File name for a batch
    ///
    /// ```
    /// use datamove::core::export::BatchNaming;
    ///
    /// assert_eq!(BatchNaming::archive().file_name(7), "batch-7.zip");
    /// ```
    pub fn file_name(&self, batch_number: u64) -> String {
        format!("{}{}{}", self.prefix, batch_number, self.extension)
    }
}

/// Strip every path segment up to and including the last `/`
pub fn flatten_uri(uri: &str) -> &str {
    match uri.rfind('/') {
        Some(index) => &uri[index + 1..],
        None => uri,
    }
}

/// Archive entry name for a record URI
pub fn entry_name(uri: &str, flatten: bool, prefix: Option<&str>) -> String {
    let name = if flatten { flatten_uri(uri) } else { uri };
    match prefix {
        Some(prefix) => format!("{prefix}{name}"),
        None => name.to_string(),
    }
}

/// Where a job writes its output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// One file shared by every batch
    SharedFile {
        /// Output file
        path: PathBuf,
    },

    /// One file per batch in a directory
    BatchFiles {
        /// Output directory
        dir: PathBuf,
        /// File naming rule
        naming: BatchNaming,
    },

    /// One archive per batch in a directory
    BatchArchives {
        /// Output directory
        dir: PathBuf,
        /// Archive naming rule
        naming: BatchNaming,
    },

    /// One archive shared by every batch
    SharedArchive {
        /// Output archive
        path: PathBuf,
    },
}

impl ExportTarget {
    /// Path written for a batch
    pub fn resolve(&self, batch_number: u64) -> PathBuf {
        match self {
            ExportTarget::SharedFile { path } | ExportTarget::SharedArchive { path } => {
                path.clone()
            }
            ExportTarget::BatchFiles { dir, naming } | ExportTarget::BatchArchives { dir, naming } => {
                dir.join(naming.file_name(batch_number))
            }
        }
    }

    /// File or directory the target is rooted at
    pub fn location(&self) -> &Path {
        match self {
            ExportTarget::SharedFile { path } | ExportTarget::SharedArchive { path } => path,
            ExportTarget::BatchFiles { dir, .. } | ExportTarget::BatchArchives { dir, .. } => dir,
        }
    }

    /// Whether every batch writes to the same output
    pub fn is_shared(&self) -> bool {
        matches!(
            self,
            ExportTarget::SharedFile { .. } | ExportTarget::SharedArchive { .. }
        )
    }
}
