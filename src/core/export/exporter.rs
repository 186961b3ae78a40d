//! Batch exporters
//!
//! One [`BatchExporter`] implementation per output variant. Each turns the
//! records of one batch into output for its [`ExportTarget`]. Shared targets
//! hold an open sink until [`BatchExporter::finish`] closes it.

use super::naming::{entry_name, BatchNaming, ExportTarget};
use super::output::OutputFormat;
use super::sink::{
    write_archive, write_file, ArchiveEntry, RenderedBatch, SharedFileSink, ZipArchiveSink,
};
use crate::domain::{BatchEvent, DatamoveError, Record, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Exports one batch of records to a target
pub trait BatchExporter: Send + Sync {
    /// Where output goes
    fn target(&self) -> &ExportTarget;

    /// Export the records of one batch, in the order given
    fn export_batch(&self, batch: &BatchEvent, records: &[Record]) -> Result<()>;

    /// Release shared resources after the last batch
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// Text written around the records of a flat output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFraming {
    /// Written once before the first record
    pub header: Option<String>,

    /// Written once after the last record
    pub footer: Option<String>,

    /// Written before every record
    pub record_prefix: Option<String>,

    /// Written after every record
    pub record_suffix: Option<String>,
}

/// Render records with per-record prefix and suffix
fn render_records(
    records: &[Record],
    framing: &TextFraming,
    output: OutputFormat,
) -> Result<RenderedBatch> {
    let mut rendered = RenderedBatch::default();
    for record in records {
        if let Some(prefix) = &framing.record_prefix {
            rendered.bytes.extend_from_slice(prefix.as_bytes());
        }
        rendered.bytes.extend_from_slice(&output.render(record)?);
        if let Some(suffix) = framing.record_suffix.as_deref().filter(|s| !s.is_empty()) {
            rendered.bytes.extend_from_slice(suffix.as_bytes());
            rendered.trailing_suffix_len = Some(suffix.len());
        }
    }
    Ok(rendered)
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        DatamoveError::Io(format!("Failed to create directory {}: {e}", dir.display()))
    })
}

/// Options for archive entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipEntryOptions {
    /// Strip path segments from the URI
    pub flatten_uri: bool,

    /// Prepended to the (possibly flattened) URI
    pub uri_prefix: Option<String>,

    /// How record bytes are written
    pub output: OutputFormat,
}

impl ZipEntryOptions {
    fn entries(&self, records: &[Record]) -> Result<Vec<ArchiveEntry>> {
        records
            .iter()
            .map(|record| {
                Ok(ArchiveEntry {
                    name: entry_name(&record.uri, self.flatten_uri, self.uri_prefix.as_deref()),
                    content: self.output.render(record)?.into_owned(),
                })
            })
            .collect()
    }
}

/// Options for per-batch files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFileOptions {
    /// File naming rule
    pub naming: BatchNaming,

    /// Header, footer and record framing for each file
    pub framing: TextFraming,

    /// How record bytes are written
    pub output: OutputFormat,
}

impl Default for BatchFileOptions {
    fn default() -> Self {
        Self {
            naming: BatchNaming::plain(),
            framing: TextFraming::default(),
            output: OutputFormat::Raw,
        }
    }
}

/// Writes each batch to its own file in a directory
#[derive(Debug)]
pub struct DirectoryExporter {
    target: ExportTarget,
    options: BatchFileOptions,
}

impl DirectoryExporter {
    /// Create the exporter and its output directory
    pub fn new(dir: impl Into<PathBuf>, options: BatchFileOptions) -> Result<Self> {
        let dir = dir.into();
        create_dir(&dir)?;
        Ok(Self {
            target: ExportTarget::BatchFiles {
                dir,
                naming: options.naming.clone(),
            },
            options,
        })
    }
}

impl BatchExporter for DirectoryExporter {
    fn target(&self) -> &ExportTarget {
        &self.target
    }

    fn export_batch(&self, batch: &BatchEvent, records: &[Record]) -> Result<()> {
        let framing = &self.options.framing;
        let body = render_records(records, framing, self.options.output)?;

        let mut bytes = Vec::with_capacity(body.bytes.len() + 64);
        if let Some(header) = &framing.header {
            bytes.extend_from_slice(header.as_bytes());
        }
        bytes.extend_from_slice(&body.bytes);
        if let Some(footer) = &framing.footer {
            bytes.extend_from_slice(footer.as_bytes());
        }

        let path = self.target.resolve(batch.job_batch_number);
        write_file(&path, &bytes)?;
        tracing::debug!(
            batch_number = batch.job_batch_number,
            records = records.len(),
            path = %path.display(),
            "Wrote batch file"
        );
        Ok(())
    }
}

/// Writes each batch to its own archive in a directory
#[derive(Debug)]
pub struct BatchZipsExporter {
    target: ExportTarget,
    entries: ZipEntryOptions,
}

impl BatchZipsExporter {
    /// Create the exporter and its output directory
    pub fn new(dir: impl Into<PathBuf>, naming: BatchNaming, entries: ZipEntryOptions) -> Result<Self> {
        let dir = dir.into();
        create_dir(&dir)?;
        Ok(Self {
            target: ExportTarget::BatchArchives { dir, naming },
            entries,
        })
    }
}

impl BatchExporter for BatchZipsExporter {
    fn target(&self) -> &ExportTarget {
        &self.target
    }

    fn export_batch(&self, batch: &BatchEvent, records: &[Record]) -> Result<()> {
        let entries = self.entries.entries(records)?;
        let path = self.target.resolve(batch.job_batch_number);
        write_archive(&path, &entries)?;
        tracing::debug!(
            batch_number = batch.job_batch_number,
            entries = entries.len(),
            path = %path.display(),
            "Wrote batch archive"
        );
        Ok(())
    }
}

/// Writes every batch into one archive
pub struct ZipFileExporter {
    target: ExportTarget,
    entries: ZipEntryOptions,
    sink: ZipArchiveSink,
}

impl ZipFileExporter {
    /// Create the archive
    pub fn create(path: impl Into<PathBuf>, entries: ZipEntryOptions, create_new: bool) -> Result<Self> {
        let path = path.into();
        let sink = ZipArchiveSink::create(&path, create_new)?;
        Ok(Self {
            target: ExportTarget::SharedArchive { path },
            entries,
            sink,
        })
    }

    /// Number of entries written so far
    pub fn entry_count(&self) -> usize {
        self.sink.entry_count()
    }
}

impl BatchExporter for ZipFileExporter {
    fn target(&self) -> &ExportTarget {
        &self.target
    }

    fn export_batch(&self, batch: &BatchEvent, records: &[Record]) -> Result<()> {
        // Rendering happens outside the archive lock
        let entries = self.entries.entries(records)?;
        self.sink.write_entries(&entries)?;
        tracing::debug!(
            batch_number = batch.job_batch_number,
            entries = entries.len(),
            "Added batch to archive"
        );
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        self.sink.close()
    }
}

/// Options for the single shared file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFileOptions {
    /// Header, footer and record framing
    pub framing: TextFraming,

    /// Replace the very last record suffix when the job finishes
    pub omit_last_record_suffix: bool,

    /// Fail if the file already exists
    pub create_new: bool,

    /// How record bytes are written
    pub output: OutputFormat,
}

impl Default for SharedFileOptions {
    fn default() -> Self {
        Self {
            framing: TextFraming::default(),
            omit_last_record_suffix: false,
            create_new: false,
            output: OutputFormat::XmlWithoutDeclaration,
        }
    }
}

/// Appends every batch to one file
pub struct FileExporter {
    target: ExportTarget,
    options: SharedFileOptions,
    sink: SharedFileSink,
}

impl FileExporter {
    /// Open the file and write the header
    pub fn open(path: impl Into<PathBuf>, options: SharedFileOptions) -> Result<Self> {
        let path = path.into();
        let sink = SharedFileSink::open(
            &path,
            options.framing.header.as_deref(),
            options.create_new,
        )?;
        Ok(Self {
            target: ExportTarget::SharedFile { path },
            options,
            sink,
        })
    }
}

impl BatchExporter for FileExporter {
    fn target(&self) -> &ExportTarget {
        &self.target
    }

    fn export_batch(&self, batch: &BatchEvent, records: &[Record]) -> Result<()> {
        let rendered = render_records(records, &self.options.framing, self.options.output)?;
        self.sink.append(&rendered)?;
        tracing::debug!(
            batch_number = batch.job_batch_number,
            records = records.len(),
            "Appended batch to file"
        );
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        self.sink.close(
            self.options.framing.footer.as_deref(),
            self.options.omit_last_record_suffix,
        )
    }
}
