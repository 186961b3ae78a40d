//! Record sinks
//!
//! Shared sinks are opened once at job setup, written by many workers under a
//! mutex, and closed exactly once at job teardown. Per-batch outputs are
//! written in one call and need no cross-batch synchronization.

use crate::domain::{DatamoveError, Result};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A named archive entry ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name inside the archive
    pub name: String,

    /// Entry content
    pub content: Vec<u8>,
}

/// A rendered batch for a flat output stream
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RenderedBatch {
    /// Bytes to append
    pub bytes: Vec<u8>,

    /// Length of the record suffix ending `bytes`, when one was written
    pub trailing_suffix_len: Option<usize>,
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                DatamoveError::Io(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    Ok(())
}

fn open_output(path: &Path, create_new: bool) -> Result<File> {
    ensure_parent_dir(path)?;
    let mut options = OpenOptions::new();
    options.write(true);
    if create_new {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }
    options.open(path).map_err(|e| {
        DatamoveError::Io(format!("Failed to open {}: {e}", path.display()))
    })
}

/// Seekable destination of a shared file
pub trait SinkWriter: Write + Seek + Send {}

impl<T: Write + Seek + Send> SinkWriter for T {}

struct FileState {
    writer: Box<dyn SinkWriter>,
    position: u64,
    last_suffix: Option<(u64, usize)>,
    write_failed: bool,
}

/// Single output file shared by every batch of a job
pub struct SharedFileSink {
    path: PathBuf,
    state: Mutex<Option<FileState>>,
}

impl SharedFileSink {
    /// Open the file and write the header
    ///
    /// With `create_new`, an existing file is an error; otherwise it is truncated.
    pub fn open(path: impl Into<PathBuf>, header: Option<&str>, create_new: bool) -> Result<Self> {
        let path = path.into();
        let file = open_output(&path, create_new)?;
        let sink = Self::with_writer(path, Box::new(BufWriter::new(file)), header)?;
        tracing::debug!(path = %sink.path.display(), "Opened shared export file");
        Ok(sink)
    }

    /// Wrap an already opened writer and write the header
    pub fn with_writer(
        path: impl Into<PathBuf>,
        mut writer: Box<dyn SinkWriter>,
        header: Option<&str>,
    ) -> Result<Self> {
        let mut position = 0u64;
        if let Some(header) = header {
            writer.write_all(header.as_bytes())?;
            position = header.len() as u64;
        }
        Ok(Self {
            path: path.into(),
            state: Mutex::new(Some(FileState {
                writer,
                position,
                last_suffix: None,
                write_failed: false,
            })),
        })
    }

    /// Output path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one batch as a single uninterrupted write
    ///
    /// After a failed write the file length is unknown, so every later append
    /// fails and closing appends the footer without replacing a suffix.
    pub fn append(&self, batch: &RenderedBatch) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| DatamoveError::poisoned("shared file"))?;
        let state = guard.as_mut().ok_or_else(|| {
            DatamoveError::Export(format!("{} is already closed", self.path.display()))
        })?;
        if state.write_failed {
            return Err(DatamoveError::Export(format!(
                "{} is unusable after an earlier write failed",
                self.path.display()
            )));
        }

        if let Err(e) = state.writer.write_all(&batch.bytes) {
            state.write_failed = true;
            state.last_suffix = None;
            return Err(DatamoveError::Io(format!(
                "Failed to write to {}: {e}",
                self.path.display()
            )));
        }
        let end = state.position + batch.bytes.len() as u64;
        if let Some(len) = batch.trailing_suffix_len {
            state.last_suffix = Some((end - len as u64, len));
        }
        state.position = end;
        Ok(())
    }

    /// Write the footer and close the file
    ///
    /// With `omit_last_suffix`, the last record suffix written is replaced:
    /// the footer is written from the suffix's offset, and suffix bytes the
    /// footer does not cover become spaces. Closing twice is a no-op.
    pub fn close(&self, footer: Option<&str>, omit_last_suffix: bool) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| DatamoveError::poisoned("shared file"))?;
        let Some(mut state) = guard.take() else {
            return Ok(());
        };

        let footer = footer.unwrap_or("");
        match state.last_suffix.filter(|_| omit_last_suffix) {
            Some((offset, len)) => {
                state.writer.seek(SeekFrom::Start(offset))?;
                state.writer.write_all(footer.as_bytes())?;
                if footer.len() < len {
                    state
                        .writer
                        .write_all(" ".repeat(len - footer.len()).as_bytes())?;
                }
            }
            None => state.writer.write_all(footer.as_bytes())?,
        }

        state.writer.flush()?;
        if state.write_failed {
            tracing::warn!(path = %self.path.display(), "Closed shared export file after a failed write");
        } else {
            tracing::debug!(path = %self.path.display(), "Closed shared export file");
        }
        Ok(())
    }

    /// Whether the sink has been closed
    pub fn is_closed(&self) -> bool {
        self.state.lock().map(|s| s.is_none()).unwrap_or(true)
    }
}

struct ArchiveState {
    writer: ZipWriter<BufWriter<File>>,
    entry_names: HashSet<String>,
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn reject_duplicates<'a>(
    entries: &'a [ArchiveEntry],
    existing: &HashSet<String>,
    archive: &Path,
) -> Result<()> {
    let mut seen: HashSet<&'a str> = HashSet::with_capacity(entries.len());
    for entry in entries {
        if existing.contains(&entry.name) || !seen.insert(entry.name.as_str()) {
            return Err(DatamoveError::Archive(format!(
                "duplicate entry {} in {}",
                entry.name,
                archive.display()
            )));
        }
    }
    Ok(())
}

/// Single archive shared by every batch of a job
pub struct ZipArchiveSink {
    path: PathBuf,
    state: Mutex<Option<ArchiveState>>,
}

impl ZipArchiveSink {
    /// Create the archive
    pub fn create(path: impl Into<PathBuf>, create_new: bool) -> Result<Self> {
        let path = path.into();
        let file = open_output(&path, create_new)?;
        tracing::debug!(path = %path.display(), "Opened shared export archive");
        Ok(Self {
            path,
            state: Mutex::new(Some(ArchiveState {
                writer: ZipWriter::new(BufWriter::new(file)),
                entry_names: HashSet::new(),
            })),
        })
    }

    /// Output path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a batch of entries
    ///
    /// The whole batch is written under one lock so entries of concurrent
    /// batches never interleave. A name already present in the archive, or
    /// repeated within the batch, fails the batch before anything is written.
    pub fn write_entries(&self, entries: &[ArchiveEntry]) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| DatamoveError::poisoned("shared archive"))?;
        let state = guard.as_mut().ok_or_else(|| {
            DatamoveError::Export(format!("{} is already closed", self.path.display()))
        })?;

        reject_duplicates(entries, &state.entry_names, &self.path)?;
        for entry in entries {
            state.writer.start_file(entry.name.as_str(), entry_options())?;
            state.writer.write_all(&entry.content)?;
            state.entry_names.insert(entry.name.clone());
        }
        Ok(())
    }

    /// Number of entries written so far
    pub fn entry_count(&self) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.entry_names.len()))
            .unwrap_or(0)
    }

    /// Write the central directory and close the archive; closing twice is a no-op
    pub fn close(&self) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| DatamoveError::poisoned("shared archive"))?;
        let Some(state) = guard.take() else {
            return Ok(());
        };

        let mut inner = state.writer.finish()?;
        inner.flush()?;
        tracing::debug!(
            path = %self.path.display(),
            entries = state.entry_names.len(),
            "Closed shared export archive"
        );
        Ok(())
    }
}

/// Write a complete file in one call
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(open_output(path, false)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

/// Write a complete archive in one call
pub fn write_archive(path: &Path, entries: &[ArchiveEntry]) -> Result<()> {
    reject_duplicates(entries, &HashSet::new(), path)?;
    let mut writer = ZipWriter::new(BufWriter::new(open_output(path, false)?));
    for entry in entries {
        writer.start_file(entry.name.as_str(), entry_options())?;
        writer.write_all(&entry.content)?;
    }
    writer.finish()?.flush()?;
    Ok(())
}
