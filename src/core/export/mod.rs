//! Batch export pipeline
//!
//! This module turns batches of records into durable output:
//! - Naming of per-batch files, archives and archive entries
//! - Record rendering (raw, pretty JSON, XML with or without declaration)
//! - Shared sinks for the single-file and single-archive targets
//! - Exporters for each target and the listener that isolates batch failures
//! - A listener handing records to caller-supplied consumers

pub mod consumer;
pub mod exporter;
pub mod listener;
pub mod naming;
pub mod output;
pub mod sink;

pub use consumer::{RecordConsumer, RecordConsumersListener};
pub use exporter::{
    BatchExporter, BatchFileOptions, BatchZipsExporter, DirectoryExporter, FileExporter,
    SharedFileOptions, TextFraming, ZipEntryOptions, ZipFileExporter,
};
pub use listener::ExportBatchesListener;
pub use naming::{entry_name, flatten_uri, BatchNaming, ExportTarget};
pub use output::OutputFormat;
pub use sink::{ArchiveEntry, SharedFileSink, SinkWriter, ZipArchiveSink};
