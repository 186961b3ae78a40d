//! Export job kinds
//!
//! Each kind registers its own properties and builds the listener that
//! processes its batches. The listener is built when the job starts, after
//! every property has been applied.

use super::property::{parse_bool, JobPropertyRegistry};
use super::runner::JobState;
use crate::core::dispatch::{BatchListener, FailureChannel};
use crate::core::export::{
    BatchExporter, BatchFileOptions, BatchNaming, BatchZipsExporter, DirectoryExporter,
    ExportBatchesListener, FileExporter, OutputFormat, RecordConsumer, RecordConsumersListener,
    SharedFileOptions, ZipEntryOptions, ZipFileExporter,
};
use crate::domain::{DatamoveError, Record, Result, Selection, ServerTransform};
use std::path::PathBuf;
use std::sync::Arc;

/// Behavior specific to one kind of job
pub trait JobKind: Send + Sync + Sized + 'static {
    /// Name the kind is selected by
    const NAME: &'static str;

    /// Whether `whereUris`, `whereCollections` and `whereUriPattern` are registered
    const WHERE_PROPERTIES: bool = true;

    /// Sentence describing what the job does
    fn description(&self, selection: &str) -> String;

    /// Register the kind's properties after the common ones
    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>);

    /// Build the batch listener; called once when the job starts
    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>>;

    /// Selection used when no where property was set
    fn default_selection(&self) -> Option<Selection> {
        None
    }
}

fn required_path(path: &Option<PathBuf>) -> Result<PathBuf> {
    path.clone()
        .ok_or_else(|| DatamoveError::Configuration("exportPath is required".to_string()))
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unset>".to_string())
}

/// Register `transform`, stored through `field`
fn register_transform<K: JobKind>(
    registry: &mut JobPropertyRegistry<JobState<K>>,
    field: fn(&mut K) -> &mut Option<ServerTransform>,
) {
    registry.add_property(
        "transform",
        "Transform applied to each record as it is retrieved: name,param1,value1,param2,value2",
        move |s, v| {
            *field(&mut s.kind) = Some(ServerTransform::parse_property_value(v)?);
            Ok(())
        },
    );
}

fn export_listener<K: JobKind>(
    exporter: Arc<dyn BatchExporter>,
    transform: &Option<ServerTransform>,
    failures: Arc<FailureChannel>,
) -> Arc<dyn BatchListener> {
    Arc::new(
        ExportBatchesListener::new(exporter, failures)
            .with_name(K::NAME)
            .with_transform(transform.clone()),
    )
}

const FLATTEN_URI: &str =
    "Whether or not record URIs are flattened before being used as zip entry names; defaults to false";
const URI_PREFIX: &str =
    "Prefix to prepend to each URI it is used as an entry name; applied after a URI is optionally flattened";
const FILENAME_PREFIX: &str =
    "Prefix written to the beginning of the filename of each file; defaults to batch-";

/// Writes every selected record to one file
#[derive(Debug, Clone, Default)]
pub struct ExportToFileJob {
    /// Output file
    pub export_path: Option<PathBuf>,
    /// File layout
    pub options: SharedFileOptions,
    /// Fetch transform
    pub transform: Option<ServerTransform>,
}

impl JobKind for ExportToFileJob {
    const NAME: &'static str = "export-to-file";

    fn description(&self, selection: &str) -> String {
        format!(
            "Exporting documents {selection} to file at: {}",
            display_path(&self.export_path)
        )
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        registry.add_required_property(
            "exportPath",
            "The path of the file to which selected records are exported",
            |s, v| {
                s.kind.export_path = Some(PathBuf::from(v));
                Ok(())
            },
        );
        registry.add_property("fileHeader", "Content written to the start of the file", |s, v| {
            s.kind.options.framing.header = Some(v.to_string());
            Ok(())
        });
        registry.add_property("fileFooter", "Content written to the end of the file", |s, v| {
            s.kind.options.framing.footer = Some(v.to_string());
            Ok(())
        });
        registry.add_property(
            "recordPrefix",
            "Optional content to be written before each record is written",
            |s, v| {
                s.kind.options.framing.record_prefix = Some(v.to_string());
                Ok(())
            },
        );
        registry.add_property(
            "recordSuffix",
            "Optional content to be written after each record is written",
            |s, v| {
                s.kind.options.framing.record_suffix = Some(v.to_string());
                Ok(())
            },
        );
        registry.add_property(
            "omitLastRecordSuffix",
            "Whether the suffix after the very last record is replaced when the job finishes; defaults to false",
            |s, v| {
                s.kind.options.omit_last_record_suffix = parse_bool(v)?;
                Ok(())
            },
        );
        registry.add_property(
            "omitXmlDeclaration",
            "Whether the XML declaration is removed from each XML record; defaults to true",
            |s, v| {
                s.kind.options.output = if parse_bool(v)? {
                    OutputFormat::XmlWithoutDeclaration
                } else {
                    OutputFormat::XmlWithDeclaration
                };
                Ok(())
            },
        );
        register_transform(registry, |k: &mut Self| &mut k.transform);
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        let path = required_path(&self.export_path)?;
        let exporter = Arc::new(FileExporter::open(path, self.options.clone())?);
        Ok(export_listener::<Self>(exporter, &self.transform, failures))
    }
}

/// Writes every selected record into one archive
#[derive(Debug, Clone, Default)]
pub struct ExportToZipJob {
    /// Output archive
    pub export_path: Option<PathBuf>,
    /// Entry naming
    pub entries: ZipEntryOptions,
    /// Fetch transform
    pub transform: Option<ServerTransform>,
}

impl JobKind for ExportToZipJob {
    const NAME: &'static str = "export-to-zip";

    fn description(&self, selection: &str) -> String {
        format!(
            "Exporting documents {selection} to file at: {}",
            display_path(&self.export_path)
        )
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        registry.add_required_property(
            "exportPath",
            "The path of the zip file to which selected records are exported",
            |s, v| {
                s.kind.export_path = Some(PathBuf::from(v));
                Ok(())
            },
        );
        registry.add_property("flattenUri", FLATTEN_URI, |s, v| {
            s.kind.entries.flatten_uri = parse_bool(v)?;
            Ok(())
        });
        registry.add_property("uriPrefix", URI_PREFIX, |s, v| {
            s.kind.entries.uri_prefix = Some(v.to_string());
            Ok(())
        });
        register_transform(registry, |k: &mut Self| &mut k.transform);
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        let path = required_path(&self.export_path)?;
        let exporter = Arc::new(ZipFileExporter::create(path, self.entries.clone(), false)?);
        Ok(export_listener::<Self>(exporter, &self.transform, failures))
    }
}

/// Writes each batch to its own file in a directory
#[derive(Debug, Clone, Default)]
pub struct ExportBatchesToDirectoryJob {
    /// Output directory
    pub export_path: Option<PathBuf>,
    /// File naming and layout
    pub options: BatchFileOptions,
    /// Fetch transform
    pub transform: Option<ServerTransform>,
}

impl JobKind for ExportBatchesToDirectoryJob {
    const NAME: &'static str = "export-batches-to-directory";

    fn description(&self, selection: &str) -> String {
        format!(
            "Exporting batches of documents {selection} to files at: {}",
            display_path(&self.export_path)
        )
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        registry.add_required_property(
            "exportPath",
            "Directory path to which each batch should be written as a file",
            |s, v| {
                s.kind.export_path = Some(PathBuf::from(v));
                Ok(())
            },
        );
        registry.add_property("fileHeader", "Content written to the start of each file", |s, v| {
            s.kind.options.framing.header = Some(v.to_string());
            Ok(())
        });
        registry.add_property("fileFooter", "Content written to the end of each file", |s, v| {
            s.kind.options.framing.footer = Some(v.to_string());
            Ok(())
        });
        registry.add_property("filenamePrefix", FILENAME_PREFIX, |s, v| {
            s.kind.options.naming.prefix = v.to_string();
            Ok(())
        });
        registry.add_property(
            "filenameExtension",
            "Filename extension for each file; defaults to none",
            |s, v| {
                s.kind.options.naming.extension = v.to_string();
                Ok(())
            },
        );
        registry.add_property(
            "recordPrefix",
            "Optional content to be written before each record is written",
            |s, v| {
                s.kind.options.framing.record_prefix = Some(v.to_string());
                Ok(())
            },
        );
        registry.add_property(
            "recordSuffix",
            "Optional content to be written after each record is written",
            |s, v| {
                s.kind.options.framing.record_suffix = Some(v.to_string());
                Ok(())
            },
        );
        register_transform(registry, |k: &mut Self| &mut k.transform);
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        let dir = required_path(&self.export_path)?;
        let exporter = Arc::new(DirectoryExporter::new(dir, self.options.clone())?);
        Ok(export_listener::<Self>(exporter, &self.transform, failures))
    }
}

/// Writes each batch to its own archive in a directory
#[derive(Debug, Clone)]
pub struct ExportBatchesToZipsJob {
    /// Output directory
    pub export_path: Option<PathBuf>,
    /// Archive naming
    pub naming: BatchNaming,
    /// Entry naming
    pub entries: ZipEntryOptions,
    /// Fetch transform
    pub transform: Option<ServerTransform>,
}

impl Default for ExportBatchesToZipsJob {
    fn default() -> Self {
        Self {
            export_path: None,
            naming: BatchNaming::archive(),
            entries: ZipEntryOptions::default(),
            transform: None,
        }
    }
}

impl JobKind for ExportBatchesToZipsJob {
    const NAME: &'static str = "export-batches-to-zips";

    fn description(&self, selection: &str) -> String {
        format!(
            "Exporting batches of documents {selection} to files at: {}",
            display_path(&self.export_path)
        )
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        registry.add_required_property(
            "exportPath",
            "Directory path to which each batch should be written as a zip",
            |s, v| {
                s.kind.export_path = Some(PathBuf::from(v));
                Ok(())
            },
        );
        registry.add_property("filenamePrefix", FILENAME_PREFIX, |s, v| {
            s.kind.naming.prefix = v.to_string();
            Ok(())
        });
        registry.add_property(
            "filenameExtension",
            "Filename extension for each file; defaults to .zip",
            |s, v| {
                s.kind.naming.extension = v.to_string();
                Ok(())
            },
        );
        registry.add_property("flattenUri", FLATTEN_URI, |s, v| {
            s.kind.entries.flatten_uri = parse_bool(v)?;
            Ok(())
        });
        registry.add_property("uriPrefix", URI_PREFIX, |s, v| {
            s.kind.entries.uri_prefix = Some(v.to_string());
            Ok(())
        });
        register_transform(registry, |k: &mut Self| &mut k.transform);
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        let dir = required_path(&self.export_path)?;
        let exporter = Arc::new(BatchZipsExporter::new(
            dir,
            self.naming.clone(),
            self.entries.clone(),
        )?);
        Ok(export_listener::<Self>(exporter, &self.transform, failures))
    }
}

/// Hands every selected record to caller-supplied consumers
///
/// Consumers are code, so this kind is built programmatically rather than
/// selected by name.
#[derive(Clone, Default)]
pub struct SimpleExportJob {
    /// Record consumers, called in order for each record
    pub consumers: Vec<RecordConsumer>,
    /// Fetch transform
    pub transform: Option<ServerTransform>,
}

impl SimpleExportJob {
    /// Create a kind with one consumer
    pub fn new<F>(consumer: F) -> Self
    where
        F: Fn(&Record) -> Result<()> + Send + Sync + 'static,
    {
        Self::default().with_consumer(consumer)
    }

    /// Add a consumer
    pub fn with_consumer<F>(mut self, consumer: F) -> Self
    where
        F: Fn(&Record) -> Result<()> + Send + Sync + 'static,
    {
        self.consumers.push(Arc::new(consumer));
        self
    }
}

impl std::fmt::Debug for SimpleExportJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleExportJob")
            .field("consumers", &self.consumers.len())
            .field("transform", &self.transform)
            .finish()
    }
}

impl JobKind for SimpleExportJob {
    const NAME: &'static str = "simple-export";

    fn description(&self, selection: &str) -> String {
        format!("Exporting documents {selection}")
    }

    fn register_properties(registry: &mut JobPropertyRegistry<JobState<Self>>) {
        register_transform(registry, |k: &mut Self| &mut k.transform);
    }

    fn build_listener(&self, failures: Arc<FailureChannel>) -> Result<Arc<dyn BatchListener>> {
        Ok(Arc::new(
            RecordConsumersListener::new(self.consumers.clone(), failures)
                .with_name(Self::NAME)
                .with_transform(self.transform.clone()),
        ))
    }
}
