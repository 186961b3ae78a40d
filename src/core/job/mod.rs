//! Export and mutation jobs
//!
//! A job is configured through named string properties, then started against
//! a record store. Kinds selectable by name:
//!
//! - `export-to-file`: every record appended to one text file
//! - `export-to-zip`: every record as an entry of one zip archive
//! - `export-batches-to-directory`: one file per batch
//! - `export-batches-to-zips`: one zip archive per batch
//! - `add-collections`, `set-collections`, `remove-collections`: collection membership
//! - `delete-collections`: delete every record in collections
//! - `set-permissions`: replace record permissions
//! - `delete`: delete the selected records
//!
//! [`SimpleExportJob`] hands records to caller-supplied consumers and is
//! built in code.

pub mod kinds;
pub mod mutation;
pub mod property;
pub mod runner;

pub use kinds::{
    ExportBatchesToDirectoryJob, ExportBatchesToZipsJob, ExportToFileJob, ExportToZipJob, JobKind,
    SimpleExportJob,
};
pub use mutation::{
    AddCollectionsJob, DeleteCollectionsJob, DeleteJob, RemoveCollectionsJob, SetCollectionsJob,
    SetPermissionsJob,
};
pub use property::{parse_bool, JobPropertyRegistry, PropertyConsumer, PropertyDescriptor};
pub use runner::{job_for_name, ConfigurableJob, Job, JobState, JOB_NAMES};
