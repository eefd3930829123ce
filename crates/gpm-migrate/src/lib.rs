//! Migration steps built on the GitHub client and the snapshot model.
//!
//! - `export` - read projects from the source organization into a snapshot
//! - `import` - recreate a snapshot in the target organization and record the
//!   identifier mapping, including partial mappings on failure
//! - `issues` - issue CSV export and linking issues into a Projects V2 board

pub mod error;
pub mod export;
pub mod import;
pub mod issues;

pub use error::{ErrorKind, MigrateError, Result};
pub use export::{Exporter, export_to_file};
pub use import::{
    CREATABLE_FIELD_TYPES, Importer, UNTITLED, check_type, import_from_file, import_to_file,
};
pub use issues::{IssueRow, export_issues, link_issues, read_issue_rows};
