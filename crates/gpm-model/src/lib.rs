//! Data model for GitHub project migration.
//!
//! - `snapshot` - exported projects (classic boards or Projects V2)
//! - `mapping` - source-to-target identifier records written on import
//! - `io` - atomic JSON reads and writes
//! - `error` - file errors with remediation hints

pub mod error;
pub mod io;
pub mod mapping;
pub mod snapshot;

pub use error::{Result, SnapshotError};
pub use io::{
    load_mapping, load_snapshot, read_json, save_issue_links, save_mapping, save_snapshot,
    write_json_atomic,
};
pub use mapping::{IdMapping, IdentifierMapping, IssueLink, IssueLinkMapping, ProjectMapping};
pub use snapshot::{
    ClassicCard, ClassicColumn, ClassicProject, FieldValue, FieldValueKind, ItemContent,
    ProjectSnapshot, ProjectType, Projects, SelectOption, V2Field, V2Item, V2Project,
};
