//! Snapshot and mapping file errors.
//!
//! Every file operation reports the path it touched so the CLI can point
//! the user at the offending file.

use std::path::PathBuf;
use thiserror::Error;

/// Error reading or writing a snapshot or mapping file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// File I/O error.
    #[error("failed to {operation} file: {}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file decoded but does not have the expected shape.
    #[error("malformed file {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// Serialization error.
    #[error("failed to serialize {what}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("failed to move {} into place at {}", temp_path.display(), target_path.display())]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SnapshotError {
    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if *operation == "read" || *operation == "open" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::Format { .. } => Some(
                "Use a snapshot produced by `gpm export`; hand edits must keep every required field."
                    .into(),
            ),
            Self::Serialization { .. } => None,
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or write to a different location.".into())
            }
        }
    }
}

/// Result type alias for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_names_the_file() {
        let err = SnapshotError::Format {
            path: PathBuf::from("export.json"),
            reason: "missing field `org`".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("export.json"));
        assert!(message.contains("missing field `org`"));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn io_suggestion_depends_on_operation() {
        let read = SnapshotError::Io {
            operation: "read",
            path: PathBuf::from("a.json"),
            source: std::io::Error::other("boom"),
        };
        assert!(read.suggestion().unwrap().contains("read it"));

        let write = SnapshotError::Io {
            operation: "write",
            path: PathBuf::from("a.json"),
            source: std::io::Error::other("boom"),
        };
        assert!(write.suggestion().unwrap().contains("write"));
    }
}
