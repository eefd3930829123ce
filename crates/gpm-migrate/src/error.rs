//! Migration error types.

use std::path::PathBuf;

use gpm_github::ClientError;
use gpm_model::{ProjectType, SnapshotError};
use thiserror::Error;

/// Broad category of a failure, used for exit codes and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-2xx response or GraphQL error.
    Api,
    /// Rate limit outlived the retry budget.
    RateLimit,
    /// Connectivity failure outlived the retry budget.
    Network,
    /// Malformed snapshot, mapping or CSV file.
    Format,
    /// Local file system failure.
    Io,
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("snapshot contains {found} projects but {expected} projects were requested")]
    TypeMismatch {
        expected: ProjectType,
        found: ProjectType,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A step failed after some objects were created; what was created is
    /// recorded in the mapping file.
    #[error("{source} (partial mapping written to {})", mapping_path.display())]
    Interrupted {
        mapping_path: PathBuf,
        #[source]
        source: Box<MigrateError>,
    },
}

impl MigrateError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Client(err) => match err {
                ClientError::RateLimited { .. } => ErrorKind::RateLimit,
                ClientError::Network { .. } => ErrorKind::Network,
                _ => ErrorKind::Api,
            },
            Self::Snapshot(err) => match err {
                SnapshotError::Format { .. } => ErrorKind::Format,
                _ => ErrorKind::Io,
            },
            Self::TypeMismatch { .. } => ErrorKind::Format,
            Self::Csv { source, .. } => {
                if source.is_io_error() {
                    ErrorKind::Io
                } else {
                    ErrorKind::Format
                }
            }
            Self::Interrupted { source, .. } => source.kind(),
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Client(err) => Some(err.user_message().to_string()),
            Self::Snapshot(err) => err.suggestion(),
            Self::TypeMismatch { found, .. } => Some(format!("Re-run with --type {found}.")),
            Self::Csv { .. } => Some("The CSV must have the columns id,number,title,url,state.".into()),
            Self::Interrupted { source, .. } => source.suggestion().map(|hint| {
                format!("{hint} Objects already created are listed in the mapping file and must be removed or completed by hand before re-running.")
            }),
        }
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_client_error() {
        let rate = MigrateError::from(ClientError::RateLimited {
            url: "u".to_string(),
            attempts: 6,
        });
        assert_eq!(rate.kind(), ErrorKind::RateLimit);

        let network = MigrateError::from(ClientError::Network {
            url: "u".to_string(),
            attempts: 4,
            message: "timeout".to_string(),
        });
        assert_eq!(network.kind(), ErrorKind::Network);

        let api = MigrateError::from(ClientError::GraphQl {
            messages: vec!["nope".to_string()],
        });
        assert_eq!(api.kind(), ErrorKind::Api);
    }

    #[test]
    fn interrupted_keeps_inner_kind() {
        let err = MigrateError::Interrupted {
            mapping_path: PathBuf::from("map.json"),
            source: Box::new(MigrateError::from(ClientError::RateLimited {
                url: "u".to_string(),
                attempts: 6,
            })),
        };
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert!(err.to_string().contains("map.json"));
        assert!(err.suggestion().unwrap().contains("mapping file"));
    }

    #[test]
    fn type_mismatch_is_format() {
        let err = MigrateError::TypeMismatch {
            expected: ProjectType::V2,
            found: ProjectType::Classic,
        };
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(err.suggestion().unwrap(), "Re-run with --type classic.");
    }
}
