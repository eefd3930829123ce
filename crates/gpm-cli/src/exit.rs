//! Process exit codes and user hints derived from an error chain.

use gpm_github::ClientError;
use gpm_migrate::{ErrorKind, MigrateError};
use gpm_model::SnapshotError;

use crate::config::ConfigError;

pub const SUCCESS: i32 = 0;
/// I/O and anything not covered below.
pub const OTHER: i32 = 1;
pub const CONFIG: i32 = 2;
pub const API: i32 = 3;
pub const RATE_LIMIT: i32 = 4;
pub const NETWORK: i32 = 5;
pub const FORMAT: i32 = 6;

/// Exit code for the first typed error found in the chain.
#[must_use]
pub fn exit_code(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if cause.downcast_ref::<ConfigError>().is_some() {
            return CONFIG;
        }
        if let Some(err) = cause.downcast_ref::<MigrateError>() {
            return code_for_kind(err.kind());
        }
        if let Some(err) = cause.downcast_ref::<ClientError>() {
            return match err {
                ClientError::RateLimited { .. } => RATE_LIMIT,
                ClientError::Network { .. } => NETWORK,
                ClientError::Setup(_) => CONFIG,
                _ => API,
            };
        }
        if let Some(err) = cause.downcast_ref::<SnapshotError>() {
            return match err {
                SnapshotError::Format { .. } => FORMAT,
                _ => OTHER,
            };
        }
    }
    OTHER
}

const fn code_for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Api => API,
        ErrorKind::RateLimit => RATE_LIMIT,
        ErrorKind::Network => NETWORK,
        ErrorKind::Format => FORMAT,
        ErrorKind::Io => OTHER,
    }
}

/// How the user might fix the error, when known.
#[must_use]
pub fn suggestion(error: &anyhow::Error) -> Option<String> {
    error.chain().find_map(|cause| {
        if let Some(err) = cause.downcast_ref::<ConfigError>() {
            return err.suggestion();
        }
        if let Some(err) = cause.downcast_ref::<MigrateError>() {
            return err.suggestion();
        }
        if let Some(err) = cause.downcast_ref::<ClientError>() {
            return Some(err.user_message().to_string());
        }
        cause
            .downcast_ref::<SnapshotError>()
            .and_then(SnapshotError::suggestion)
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Context;

    use super::*;

    fn wrapped<E>(err: E) -> anyhow::Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Err::<(), E>(err).context("step failed").unwrap_err()
    }

    #[test]
    fn codes_per_kind() {
        assert_eq!(
            exit_code(&wrapped(ConfigError::Missing {
                what: "GitHub token",
                hint: String::new()
            })),
            CONFIG
        );
        assert_eq!(
            exit_code(&wrapped(MigrateError::from(ClientError::RateLimited {
                url: "u".to_string(),
                attempts: 6
            }))),
            RATE_LIMIT
        );
        assert_eq!(
            exit_code(&wrapped(ClientError::Network {
                url: "u".to_string(),
                attempts: 4,
                message: "reset".to_string()
            })),
            NETWORK
        );
        assert_eq!(
            exit_code(&wrapped(SnapshotError::Format {
                path: PathBuf::from("x.json"),
                reason: "missing field `name`".to_string()
            })),
            FORMAT
        );
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), OTHER);
    }

    #[test]
    fn interrupted_import_keeps_cause_code() {
        let err = MigrateError::Interrupted {
            mapping_path: PathBuf::from("map.json"),
            source: Box::new(MigrateError::from(ClientError::Api {
                status: 422,
                url: "u".to_string(),
                message: "Validation Failed".to_string(),
            })),
        };
        let err = wrapped(err);

        assert_eq!(exit_code(&err), API);
        assert!(suggestion(&err).unwrap().contains("mapping file"));
    }
}
