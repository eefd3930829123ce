//! Resolution of the effective configuration.
//!
//! Every setting is looked up in four places, first match wins:
//!
//! 1. command-line flag
//! 2. environment variable
//! 3. JSON config file (`config.json` unless `--config` is given)
//! 4. token file (`.github_token` unless `--token-file` is given), token only
//!
//! Empty or whitespace-only values count as unset at every level.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use gpm_github::{DEFAULT_API_URL, DEFAULT_GRAPHQL_URL};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_TOKEN_FILE: &str = ".github_token";

pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_SOURCE_ORG: &str = "GITHUB_SOURCE_ORG";
pub const ENV_TARGET_ORG: &str = "GITHUB_TARGET_ORG";
pub const ENV_API_URL: &str = "GITHUB_API_URL";
pub const ENV_GRAPHQL_URL: &str = "GITHUB_GRAPHQL_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no {what} configured")]
    Missing { what: &'static str, hint: String },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{name} must be an http:// or https:// URL, got '{value}'")]
    InvalidUrl { name: &'static str, value: String },
}

impl ConfigError {
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Missing { hint, .. } => Some(hint.clone()),
            Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                Some("Check the path given to --config or --token-file.".to_string())
            }
            Self::Read { .. } => None,
            Self::Parse { .. } => Some(
                "The config file must be a JSON object with string values for token, \
                 source_org, target_org, api_url and graphql_url."
                    .to_string(),
            ),
            Self::InvalidUrl { .. } => {
                Some("Use a full URL such as https://github.example.com/api/v3.".to_string())
            }
        }
    }
}

/// Which organization setting a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgRole {
    /// Organization projects are exported from.
    Source,
    /// Organization projects are imported into.
    Target,
}

impl OrgRole {
    const fn env_var(self) -> &'static str {
        match self {
            Self::Source => ENV_SOURCE_ORG,
            Self::Target => ENV_TARGET_ORG,
        }
    }

    const fn file_key(self) -> &'static str {
        match self {
            Self::Source => "source_org",
            Self::Target => "target_org",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Source => "source organization",
            Self::Target => "target organization",
        }
    }
}

/// Keys read from the JSON config file. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub source_org: Option<String>,
    #[serde(default)]
    pub target_org: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub graphql_url: Option<String>,
}

impl FileConfig {
    fn org(&self, role: OrgRole) -> Option<&str> {
        match role {
            OrgRole::Source => self.source_org.as_deref(),
            OrgRole::Target => self.target_org.as_deref(),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub token: Option<String>,
    pub org: Option<String>,
    pub api_url: Option<String>,
    pub graphql_url: Option<String>,
    pub config_file: Option<PathBuf>,
    pub token_file: Option<PathBuf>,
}

/// The merged configuration for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    token: Option<String>,
    org: Option<String>,
    role: Option<OrgRole>,
    pub api_url: String,
    pub graphql_url: String,
}

impl EffectiveConfig {
    /// The token, or a [`ConfigError::Missing`] naming every place it can come from.
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.token.as_deref().ok_or_else(|| ConfigError::Missing {
            what: "GitHub token",
            hint: format!(
                "Pass --token, set {ENV_TOKEN}, add \"token\" to {DEFAULT_CONFIG_FILE} \
                 or write the token to {DEFAULT_TOKEN_FILE}."
            ),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// The organization for the role this configuration was resolved for.
    pub fn org(&self) -> Result<&str, ConfigError> {
        let role = self.role.unwrap_or(OrgRole::Source);
        self.org.as_deref().ok_or_else(|| ConfigError::Missing {
            what: role.label(),
            hint: format!(
                "Pass --org, set {} or add \"{}\" to {DEFAULT_CONFIG_FILE}.",
                role.env_var(),
                role.file_key()
            ),
        })
    }

    pub fn org_if_set(&self) -> Option<&str> {
        self.org.as_deref()
    }
}

impl fmt::Debug for EffectiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("org", &self.org)
            .field("role", &self.role)
            .field("api_url", &self.api_url)
            .field("graphql_url", &self.graphql_url)
            .finish()
    }
}

/// Merges flags, environment and files.
///
/// The environment is read through a lookup function and relative default
/// file names are resolved against `base_dir`, so resolution can be tested
/// without touching the process environment.
pub struct ConfigResolver<E> {
    env: E,
    base_dir: PathBuf,
}

impl ConfigResolver<fn(&str) -> Option<String>> {
    /// Resolver over the process environment and the working directory.
    pub fn from_process() -> Self {
        Self {
            env: |name| std::env::var(name).ok(),
            base_dir: PathBuf::new(),
        }
    }
}

impl<E: Fn(&str) -> Option<String>> ConfigResolver<E> {
    pub fn new(env: E, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            env,
            base_dir: base_dir.into(),
        }
    }

    /// Merge every source. `role` selects which organization key is read;
    /// `None` skips the organization.
    pub fn resolve(
        &self,
        cli: &CliOverrides,
        role: Option<OrgRole>,
    ) -> Result<EffectiveConfig, ConfigError> {
        let file = self.load_file_config(cli.config_file.as_deref())?;
        let token_file = self.load_token_file(cli.token_file.as_deref())?;
        let env = |name: &str| (self.env)(name);

        let token = first_set([
            cli.token.clone(),
            env(ENV_TOKEN),
            file.token.clone(),
            token_file,
        ]);
        let org = role.and_then(|role| {
            first_set([
                cli.org.clone(),
                env(role.env_var()),
                file.org(role).map(str::to_string),
            ])
        });
        let api_url = first_set([cli.api_url.clone(), env(ENV_API_URL), file.api_url.clone()])
            .map_or_else(|| DEFAULT_API_URL.to_string(), |url| trim_url(&url));
        let graphql_url = first_set([
            cli.graphql_url.clone(),
            env(ENV_GRAPHQL_URL),
            file.graphql_url.clone(),
        ])
        .map_or_else(|| graphql_url_for(&api_url), |url| trim_url(&url));

        check_url("API URL", &api_url)?;
        check_url("GraphQL URL", &graphql_url)?;

        Ok(EffectiveConfig {
            token,
            org,
            role,
            api_url,
            graphql_url,
        })
    }

    fn load_file_config(&self, explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let Some(contents) = self.read_optional(explicit, DEFAULT_CONFIG_FILE)? else {
            return Ok(FileConfig::default());
        };
        let path = self.path_for(explicit, DEFAULT_CONFIG_FILE);
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    fn load_token_file(&self, explicit: Option<&Path>) -> Result<Option<String>, ConfigError> {
        let contents = self.read_optional(explicit, DEFAULT_TOKEN_FILE)?;
        Ok(contents.and_then(|text| {
            text.lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string)
        }))
    }

    /// Read a file. A missing default file is `None`; a missing explicit
    /// file is an error.
    fn read_optional(
        &self,
        explicit: Option<&Path>,
        default_name: &str,
    ) -> Result<Option<String>, ConfigError> {
        let path = self.path_for(explicit, default_name);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound && explicit.is_none() => Ok(None),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    fn path_for(&self, explicit: Option<&Path>, default_name: &str) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => self.base_dir.join(default_name),
        }
    }
}

/// First value that is present and not blank, trimmed.
fn first_set<const N: usize>(values: [Option<String>; N]) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// GraphQL endpoint that belongs to a REST base URL.
///
/// GitHub Enterprise Server serves REST under `/api/v3` and GraphQL under
/// `/api/graphql`.
pub fn graphql_url_for(api_url: &str) -> String {
    let api_url = api_url.trim_end_matches('/');
    if api_url == DEFAULT_API_URL {
        DEFAULT_GRAPHQL_URL.to_string()
    } else if let Some(base) = api_url.strip_suffix("/api/v3") {
        format!("{base}/api/graphql")
    } else {
        format!("{api_url}/graphql")
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("https://") || value.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
        })
    }
}
