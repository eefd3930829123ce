//! CLI argument definitions for the project migrator.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;
use gpm_model::ProjectType;

use gpm_cli::config::CliOverrides;

#[derive(Parser)]
#[command(
    name = "gpm",
    version,
    about = "GitHub Projects migrator - copy project boards between organizations",
    long_about = "Copy GitHub project boards (classic and Projects V2) from one organization \
                  to another.\n\n\
                  `export` writes a JSON snapshot of the source organization, `import` \
                  recreates it in the target organization and writes an identifier mapping."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags and RUST_LOG).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Log file path (default: gpm_<command>_<timestamp>.log).
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log to stderr only.
    #[arg(long = "no-log-file", global = true, conflicts_with = "log_file")]
    pub no_log_file: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export the projects of an organization to a JSON snapshot.
    Export(ExportArgs),

    /// Recreate the projects of a snapshot in another organization.
    Import(ImportArgs),

    /// Export the issues of a repository to CSV.
    ExportIssues(ExportIssuesArgs),

    /// Add the issues listed in a CSV file to a Projects V2 board.
    LinkIssues(LinkIssuesArgs),
}

impl Command {
    /// Name used in the default log file name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Export(_) => "export",
            Self::Import(_) => "import",
            Self::ExportIssues(_) => "export-issues",
            Self::LinkIssues(_) => "link-issues",
        }
    }
}

/// Connection settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// GitHub personal access token (or GITHUB_TOKEN).
    #[arg(long = "token", value_name = "TOKEN")]
    pub token: Option<String>,

    /// REST API base URL (default: https://api.github.com).
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// GraphQL endpoint (default: derived from --api-url).
    #[arg(long = "graphql-url", value_name = "URL")]
    pub graphql_url: Option<String>,

    /// JSON config file (default: ./config.json when present).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// File holding the token (default: ./.github_token when present).
    #[arg(long = "token-file", value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Retries when GitHub reports a rate limit.
    #[arg(long = "max-retries", value_name = "N", default_value_t = 5)]
    pub max_retries: u32,

    /// Retries on connection failures and 5xx responses.
    #[arg(long = "max-network-retries", value_name = "N", default_value_t = 3)]
    pub max_network_retries: u32,
}

impl ConnectionArgs {
    pub fn overrides(&self, org: Option<&str>) -> CliOverrides {
        CliOverrides {
            token: self.token.clone(),
            org: org.map(str::to_string),
            api_url: self.api_url.clone(),
            graphql_url: self.graphql_url.clone(),
            config_file: self.config.clone(),
            token_file: self.token_file.clone(),
        }
    }
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Source organization (or GITHUB_SOURCE_ORG).
    #[arg(long = "org", value_name = "ORG")]
    pub org: Option<String>,

    /// Project model to export.
    #[arg(long = "type", value_enum, default_value = "v2")]
    pub project_type: ProjectTypeArg,

    /// Snapshot file (default: projects_export_<timestamp>.json).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Snapshot written by `gpm export`.
    #[arg(long = "input", value_name = "PATH")]
    pub input: PathBuf,

    /// Target organization (or GITHUB_TARGET_ORG).
    #[arg(long = "org", value_name = "ORG")]
    pub org: Option<String>,

    /// Expected project model; the snapshot must match.
    #[arg(long = "type", value_enum)]
    pub project_type: Option<ProjectTypeArg>,

    /// Mapping file (default: project_mapping_<timestamp>.json).
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping: Option<PathBuf>,

    /// Validate the snapshot and print what would be created.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ExportIssuesArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Repository owner.
    #[arg(long = "owner", value_name = "OWNER")]
    pub owner: String,

    /// Repository name.
    #[arg(long = "repo", value_name = "REPO")]
    pub repo: String,

    /// Keep only issues on this Projects V2 board.
    #[arg(long = "project-number", value_name = "N")]
    pub project_number: Option<u64>,

    /// CSV file (default: issues_with_projects.csv or all_issues.csv).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct LinkIssuesArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// CSV written by `gpm export-issues`.
    #[arg(long = "input", value_name = "PATH", default_value = "all_issues.csv")]
    pub input: PathBuf,

    /// Node id of the target Projects V2 board.
    #[arg(long = "project-id", value_name = "ID")]
    pub project_id: String,

    /// Link mapping file (default: issue_links_<timestamp>.json).
    #[arg(long = "mapping", value_name = "PATH")]
    pub mapping: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ProjectTypeArg {
    Classic,
    V2,
}

impl From<ProjectTypeArg> for ProjectType {
    fn from(value: ProjectTypeArg) -> Self {
        match value {
            ProjectTypeArg::Classic => Self::Classic,
            ProjectTypeArg::V2 => Self::V2,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
