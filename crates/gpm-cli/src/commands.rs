use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info, info_span};

use gpm_cli::config::{ConfigResolver, EffectiveConfig, OrgRole};
use gpm_cli::paths::{
    default_export_path, default_issues_path, default_link_mapping_path, default_mapping_path,
};
use gpm_github::{ClientSettings, GithubClient, RetryPolicy};
use gpm_migrate::{check_type, export_issues, export_to_file, import_from_file, link_issues};
use gpm_model::{ProjectType, load_snapshot};

use crate::cli::{ConnectionArgs, ExportArgs, ExportIssuesArgs, ImportArgs, LinkIssuesArgs};
use crate::summary::{
    print_export_summary, print_import_summary, print_issue_export_summary, print_link_summary,
    print_plan,
};

pub fn run_export(args: &ExportArgs) -> Result<()> {
    let config = resolve(&args.connection, args.org.as_deref(), Some(OrgRole::Source))?;
    let org = config.org()?.to_string();
    let project_type = ProjectType::from(args.project_type);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_export_path(Local::now()));

    let span = info_span!("export", org = %org, project_type = %project_type);
    let _guard = span.enter();

    let client = connect(&config, &args.connection)?;
    let snapshot = export_to_file(&client, &org, project_type, &output)
        .with_context(|| format!("export projects of {org}"))?;
    print_export_summary(&snapshot, &output);
    Ok(())
}

pub fn run_import(args: &ImportArgs) -> Result<()> {
    let expected = args.project_type.map(ProjectType::from);
    let config = resolve(&args.connection, args.org.as_deref(), Some(OrgRole::Target))?;

    if args.dry_run {
        let snapshot = load_snapshot(&args.input)
            .with_context(|| format!("load snapshot {}", args.input.display()))?;
        check_type(&snapshot, expected)?;
        print_plan(&snapshot, config.org_if_set());
        return Ok(());
    }

    let org = config.org()?.to_string();
    let mapping_path = args
        .mapping
        .clone()
        .unwrap_or_else(|| default_mapping_path(Local::now()));

    let span = info_span!("import", org = %org);
    let _guard = span.enter();

    let client = connect(&config, &args.connection)?;
    let mapping = import_from_file(&client, &args.input, &org, expected, &mapping_path)
        .with_context(|| format!("import {} into {org}", args.input.display()))?;
    print_import_summary(&mapping, &mapping_path);
    Ok(())
}

pub fn run_export_issues(args: &ExportIssuesArgs) -> Result<()> {
    let config = resolve(&args.connection, None, None)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_issues_path(args.project_number));

    let span = info_span!("export_issues", repo = %format!("{}/{}", args.owner, args.repo));
    let _guard = span.enter();

    let client = connect(&config, &args.connection)?;
    let rows = export_issues(
        &client,
        &args.owner,
        &args.repo,
        args.project_number,
        &output,
    )
    .with_context(|| format!("export issues of {}/{}", args.owner, args.repo))?;
    print_issue_export_summary(&rows, &output);
    Ok(())
}

pub fn run_link_issues(args: &LinkIssuesArgs) -> Result<()> {
    let config = resolve(&args.connection, None, None)?;
    let mapping_path: PathBuf = args
        .mapping
        .clone()
        .unwrap_or_else(|| default_link_mapping_path(Local::now()));

    let span = info_span!("link_issues", project_id = %args.project_id);
    let _guard = span.enter();

    let client = connect(&config, &args.connection)?;
    let mapping = link_issues(&client, &args.input, &args.project_id, &mapping_path)
        .with_context(|| format!("link issues from {}", args.input.display()))?;
    print_link_summary(&mapping, &mapping_path);
    Ok(())
}

fn resolve(
    connection: &ConnectionArgs,
    org: Option<&str>,
    role: Option<OrgRole>,
) -> Result<EffectiveConfig> {
    let config = ConfigResolver::from_process()
        .resolve(&connection.overrides(org), role)
        .context("resolve configuration")?;
    debug!(?config, "resolved configuration");
    Ok(config)
}

fn connect(config: &EffectiveConfig, connection: &ConnectionArgs) -> Result<GithubClient> {
    let settings = ClientSettings {
        api_url: config.api_url.clone(),
        graphql_url: config.graphql_url.clone(),
        retry: RetryPolicy {
            max_rate_limit_retries: connection.max_retries,
            max_network_retries: connection.max_network_retries,
            ..RetryPolicy::default()
        },
        ..ClientSettings::new(config.token()?)
    };
    info!(api_url = %settings.api_url, "Connecting to GitHub");
    GithubClient::connect(&settings).context("create HTTP client")
}
