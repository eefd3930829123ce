//! Issue CSV export and linking of listed issues into a Projects V2 board.

use std::path::{Path, PathBuf};

use gpm_github::{GithubClient, IssueNode, Sleeper, Transport};
use gpm_model::{IssueLink, IssueLinkMapping, save_issue_links};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{MigrateError, Result};

/// One line of the issue CSV (`id,number,title,url,state`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRow {
    /// Issue node id, passed as `contentId` when linking.
    pub id: String,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub state: String,
}

impl From<IssueNode> for IssueRow {
    fn from(issue: IssueNode) -> Self {
        Self {
            id: issue.id,
            number: Some(issue.number),
            title: issue.title,
            url: issue.url,
            state: issue.state,
        }
    }
}

/// Write the issues of `owner/repo` to a CSV file, sorted by number.
///
/// With `project_number`, only issues that are items on that board are kept.
pub fn export_issues<T: Transport, S: Sleeper>(
    client: &GithubClient<T, S>,
    owner: &str,
    repo: &str,
    project_number: Option<u64>,
    path: &Path,
) -> Result<Vec<IssueRow>> {
    info!("Fetching issues of {}/{} ...", owner, repo);
    let issues = client.list_repository_issues(owner, repo)?;
    let total = issues.len();

    let mut rows: Vec<IssueRow> = issues
        .into_iter()
        .filter(|issue| project_number.is_none_or(|number| issue.in_project(number)))
        .map(IssueRow::from)
        .collect();
    rows.sort_by_key(|row| row.number);

    if let Some(number) = project_number {
        info!("{} of {} issues are on project #{}.", rows.len(), total, number);
    } else {
        info!("Found {} issues.", total);
    }

    write_rows(&rows, path)?;
    info!("Issues written to {}", path.display());
    Ok(rows)
}

/// Read an issue CSV written by [`export_issues`].
pub fn read_issue_rows(path: &Path) -> Result<Vec<IssueRow>> {
    let csv_error = |source: csv::Error| MigrateError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<IssueRow>() {
        rows.push(result.map_err(csv_error)?);
    }
    Ok(rows)
}

/// Add every issue listed in `csv_path` to the board `project_id`, in file
/// order, and write the resulting item ids to `mapping_path`.
///
/// When a call fails the links made so far are still written, marked
/// incomplete.
pub fn link_issues<T: Transport, S: Sleeper>(
    client: &GithubClient<T, S>,
    csv_path: &Path,
    project_id: &str,
    mapping_path: &Path,
) -> Result<IssueLinkMapping> {
    let rows = read_issue_rows(csv_path)?;
    info!("Linking {} issues into project {} ...", rows.len(), project_id);

    let mut mapping = IssueLinkMapping::new(project_id);
    let outcome = add_rows(client, &rows, &mut mapping);

    match outcome {
        Ok(()) => {
            mapping.finish(true);
            save_issue_links(&mapping, mapping_path)?;
            info!(
                linked = mapping.links.len(),
                "Link mapping written to {}",
                mapping_path.display()
            );
            Ok(mapping)
        }
        Err(err) => {
            mapping.finish(false);
            if let Err(save_err) = save_issue_links(&mapping, mapping_path) {
                error!("Could not write partial link mapping: {save_err}");
                return Err(err);
            }
            Err(MigrateError::Interrupted {
                mapping_path: PathBuf::from(mapping_path),
                source: Box::new(err),
            })
        }
    }
}

fn add_rows<T: Transport, S: Sleeper>(
    client: &GithubClient<T, S>,
    rows: &[IssueRow],
    mapping: &mut IssueLinkMapping,
) -> Result<()> {
    for row in rows {
        if row.id.is_empty() {
            warn!("Skipping row without an issue id (number {:?})", row.number);
            continue;
        }
        let item_id = client.add_item_by_id(&mapping.project_id, &row.id)?;
        info!("  Linked issue #{} -> {}", row.number.unwrap_or_default(), item_id);
        mapping.links.push(IssueLink {
            issue_number: row.number,
            content_id: row.id.clone(),
            item_id,
        });
    }
    Ok(())
}

fn write_rows(rows: &[IssueRow], path: &Path) -> Result<()> {
    let csv_error = |source: csv::Error| MigrateError::Csv {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| csv_error(e.into()))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| csv_error(e.into()))?;
    Ok(())
}
