//! Source-to-target identifier mappings written by the importer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::ProjectType;

/// Record of every object an import created.
///
/// The importer fills this in memory and writes it once, either when the
/// import finishes (`complete = true`) or when a step fails, so a partial
/// run can be finished by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierMapping {
    pub source_org: String,
    pub target_org: String,
    pub project_type: ProjectType,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub projects: Vec<ProjectMapping>,
}

impl IdentifierMapping {
    #[must_use]
    pub fn new(
        source_org: impl Into<String>,
        target_org: impl Into<String>,
        project_type: ProjectType,
    ) -> Self {
        Self {
            source_org: source_org.into(),
            target_org: target_org.into(),
            project_type,
            started_at: Utc::now(),
            finished_at: None,
            complete: false,
            projects: Vec::new(),
        }
    }

    /// Stamp the mapping as finished. `complete` is false for partial runs.
    pub fn finish(&mut self, complete: bool) {
        self.finished_at = Some(Utc::now());
        self.complete = complete;
    }

    /// Cards or items mapped across all projects.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.projects.iter().map(|p| p.items.len()).sum()
    }

    /// Iterate every item entry in import order.
    pub fn item_entries(&self) -> impl Iterator<Item = &IdMapping> {
        self.projects.iter().flat_map(|p| p.items.iter())
    }
}

/// One imported project and its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMapping {
    pub source_id: String,
    pub name: String,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<IdMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<IdMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<IdMapping>,
}

impl ProjectMapping {
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        name: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            name: name.into(),
            target_id: target_id.into(),
            target_number: None,
            target_url: None,
            columns: Vec::new(),
            fields: Vec::new(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMapping {
    pub source_id: String,
    pub target_id: String,
}

impl IdMapping {
    #[must_use]
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }
}

/// Result of linking existing issues into a Projects V2 board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLinkMapping {
    pub project_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub links: Vec<IssueLink>,
}

impl IssueLinkMapping {
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            complete: false,
            links: Vec::new(),
        }
    }

    pub fn finish(&mut self, complete: bool) {
        self.finished_at = Some(Utc::now());
        self.complete = complete;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLink {
    #[serde(default)]
    pub issue_number: Option<u64>,
    /// Issue node id.
    pub content_id: String,
    /// Project item node id.
    pub item_id: String,
}
