//! Exported project snapshots.
//!
//! A snapshot holds every project of one organization, either classic boards
//! (columns and cards) or Projects V2 boards (fields and items). Lists keep
//! the order GitHub returned them in; the importer relies on that order.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which GitHub project model a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// Legacy boards with columns and cards (REST API).
    Classic,
    /// Projects V2 with fields and items (GraphQL API).
    V2,
}

impl ProjectType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::V2 => "v2",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything exported from one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Source organization login.
    pub org: String,
    /// When the export finished.
    pub exported_at: DateTime<Utc>,
    /// REST base URL the export was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Free-form metadata (tool version, counts).
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// The exported projects.
    pub projects: Projects,
}

/// Projects of a single type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "items", rename_all = "lowercase")]
pub enum Projects {
    Classic(Vec<ClassicProject>),
    V2(Vec<V2Project>),
}

impl ProjectSnapshot {
    #[must_use]
    pub fn new(org: impl Into<String>, projects: Projects) -> Self {
        Self {
            org: org.into(),
            exported_at: Utc::now(),
            api_url: None,
            metadata: BTreeMap::new(),
            projects,
        }
    }

    #[must_use]
    pub fn project_type(&self) -> ProjectType {
        match self.projects {
            Projects::Classic(_) => ProjectType::Classic,
            Projects::V2(_) => ProjectType::V2,
        }
    }

    #[must_use]
    pub fn project_count(&self) -> usize {
        match &self.projects {
            Projects::Classic(projects) => projects.len(),
            Projects::V2(projects) => projects.len(),
        }
    }

    /// Columns (classic) or fields (V2) across all projects.
    #[must_use]
    pub fn container_count(&self) -> usize {
        match &self.projects {
            Projects::Classic(projects) => projects.iter().map(|p| p.columns.len()).sum(),
            Projects::V2(projects) => projects.iter().map(|p| p.fields.len()).sum(),
        }
    }

    /// Cards (classic) or items (V2) across all projects.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match &self.projects {
            Projects::Classic(projects) => projects.iter().map(ClassicProject::card_count).sum(),
            Projects::V2(projects) => projects.iter().map(|p| p.items.len()).sum(),
        }
    }

    /// Check the invariants serde cannot express.
    ///
    /// Returns every problem found; an empty list means the snapshot is
    /// safe to import.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.org.trim().is_empty() {
            problems.push("org is empty".to_string());
        }
        match &self.projects {
            Projects::Classic(projects) => validate_classic(projects, &mut problems),
            Projects::V2(projects) => validate_v2(projects, &mut problems),
        }
        problems
    }
}

fn validate_classic(projects: &[ClassicProject], problems: &mut Vec<String>) {
    let mut project_ids = HashSet::new();
    let mut card_ids = HashSet::new();
    for (index, project) in projects.iter().enumerate() {
        if project.name.trim().is_empty() {
            problems.push(format!("project #{index} has an empty name"));
        }
        if !project_ids.insert(project.id) {
            problems.push(format!("project id {} appears more than once", project.id));
        }
        let mut column_ids = HashSet::new();
        for column in &project.columns {
            if column.name.trim().is_empty() {
                problems.push(format!(
                    "column {} in project '{}' has an empty name",
                    column.id, project.name
                ));
            }
            if !column_ids.insert(column.id) {
                problems.push(format!(
                    "column id {} appears more than once in project '{}'",
                    column.id, project.name
                ));
            }
            for card in &column.cards {
                if !card_ids.insert(card.id) {
                    problems.push(format!("card id {} appears more than once", card.id));
                }
            }
        }
    }
}

fn validate_v2(projects: &[V2Project], problems: &mut Vec<String>) {
    let mut project_ids = HashSet::new();
    let mut item_ids = HashSet::new();
    for (index, project) in projects.iter().enumerate() {
        if project.id.trim().is_empty() {
            problems.push(format!("project #{index} has an empty id"));
        } else if !project_ids.insert(project.id.as_str()) {
            problems.push(format!("project id {} appears more than once", project.id));
        }
        if project.title.trim().is_empty() {
            problems.push(format!("project #{index} has an empty title"));
        }
        let mut field_names = HashSet::new();
        for field in &project.fields {
            if field.id.trim().is_empty() || field.name.trim().is_empty() {
                problems.push(format!(
                    "project '{}' has a field without id or name",
                    project.title
                ));
            } else if !field_names.insert(field.name.as_str()) {
                problems.push(format!(
                    "field '{}' appears more than once in project '{}'",
                    field.name, project.title
                ));
            }
        }
        for item in &project.items {
            if item.id.trim().is_empty() {
                problems.push(format!("project '{}' has an item without id", project.title));
            } else if !item_ids.insert(item.id.as_str()) {
                problems.push(format!("item id {} appears more than once", item.id));
            }
        }
    }
}

fn default_state() -> String {
    "open".to_string()
}

/// A classic project board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicProject {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub body: Option<String>,
    /// `open` or `closed`.
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default)]
    pub columns: Vec<ClassicColumn>,
}

impl ClassicProject {
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.eq_ignore_ascii_case("closed")
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicColumn {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<ClassicCard>,
}

/// A card is either a free-text note or a reference to an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicCard {
    pub id: u64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub content_id: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

/// A Projects V2 board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2Project {
    /// GraphQL node id.
    pub id: String,
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub readme: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub fields: Vec<V2Field>,
    #[serde(default)]
    pub items: Vec<V2Item>,
}

/// A field definition, e.g. `Status` (SINGLE_SELECT) or `Estimate` (NUMBER).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V2Field {
    pub id: String,
    pub name: String,
    /// GitHub's `ProjectV2FieldType`, e.g. `TEXT`, `SINGLE_SELECT`, `ASSIGNEES`.
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl V2Field {
    #[must_use]
    pub fn option_named(&self, name: &str) -> Option<&SelectOption> {
        self.options.iter().find(|option| option.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2Item {
    /// GraphQL node id.
    pub id: String,
    /// `DRAFT_ISSUE`, `ISSUE`, `PULL_REQUEST` or `REDACTED`.
    pub item_type: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub content: Option<ItemContent>,
    #[serde(default)]
    pub field_values: Vec<FieldValue>,
}

impl V2Item {
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.content
            .as_ref()
            .map(|content| content.title.as_str())
            .filter(|title| !title.trim().is_empty())
    }
}

/// Draft issue, issue or pull request attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemContent {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Repository name for issues and pull requests.
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A value set on an item, keyed by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field: String,
    pub value: FieldValueKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValueKind {
    Text(String),
    Number(f64),
    /// ISO-8601 date.
    Date(String),
    /// Option name; option ids differ between projects.
    SingleSelect(String),
}

impl FieldValueKind {
    /// Project field kind that holds this value.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Text(_) => "TEXT",
            Self::Number(_) => "NUMBER",
            Self::Date(_) => "DATE",
            Self::SingleSelect(_) => "SINGLE_SELECT",
        }
    }
}
