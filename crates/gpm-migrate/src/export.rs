//! Export projects from the source organization into a snapshot.

use std::path::Path;

use gpm_github::{GithubClient, ItemNode, ProjectNode, RestCard, Sleeper, Transport};
use gpm_model::{
    ClassicCard, ClassicColumn, ClassicProject, FieldValue, FieldValueKind, ItemContent,
    ProjectSnapshot, ProjectType, Projects, SelectOption, V2Field, V2Item, V2Project,
    save_snapshot,
};
use serde_json::json;
use tracing::{info, info_span};

use crate::error::Result;

/// Reads project data from one organization.
pub struct Exporter<'a, T, S> {
    client: &'a GithubClient<T, S>,
}

impl<'a, T: Transport, S: Sleeper> Exporter<'a, T, S> {
    pub fn new(client: &'a GithubClient<T, S>) -> Self {
        Self { client }
    }

    /// Fetch every project of `org` and wrap it in a snapshot.
    pub fn export(&self, org: &str, project_type: ProjectType) -> Result<ProjectSnapshot> {
        let span = info_span!("export", org = %org, project_type = %project_type);
        let _guard = span.enter();

        let projects = match project_type {
            ProjectType::Classic => {
                info!("Fetching classic projects for org '{}' ...", org);
                Projects::Classic(self.export_classic(org)?)
            }
            ProjectType::V2 => {
                info!("Fetching Projects V2 for org '{}' ...", org);
                Projects::V2(self.export_v2(org)?)
            }
        };

        let mut snapshot = ProjectSnapshot::new(org, projects);
        snapshot.api_url = Some(self.client.api_url().to_string());
        snapshot
            .metadata
            .insert("tool".to_string(), json!(concat!("gpm ", env!("CARGO_PKG_VERSION"))));
        snapshot
            .metadata
            .insert("project_count".to_string(), json!(snapshot.project_count()));
        snapshot
            .metadata
            .insert("container_count".to_string(), json!(snapshot.container_count()));
        snapshot
            .metadata
            .insert("item_count".to_string(), json!(snapshot.item_count()));
        Ok(snapshot)
    }

    /// Classic boards with their columns and cards, in board order.
    pub fn export_classic(&self, org: &str) -> Result<Vec<ClassicProject>> {
        let projects = self.client.list_org_projects(org)?;
        info!("Found {} classic projects.", projects.len());

        let total = projects.len();
        let mut exported = Vec::with_capacity(total);
        for (index, project) in projects.into_iter().enumerate() {
            info!(
                "Processing project {}/{}: {} (ID: {})",
                index + 1,
                total,
                project.name,
                project.id
            );
            let columns = self.client.list_columns(project.id)?;
            info!("  Found {} columns.", columns.len());

            let mut exported_columns = Vec::with_capacity(columns.len());
            for column in columns {
                let cards = self.client.list_cards(column.id)?;
                info!("    Found {} cards in '{}'.", cards.len(), column.name);
                exported_columns.push(ClassicColumn {
                    id: column.id,
                    name: column.name,
                    cards: cards.into_iter().map(classic_card).collect(),
                });
            }

            exported.push(ClassicProject {
                id: project.id,
                number: project.number,
                name: project.name,
                body: project.body.filter(|b| !b.is_empty()),
                state: project.state,
                columns: exported_columns,
            });
        }
        Ok(exported)
    }

    /// Projects V2 boards with field definitions and items, in board order.
    pub fn export_v2(&self, org: &str) -> Result<Vec<V2Project>> {
        let projects = self.client.list_projects_v2(org)?;
        info!("Found {} Projects V2.", projects.len());

        let mut exported = Vec::with_capacity(projects.len());
        for project in projects {
            let items = self.client.list_project_items(&project.id)?;
            info!(
                "  Project #{} '{}': {} items.",
                project.number,
                project.title,
                items.len()
            );
            exported.push(v2_project(project, items));
        }
        Ok(exported)
    }
}

/// Export `org` and write the snapshot atomically to `path`.
pub fn export_to_file<T: Transport, S: Sleeper>(
    client: &GithubClient<T, S>,
    org: &str,
    project_type: ProjectType,
    path: &Path,
) -> Result<ProjectSnapshot> {
    let snapshot = Exporter::new(client).export(org, project_type)?;
    info!("Saving data to {} ...", path.display());
    save_snapshot(&snapshot, path)?;
    info!(
        projects = snapshot.project_count(),
        items = snapshot.item_count(),
        "Export completed successfully."
    );
    Ok(snapshot)
}

fn classic_card(card: RestCard) -> ClassicCard {
    ClassicCard {
        id: card.id,
        note: card.note,
        content_url: card.content_url,
        content_id: card.content_id,
        content_type: card.content_type,
        archived: card.archived,
    }
}

fn v2_project(project: ProjectNode, items: Vec<ItemNode>) -> V2Project {
    let fields = project
        .fields
        .into_nodes()
        .into_iter()
        .filter_map(|field| {
            Some(V2Field {
                id: field.id?,
                name: field.name?,
                data_type: field.data_type.unwrap_or_else(|| "UNKNOWN".to_string()),
                options: field
                    .options
                    .into_iter()
                    .map(|option| SelectOption {
                        id: Some(option.id),
                        name: option.name,
                        color: option.color,
                        description: option.description.filter(|d| !d.is_empty()),
                    })
                    .collect(),
            })
        })
        .collect();

    V2Project {
        id: project.id,
        number: project.number,
        title: project.title,
        short_description: project.short_description.filter(|d| !d.is_empty()),
        readme: project.readme.filter(|r| !r.is_empty()),
        url: project.url,
        closed: project.closed,
        fields,
        items: items.into_iter().map(v2_item).collect(),
    }
}

fn v2_item(item: ItemNode) -> V2Item {
    let content = item.content.and_then(|content| {
        Some(ItemContent {
            title: content.title?,
            body: content.body.filter(|b| !b.is_empty()),
            repository: content.repository.and_then(|r| r.name),
            number: content.number,
            url: content.url,
        })
    });

    let field_values = item
        .field_values
        .into_nodes()
        .into_iter()
        .filter_map(|node| {
            let field = node.field_name()?.to_string();
            let value = if let Some(text) = node.text {
                FieldValueKind::Text(text)
            } else if let Some(number) = node.number {
                FieldValueKind::Number(number)
            } else if let Some(date) = node.date {
                FieldValueKind::Date(date)
            } else {
                FieldValueKind::SingleSelect(node.name?)
            };
            Some(FieldValue { field, value })
        })
        .collect();

    V2Item {
        id: item.id,
        item_type: item.item_type,
        archived: item.is_archived,
        content,
        field_values,
    }
}
