//! Replay a snapshot into the target organization.
//!
//! Objects are created parent first and in source order. Every created
//! object is recorded in the [`IdentifierMapping`] as soon as GitHub returns
//! its id, so the mapping written after a failure lists exactly what exists
//! in the target organization.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gpm_github::{
    FieldInput, FieldNode, GithubClient, NewOption, OptionNode, ProjectUpdate, Sleeper, Transport,
};
use gpm_model::{
    ClassicCard, ClassicProject, FieldValueKind, IdMapping, IdentifierMapping, ProjectMapping,
    ProjectSnapshot, ProjectType, Projects, V2Field, V2Item, V2Project, load_snapshot,
    save_mapping,
};
use tracing::{debug, error, info, info_span, warn};

use crate::error::{MigrateError, Result};

/// Title given to cards and items that have none.
pub const UNTITLED: &str = "Untitled";

/// Field kinds `createProjectV2Field` accepts.
pub const CREATABLE_FIELD_TYPES: [&str; 4] = ["TEXT", "NUMBER", "DATE", "SINGLE_SELECT"];

const DEFAULT_OPTION_COLOR: &str = "GRAY";

/// Creates projects in one target organization.
pub struct Importer<'a, T, S> {
    client: &'a GithubClient<T, S>,
    target_org: &'a str,
}

impl<'a, T: Transport, S: Sleeper> Importer<'a, T, S> {
    pub fn new(client: &'a GithubClient<T, S>, target_org: &'a str) -> Self {
        Self { client, target_org }
    }

    /// Create every project of `snapshot`, recording ids into `mapping`.
    ///
    /// Stops at the first failed call; `mapping` then holds what was
    /// created up to that point.
    pub fn import(&self, snapshot: &ProjectSnapshot, mapping: &mut IdentifierMapping) -> Result<()> {
        let span = info_span!("import", source = %snapshot.org, target = %self.target_org);
        let _guard = span.enter();

        match &snapshot.projects {
            Projects::Classic(projects) => {
                for (index, project) in projects.iter().enumerate() {
                    info!(
                        "Importing classic project {}/{}: {}",
                        index + 1,
                        projects.len(),
                        project.name
                    );
                    self.import_classic(project, mapping)?;
                }
            }
            Projects::V2(projects) => {
                if projects.is_empty() {
                    return Ok(());
                }
                let owner_id = self.client.organization_id(self.target_org)?;
                debug!(owner_id = %owner_id, "Resolved target organization");
                for (index, project) in projects.iter().enumerate() {
                    info!(
                        "Importing Projects V2 {}/{}: {}",
                        index + 1,
                        projects.len(),
                        project.title
                    );
                    self.import_v2(&owner_id, project, mapping)?;
                }
            }
        }
        Ok(())
    }

    fn import_classic(
        &self,
        project: &ClassicProject,
        mapping: &mut IdentifierMapping,
    ) -> Result<()> {
        let created = self.client.create_org_project(
            self.target_org,
            &project.name,
            project.body.as_deref(),
        )?;
        info!("  Created project '{}' (ID: {})", created.name, created.id);

        let mut entry = ProjectMapping::new(
            project.id.to_string(),
            project.name.clone(),
            created.id.to_string(),
        );
        entry.target_number = created.number;
        entry.target_url = created.html_url.clone();
        let entry = push_project(mapping, entry);

        for column in &project.columns {
            let new_column = self.client.create_column(created.id, &column.name)?;
            entry
                .columns
                .push(IdMapping::new(column.id.to_string(), new_column.id.to_string()));
            debug!("    Created column '{}' (ID: {})", column.name, new_column.id);

            for card in &column.cards {
                let new_card = self
                    .client
                    .create_note_card(new_column.id, &card_note(card))?;
                entry
                    .items
                    .push(IdMapping::new(card.id.to_string(), new_card.id.to_string()));
                self.client.move_card_to_bottom(new_card.id)?;
            }
            info!("    Column '{}': {} cards.", column.name, column.cards.len());
        }

        if project.is_closed() {
            self.client.close_project(created.id)?;
            debug!("  Closed project {}", created.id);
        }
        Ok(())
    }

    fn import_v2(
        &self,
        owner_id: &str,
        project: &V2Project,
        mapping: &mut IdentifierMapping,
    ) -> Result<()> {
        let created = self.client.create_project_v2(owner_id, &project.title)?;
        info!("  Created project #{} (ID: {})", created.number, created.id);

        let mut entry =
            ProjectMapping::new(project.id.clone(), project.title.clone(), created.id.clone());
        entry.target_number = Some(created.number);
        entry.target_url = created.url.clone();
        let entry = push_project(mapping, entry);

        let details = ProjectUpdate {
            short_description: project.short_description.clone(),
            readme: project.readme.clone(),
            closed: false,
        };
        if !details.is_empty() {
            self.client.update_project_v2(&created.id, &details)?;
        }

        let fields = self.prepare_fields(&created.id, &project.fields, entry)?;

        for item in &project.items {
            let title = item.title().unwrap_or(UNTITLED);
            let body = draft_body(item);
            let item_id = self
                .client
                .add_draft_issue(&created.id, title, body.as_deref())?;
            entry.items.push(IdMapping::new(item.id.clone(), item_id.clone()));
            self.replay_values(&created.id, &item_id, item, &fields)?;
        }
        info!("  Imported {} items.", project.items.len());

        if project.closed {
            let close = ProjectUpdate {
                closed: true,
                ..ProjectUpdate::default()
            };
            self.client.update_project_v2(&created.id, &close)?;
            debug!("  Closed project {}", created.id);
        }
        Ok(())
    }

    /// Match source fields to target fields by name, creating the missing
    /// ones whose kind can be created.
    fn prepare_fields(
        &self,
        project_id: &str,
        source_fields: &[V2Field],
        entry: &mut ProjectMapping,
    ) -> Result<HashMap<String, TargetField>> {
        let mut targets: HashMap<String, TargetField> = self
            .client
            .list_project_fields(project_id)?
            .into_iter()
            .filter_map(TargetField::from_node)
            .map(|field| (field.name.clone(), field))
            .collect();

        for field in source_fields {
            if let Some(existing) = targets.get(&field.name) {
                entry
                    .fields
                    .push(IdMapping::new(field.id.clone(), existing.id.clone()));
                continue;
            }
            if !CREATABLE_FIELD_TYPES.contains(&field.data_type.as_str()) {
                debug!(
                    "    Skipping field '{}' of kind {}",
                    field.name, field.data_type
                );
                continue;
            }

            let options: Vec<NewOption> = field
                .options
                .iter()
                .map(|option| NewOption {
                    name: option.name.clone(),
                    color: option
                        .color
                        .clone()
                        .unwrap_or_else(|| DEFAULT_OPTION_COLOR.to_string()),
                    description: option.description.clone().unwrap_or_default(),
                })
                .collect();
            let node = self
                .client
                .create_field(project_id, &field.name, &field.data_type, &options)?;
            let Some(created) = TargetField::from_node(node) else {
                warn!("    Field '{}' was created without an id", field.name);
                continue;
            };
            debug!("    Created field '{}' (ID: {})", field.name, created.id);
            entry
                .fields
                .push(IdMapping::new(field.id.clone(), created.id.clone()));
            targets.insert(created.name.clone(), created);
        }
        Ok(targets)
    }

    fn replay_values(
        &self,
        project_id: &str,
        item_id: &str,
        item: &V2Item,
        fields: &HashMap<String, TargetField>,
    ) -> Result<()> {
        for value in &item.field_values {
            let Some(field) = fields.get(&value.field) else {
                continue;
            };
            let input = match (&value.value, field.data_type.as_str()) {
                (FieldValueKind::Text(text), "TEXT") => FieldInput::Text(text.clone()),
                (FieldValueKind::Number(number), "NUMBER") => FieldInput::Number(*number),
                (FieldValueKind::Date(date), "DATE") => FieldInput::Date(date.clone()),
                (FieldValueKind::SingleSelect(name), "SINGLE_SELECT") => {
                    match field.options.iter().find(|option| &option.name == name) {
                        Some(option) => FieldInput::SingleSelectOption(option.id.clone()),
                        None => {
                            warn!(
                                "    Option '{}' missing from field '{}'; value not set",
                                name, field.name
                            );
                            continue;
                        }
                    }
                }
                // Carried by the draft issue title.
                (_, "TITLE") => continue,
                (kind, data_type) => {
                    warn!(
                        "    {} value of '{}' does not fit target field kind {}; value not set",
                        kind.label(),
                        field.name,
                        data_type
                    );
                    continue;
                }
            };
            self.client
                .set_item_field_value(project_id, item_id, &field.id, &input)?;
        }
        Ok(())
    }
}

/// Check that the snapshot holds the project type the caller asked for.
pub fn check_type(snapshot: &ProjectSnapshot, expected: Option<ProjectType>) -> Result<()> {
    match expected {
        Some(expected) if expected != snapshot.project_type() => Err(MigrateError::TypeMismatch {
            expected,
            found: snapshot.project_type(),
        }),
        _ => Ok(()),
    }
}

/// Import `snapshot` into `target_org` and write the mapping to
/// `mapping_path`, also when the import stops early.
pub fn import_to_file<T: Transport, S: Sleeper>(
    client: &GithubClient<T, S>,
    snapshot: &ProjectSnapshot,
    target_org: &str,
    expected: Option<ProjectType>,
    mapping_path: &Path,
) -> Result<IdentifierMapping> {
    check_type(snapshot, expected)?;

    let mut mapping =
        IdentifierMapping::new(&snapshot.org, target_org, snapshot.project_type());
    let outcome = Importer::new(client, target_org).import(snapshot, &mut mapping);

    match outcome {
        Ok(()) => {
            mapping.finish(true);
            save_mapping(&mapping, mapping_path)?;
            info!(
                projects = mapping.projects.len(),
                items = mapping.item_count(),
                "Mapping written to {}",
                mapping_path.display()
            );
            Ok(mapping)
        }
        Err(err) => {
            mapping.finish(false);
            if let Err(save_err) = save_mapping(&mapping, mapping_path) {
                error!("Could not write partial mapping: {save_err}");
                return Err(err);
            }
            warn!(
                projects = mapping.projects.len(),
                items = mapping.item_count(),
                "Import stopped; partial mapping written to {}",
                mapping_path.display()
            );
            Err(MigrateError::Interrupted {
                mapping_path: PathBuf::from(mapping_path),
                source: Box::new(err),
            })
        }
    }
}

/// Load and validate the snapshot at `snapshot_path`, then import it.
///
/// Nothing is sent to GitHub unless the snapshot decodes, validates and has
/// the expected type.
pub fn import_from_file<T: Transport, S: Sleeper>(
    client: &GithubClient<T, S>,
    snapshot_path: &Path,
    target_org: &str,
    expected: Option<ProjectType>,
    mapping_path: &Path,
) -> Result<IdentifierMapping> {
    let snapshot = load_snapshot(snapshot_path)?;
    info!(
        org = %snapshot.org,
        project_type = %snapshot.project_type(),
        projects = snapshot.project_count(),
        items = snapshot.item_count(),
        "Loaded snapshot {}",
        snapshot_path.display()
    );
    import_to_file(client, &snapshot, target_org, expected, mapping_path)
}

/// Field of the target project as needed for setting values.
#[derive(Debug, Clone)]
struct TargetField {
    id: String,
    name: String,
    data_type: String,
    options: Vec<OptionNode>,
}

impl TargetField {
    fn from_node(node: FieldNode) -> Option<Self> {
        Some(Self {
            id: node.id?,
            name: node.name?,
            data_type: node.data_type.unwrap_or_default(),
            options: node.options,
        })
    }
}

fn push_project(mapping: &mut IdentifierMapping, project: ProjectMapping) -> &mut ProjectMapping {
    mapping.projects.push(project);
    let last = mapping.projects.len() - 1;
    &mut mapping.projects[last]
}

/// Note text for a recreated card. Content cards keep their issue or pull
/// request URL since content ids are not valid in another organization.
fn card_note(card: &ClassicCard) -> String {
    let note = card.note.as_deref().filter(|n| !n.trim().is_empty());
    match (note, card.content_url.as_deref()) {
        (Some(note), Some(url)) => format!("{note}\n\n{url}"),
        (Some(note), None) => note.to_string(),
        (None, Some(url)) => url.to_string(),
        (None, None) => UNTITLED.to_string(),
    }
}

/// Body for the draft issue that replaces `item`. Issues and pull requests
/// get a trailing line pointing at where they came from.
fn draft_body(item: &V2Item) -> Option<String> {
    let content = item.content.as_ref()?;
    let body = content.body.as_deref().filter(|b| !b.trim().is_empty());
    let reference = content.url.as_deref().map(|url| {
        match (content.repository.as_deref(), content.number) {
            (Some(repo), Some(number)) => format!("Originally {repo}#{number}: {url}"),
            _ => format!("Originally: {url}"),
        }
    });
    match (body, reference) {
        (Some(body), Some(reference)) => Some(format!("{body}\n\n{reference}")),
        (Some(body), None) => Some(body.to_string()),
        (None, Some(reference)) => Some(reference),
        (None, None) => None,
    }
}
