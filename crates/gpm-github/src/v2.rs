//! Projects V2 (GraphQL).

use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::client::{Connection, GithubClient};
use crate::error::{ClientError, Result};
use crate::retry::Sleeper;
use crate::transport::Transport;

const FIELD_SELECTION: &str = r"
    ... on ProjectV2FieldCommon { id name dataType }
    ... on ProjectV2SingleSelectField { options { id name color description } }
";

const LIST_PROJECTS: &str = r"
query($org: String!, $cursor: String) {
  organization(login: $org) {
    projectsV2(first: 20, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      nodes {
        id
        number
        title
        shortDescription
        readme
        url
        closed
        fields(first: 100) {
          nodes {
            ... on ProjectV2FieldCommon { id name dataType }
            ... on ProjectV2SingleSelectField { options { id name color description } }
          }
        }
      }
    }
  }
}
";

const LIST_ITEMS: &str = r"
query($projectId: ID!, $cursor: String) {
  node(id: $projectId) {
    ... on ProjectV2 {
      items(first: 100, after: $cursor) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          type
          isArchived
          fieldValues(first: 50) {
            nodes {
              ... on ProjectV2ItemFieldTextValue {
                text
                field { ... on ProjectV2FieldCommon { name } }
              }
              ... on ProjectV2ItemFieldNumberValue {
                number
                field { ... on ProjectV2FieldCommon { name } }
              }
              ... on ProjectV2ItemFieldDateValue {
                date
                field { ... on ProjectV2FieldCommon { name } }
              }
              ... on ProjectV2ItemFieldSingleSelectValue {
                name
                field { ... on ProjectV2FieldCommon { name } }
              }
            }
          }
          content {
            ... on DraftIssue { title body }
            ... on Issue { title body number url repository { name } }
            ... on PullRequest { title body number url repository { name } }
          }
        }
      }
    }
  }
}
";

const ORGANIZATION_ID: &str = r"
query($login: String!) {
  organization(login: $login) { id }
}
";

const CREATE_PROJECT: &str = r"
mutation($input: CreateProjectV2Input!) {
  createProjectV2(input: $input) {
    projectV2 { id number url }
  }
}
";

const UPDATE_PROJECT: &str = r"
mutation($input: UpdateProjectV2Input!) {
  updateProjectV2(input: $input) {
    projectV2 { id }
  }
}
";

const ADD_DRAFT_ISSUE: &str = r"
mutation($input: AddProjectV2DraftIssueInput!) {
  addProjectV2DraftIssue(input: $input) {
    projectItem { id }
  }
}
";

const UPDATE_ITEM_FIELD: &str = r"
mutation($input: UpdateProjectV2ItemFieldValueInput!) {
  updateProjectV2ItemFieldValue(input: $input) {
    projectV2Item { id }
  }
}
";

const ADD_ITEM_BY_ID: &str = r"
mutation($input: AddProjectV2ItemByIdInput!) {
  addProjectV2ItemById(input: $input) {
    item { id }
  }
}
";

/// Projects V2 board with its field definitions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNode {
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
    pub fields: Connection<FieldNode>,
}

/// Field definition. Every field type implements `ProjectV2FieldCommon`, so
/// `id`, `name` and `dataType` are present in practice.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemNode {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub field_values: Connection<FieldValueNode>,
    #[serde(default)]
    pub content: Option<ContentNode>,
}

/// One of the text, number, date or single-select value shapes; the others
/// deserialize to an empty node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldValueNode {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub number: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    /// Selected option name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub field: Option<NamedRef>,
}

impl FieldValueNode {
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        self.field.as_ref().and_then(|f| f.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// Draft issue, issue or pull request content. Redacted items come back empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentNode {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub repository: Option<NamedRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedProject {
    pub id: String,
    pub number: u64,
    #[serde(default)]
    pub url: Option<String>,
}

/// Optional settings applied after a project is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub short_description: Option<String>,
    pub readme: Option<String>,
    pub closed: bool,
}

impl ProjectUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.short_description.is_none() && self.readme.is_none() && !self.closed
    }
}

/// Option for a new single-select field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOption {
    pub name: String,
    /// `ProjectV2SingleSelectFieldOptionColor`, e.g. `GRAY`.
    pub color: String,
    pub description: String,
}

/// Value for `updateProjectV2ItemFieldValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Text(String),
    Number(f64),
    Date(String),
    SingleSelectOption(String),
}

impl FieldInput {
    fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => json!({ "text": text }),
            Self::Number(number) => json!({ "number": number }),
            Self::Date(date) => json!({ "date": date }),
            Self::SingleSelectOption(id) => json!({ "singleSelectOptionId": id }),
        }
    }
}

#[derive(Deserialize)]
struct OrganizationProjects {
    organization: Option<ProjectsHolder>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectsHolder {
    projects_v2: Connection<ProjectNode>,
}

#[derive(Deserialize)]
struct NodeItems {
    node: Option<ItemsHolder>,
}

#[derive(Deserialize)]
struct ItemsHolder {
    items: Option<Connection<ItemNode>>,
}

#[derive(Deserialize)]
struct NodeFields {
    node: Option<FieldsHolder>,
}

#[derive(Deserialize)]
struct FieldsHolder {
    fields: Option<Connection<FieldNode>>,
}

#[derive(Deserialize)]
struct OrganizationId {
    organization: Option<IdHolder>,
}

#[derive(Deserialize)]
struct IdHolder {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateProjectData {
    create_project_v2: ProjectV2Holder,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectV2Holder {
    project_v2: CreatedProject,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFieldData {
    create_project_v2_field: FieldHolder,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldHolder {
    project_v2_field: FieldNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddDraftData {
    add_project_v2_draft_issue: ProjectItemHolder,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectItemHolder {
    project_item: IdHolder,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemData {
    add_project_v2_item_by_id: ItemHolder,
}

#[derive(Deserialize)]
struct ItemHolder {
    item: IdHolder,
}

impl<T: Transport, S: Sleeper> GithubClient<T, S> {
    /// Every Projects V2 board of an organization with its fields.
    pub fn list_projects_v2(&self, org: &str) -> Result<Vec<ProjectNode>> {
        let mut variables = Map::new();
        variables.insert("org".to_string(), json!(org));
        self.graphql_pages(LIST_PROJECTS, variables, |data: OrganizationProjects| {
            data.organization.map(|o| o.projects_v2)
        })
    }

    /// Every item of a Projects V2 board, in board order.
    pub fn list_project_items(&self, project_id: &str) -> Result<Vec<ItemNode>> {
        let mut variables = Map::new();
        variables.insert("projectId".to_string(), json!(project_id));
        self.graphql_pages(LIST_ITEMS, variables, |data: NodeItems| {
            data.node.and_then(|n| n.items)
        })
    }

    /// Field definitions of a board (including built-in ones).
    pub fn list_project_fields(&self, project_id: &str) -> Result<Vec<FieldNode>> {
        let query = format!(
            "query($projectId: ID!) {{ node(id: $projectId) {{ ... on ProjectV2 {{ fields(first: 100) {{ nodes {{ {FIELD_SELECTION} }} }} }} }} }}"
        );
        let data: NodeFields = self.graphql(&query, json!({ "projectId": project_id }))?;
        let connection = data
            .node
            .and_then(|n| n.fields)
            .ok_or_else(|| ClientError::Decode {
                url: self.graphql_url().to_string(),
                reason: format!("project {project_id} not found"),
            })?;
        Ok(connection.into_nodes())
    }

    /// GraphQL node id of an organization.
    pub fn organization_id(&self, login: &str) -> Result<String> {
        let data: OrganizationId = self.graphql(ORGANIZATION_ID, json!({ "login": login }))?;
        data.organization
            .map(|o| o.id)
            .ok_or_else(|| ClientError::Decode {
                url: self.graphql_url().to_string(),
                reason: format!("organization {login} not found"),
            })
    }

    pub fn create_project_v2(&self, owner_id: &str, title: &str) -> Result<CreatedProject> {
        let data: CreateProjectData = self.graphql(
            CREATE_PROJECT,
            json!({ "input": { "ownerId": owner_id, "title": title } }),
        )?;
        Ok(data.create_project_v2.project_v2)
    }

    pub fn update_project_v2(&self, project_id: &str, update: &ProjectUpdate) -> Result<()> {
        let mut input = Map::new();
        input.insert("projectId".to_string(), json!(project_id));
        if let Some(description) = &update.short_description {
            input.insert("shortDescription".to_string(), json!(description));
        }
        if let Some(readme) = &update.readme {
            input.insert("readme".to_string(), json!(readme));
        }
        if update.closed {
            input.insert("closed".to_string(), json!(true));
        }
        let _: Value = self.graphql(UPDATE_PROJECT, json!({ "input": input }))?;
        Ok(())
    }

    pub fn create_field(
        &self,
        project_id: &str,
        name: &str,
        data_type: &str,
        options: &[NewOption],
    ) -> Result<FieldNode> {
        let query = format!(
            "mutation($input: CreateProjectV2FieldInput!) {{ createProjectV2Field(input: $input) {{ projectV2Field {{ {FIELD_SELECTION} }} }} }}"
        );
        let mut input = Map::new();
        input.insert("projectId".to_string(), json!(project_id));
        input.insert("dataType".to_string(), json!(data_type));
        input.insert("name".to_string(), json!(name));
        if !options.is_empty() {
            let options: Vec<Value> = options
                .iter()
                .map(|o| json!({ "name": o.name, "color": o.color, "description": o.description }))
                .collect();
            input.insert("singleSelectOptions".to_string(), Value::Array(options));
        }
        let data: CreateFieldData = self.graphql(&query, json!({ "input": input }))?;
        Ok(data.create_project_v2_field.project_v2_field)
    }

    /// Add a draft issue; returns the new item id.
    pub fn add_draft_issue(
        &self,
        project_id: &str,
        title: &str,
        body: Option<&str>,
    ) -> Result<String> {
        let mut input = Map::new();
        input.insert("projectId".to_string(), json!(project_id));
        input.insert("title".to_string(), json!(title));
        if let Some(body) = body {
            input.insert("body".to_string(), json!(body));
        }
        let data: AddDraftData = self.graphql(ADD_DRAFT_ISSUE, json!({ "input": input }))?;
        Ok(data.add_project_v2_draft_issue.project_item.id)
    }

    pub fn set_item_field_value(
        &self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        value: &FieldInput,
    ) -> Result<()> {
        let _: Value = self.graphql(
            UPDATE_ITEM_FIELD,
            json!({
                "input": {
                    "projectId": project_id,
                    "itemId": item_id,
                    "fieldId": field_id,
                    "value": value.to_json(),
                }
            }),
        )?;
        Ok(())
    }

    /// Add an existing issue or pull request to a board; returns the item id.
    pub fn add_item_by_id(&self, project_id: &str, content_id: &str) -> Result<String> {
        let data: AddItemData = self.graphql(
            ADD_ITEM_BY_ID,
            json!({ "input": { "projectId": project_id, "contentId": content_id } }),
        )?;
        Ok(data.add_project_v2_item_by_id.item.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_input_shapes() {
        assert_eq!(
            FieldInput::SingleSelectOption("opt1".to_string()).to_json(),
            json!({ "singleSelectOptionId": "opt1" })
        );
        assert_eq!(FieldInput::Number(3.5).to_json(), json!({ "number": 3.5 }));
    }

    #[test]
    fn item_node_decodes_redacted_content() {
        let item: ItemNode = serde_json::from_str(
            r#"{"id": "PVTI_1", "type": "REDACTED", "fieldValues": {"nodes": [{}]}, "content": {}}"#,
        )
        .unwrap();
        assert_eq!(item.item_type, "REDACTED");
        assert!(item.content.unwrap().title.is_none());
        assert!(item.field_values.into_nodes()[0].field_name().is_none());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(ProjectUpdate::default().is_empty());
        assert!(
            !ProjectUpdate {
                closed: true,
                ..ProjectUpdate::default()
            }
            .is_empty()
        );
    }
}
