//! Classic project boards (REST).

use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::GithubClient;
use crate::error::Result;
use crate::retry::Sleeper;
use crate::transport::Transport;

/// Classic project as returned by the REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct RestProject {
    pub id: u64,
    #[serde(default)]
    pub number: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default = "open_state")]
    pub state: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

fn open_state() -> String {
    "open".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestColumn {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestCard {
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

impl<T: Transport, S: Sleeper> GithubClient<T, S> {
    /// All classic projects of an organization, open and closed.
    pub fn list_org_projects(&self, org: &str) -> Result<Vec<RestProject>> {
        self.get_all(&format!("/orgs/{org}/projects?state=all"))
    }

    pub fn list_columns(&self, project_id: u64) -> Result<Vec<RestColumn>> {
        self.get_all(&format!("/projects/{project_id}/columns"))
    }

    /// Cards of a column, top to bottom.
    pub fn list_cards(&self, column_id: u64) -> Result<Vec<RestCard>> {
        self.get_all(&format!("/projects/columns/{column_id}/cards"))
    }

    pub fn create_org_project(
        &self,
        org: &str,
        name: &str,
        body: Option<&str>,
    ) -> Result<RestProject> {
        self.post(
            &format!("/orgs/{org}/projects"),
            json!({ "name": name, "body": body.unwrap_or_default() }),
        )
    }

    pub fn close_project(&self, project_id: u64) -> Result<RestProject> {
        self.patch(
            &format!("/projects/{project_id}"),
            json!({ "state": "closed" }),
        )
    }

    pub fn create_column(&self, project_id: u64, name: &str) -> Result<RestColumn> {
        self.post(
            &format!("/projects/{project_id}/columns"),
            json!({ "name": name }),
        )
    }

    pub fn create_note_card(&self, column_id: u64, note: &str) -> Result<RestCard> {
        self.post(
            &format!("/projects/columns/{column_id}/cards"),
            json!({ "note": note }),
        )
    }

    /// Move a card to the bottom of its column.
    pub fn move_card_to_bottom(&self, card_id: u64) -> Result<()> {
        let _: Value = self.post(
            &format!("/projects/columns/cards/{card_id}/moves"),
            json!({ "position": "bottom" }),
        )?;
        Ok(())
    }
}
