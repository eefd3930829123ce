//! Repository issues and their Projects V2 membership.

use serde::Deserialize;
use serde_json::{Map, json};

use crate::client::{Connection, GithubClient};
use crate::error::Result;
use crate::retry::Sleeper;
use crate::transport::Transport;

const LIST_ISSUES: &str = r"
query($owner: String!, $repo: String!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    issues(first: 100, after: $cursor) {
      pageInfo { hasNextPage endCursor }
      nodes {
        id
        number
        title
        url
        state
        projectItems(first: 20) {
          nodes {
            project { number }
          }
        }
      }
    }
  }
}
";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    /// GraphQL node id, used as `contentId` when linking.
    pub id: String,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: String,
    #[serde(default)]
    pub project_items: Connection<ProjectItemRef>,
}

impl IssueNode {
    /// Whether the issue is an item on the board with this number.
    #[must_use]
    pub fn in_project(&self, project_number: u64) -> bool {
        self.project_items
            .nodes
            .iter()
            .flatten()
            .filter_map(|item| item.project.as_ref())
            .any(|project| project.number == Some(project_number))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectItemRef {
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRef {
    #[serde(default)]
    pub number: Option<u64>,
}

#[derive(Deserialize)]
struct RepositoryIssues {
    repository: Option<IssuesHolder>,
}

#[derive(Deserialize)]
struct IssuesHolder {
    issues: Connection<IssueNode>,
}

impl<T: Transport, S: Sleeper> GithubClient<T, S> {
    /// Every issue of a repository, open and closed.
    pub fn list_repository_issues(&self, owner: &str, repo: &str) -> Result<Vec<IssueNode>> {
        let mut variables = Map::new();
        variables.insert("owner".to_string(), json!(owner));
        variables.insert("repo".to_string(), json!(repo));
        self.graphql_pages(LIST_ISSUES, variables, |data: RepositoryIssues| {
            data.repository.map(|r| r.issues)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_membership() {
        let issue: IssueNode = serde_json::from_str(
            r#"{
                "id": "I_1", "number": 7, "title": "Crash", "url": "https://github.com/acme/web/issues/7",
                "state": "OPEN",
                "projectItems": {"nodes": [{"project": {"number": 3}}, null]}
            }"#,
        )
        .unwrap();
        assert!(issue.in_project(3));
        assert!(!issue.in_project(1));
    }
}
