//! In-memory GitHub used by the migration tests.
//!
//! Serves fixed source data for the list endpoints and hands out fresh ids
//! for every create call, so one fake can act as both organizations.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use gpm_github::{
    ApiRequest, ApiResponse, GithubClient, RetryPolicy, Sleeper, Transport, TransportError,
};
use serde_json::{Value, json};

pub const API_URL: &str = "https://api.example.test";
pub const GRAPHQL_URL: &str = "https://api.example.test/graphql";

#[derive(Default)]
pub struct FakeGithub {
    classic_projects: Vec<Value>,
    columns: HashMap<u64, Vec<Value>>,
    cards: HashMap<u64, Vec<Value>>,
    v2_projects: Vec<Value>,
    v2_items: HashMap<String, Vec<Value>>,
    /// Fields every newly created V2 project starts with.
    default_fields: Vec<Value>,
    issues: Vec<Value>,
    /// Fail the n-th request whose URL or body contains the marker.
    failure: Option<(String, usize)>,
    state: RefCell<FakeState>,
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    marker_hits: usize,
    requests: Vec<ApiRequest>,
}

impl FakeGithub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two boards: "Roadmap" (open, 2 columns, 4 cards) and "Archive"
    /// (closed, 1 column, 1 card). Five cards in total.
    pub fn classic_fixture() -> Self {
        let mut fake = Self::new();
        fake.classic_projects = vec![
            json!({"id": 1, "number": 1, "name": "Roadmap", "body": "Q3 plans", "state": "open"}),
            json!({"id": 2, "number": 2, "name": "Archive", "body": "", "state": "closed"}),
        ];
        fake.columns.insert(
            1,
            vec![
                json!({"id": 11, "name": "To do"}),
                json!({"id": 12, "name": "Done"}),
            ],
        );
        fake.columns.insert(2, vec![json!({"id": 21, "name": "Old"})]);
        fake.cards.insert(
            11,
            vec![
                json!({"id": 101, "note": "Write docs"}),
                json!({"id": 102, "note": "Fix login",
                       "content_url": "https://api.example.test/repos/src/web/issues/5"}),
                json!({"id": 103, "note": null,
                       "content_url": "https://api.example.test/repos/src/web/issues/6"}),
            ],
        );
        fake.cards
            .insert(12, vec![json!({"id": 104, "note": "Ship v1", "archived": true})]);
        fake.cards
            .insert(21, vec![json!({"id": 201, "note": "Legacy task"})]);
        fake
    }

    /// One board with a Status single-select and an Estimate number field,
    /// holding a draft, an issue and a redacted item.
    pub fn v2_fixture() -> Self {
        let mut fake = Self::new();
        fake.v2_projects = vec![json!({
            "id": "PVT_src1",
            "number": 4,
            "title": "Platform",
            "shortDescription": "Platform team board",
            "readme": "",
            "url": "https://github.com/orgs/src/projects/4",
            "closed": false,
            "fields": {"nodes": [
                {"id": "F_title", "name": "Title", "dataType": "TITLE"},
                {"id": "F_status", "name": "Status", "dataType": "SINGLE_SELECT", "options": [
                    {"id": "o1", "name": "Todo", "color": "GRAY", "description": ""},
                    {"id": "o2", "name": "Blocked", "color": "RED", "description": "Waiting"}
                ]},
                {"id": "F_est", "name": "Estimate", "dataType": "NUMBER"},
                {"id": "F_iter", "name": "Sprint", "dataType": "ITERATION"}
            ]}
        })];
        fake.v2_items.insert(
            "PVT_src1".to_string(),
            vec![
                json!({
                    "id": "PVTI_a", "type": "DRAFT_ISSUE", "isArchived": false,
                    "fieldValues": {"nodes": [
                        {"text": "Plan migration", "field": {"name": "Title"}},
                        {"name": "Blocked", "field": {"name": "Status"}},
                        {"number": 5.0, "field": {"name": "Estimate"}}
                    ]},
                    "content": {"title": "Plan migration", "body": "Draft body"}
                }),
                json!({
                    "id": "PVTI_b", "type": "ISSUE", "isArchived": true,
                    "fieldValues": {"nodes": [{"name": "Todo", "field": {"name": "Status"}}]},
                    "content": {"title": "Crash on start", "body": "", "number": 42,
                                "url": "https://github.com/src/web/issues/42",
                                "repository": {"name": "web"}}
                }),
                json!({
                    "id": "PVTI_c", "type": "REDACTED", "isArchived": false,
                    "fieldValues": {"nodes": []},
                    "content": null
                }),
            ],
        );
        fake.default_fields = vec![
            json!({"id": "TF_title", "name": "Title", "dataType": "TITLE"}),
            json!({"id": "TF_status", "name": "Status", "dataType": "SINGLE_SELECT", "options": [
                {"id": "to1", "name": "Todo", "color": "GRAY", "description": ""},
                {"id": "to2", "name": "Done", "color": "GREEN", "description": ""}
            ]}),
        ];
        fake
    }

    pub fn with_issues(mut self, issues: Vec<Value>) -> Self {
        self.issues = issues;
        self
    }

    pub fn fail_on(mut self, marker: &str, nth: usize) -> Self {
        self.failure = Some((marker.to_string(), nth));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.borrow().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.borrow().requests.len()
    }

    /// Requests whose GraphQL query or REST URL contains `marker`.
    pub fn requests_matching(&self, marker: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request_text(request).contains(marker))
            .collect()
    }

    fn rest(&self, request: &ApiRequest, state: &mut FakeState) -> (u16, Value) {
        let path = request
            .url
            .trim_start_matches(API_URL)
            .split('?')
            .next()
            .unwrap_or_default();
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let body = request.body.clone().unwrap_or(Value::Null);

        match (request.method.as_str(), segments.as_slice()) {
            ("GET", ["orgs", _, "projects"]) => (200, Value::Array(self.classic_projects.clone())),
            ("GET", ["projects", id, "columns"]) => (200, listed(&self.columns, id)),
            ("GET", ["projects", "columns", id, "cards"]) => (200, listed(&self.cards, id)),
            ("POST", ["orgs", org, "projects"]) => {
                let id = state.next();
                (
                    201,
                    json!({
                        "id": id, "number": id, "name": body["name"], "body": body["body"],
                        "state": "open",
                        "html_url": format!("https://github.com/orgs/{org}/projects/{id}")
                    }),
                )
            }
            ("PATCH", ["projects", id]) => {
                (200, json!({"id": id.parse::<u64>().unwrap(), "name": "x", "state": body["state"]}))
            }
            ("POST", ["projects", _, "columns"]) => {
                (201, json!({"id": state.next(), "name": body["name"]}))
            }
            ("POST", ["projects", "columns", "cards", _, "moves"]) => (201, json!({})),
            ("POST", ["projects", "columns", _, "cards"]) => {
                (201, json!({"id": state.next(), "note": body["note"]}))
            }
            _ => (404, json!({"message": "Not Found"})),
        }
    }

    fn graphql(&self, request: &ApiRequest, state: &mut FakeState) -> Value {
        let body = request.body.clone().unwrap_or(Value::Null);
        let query = body["query"].as_str().unwrap_or_default();
        let variables = &body["variables"];
        let input = &variables["input"];
        let done = json!({"hasNextPage": false, "endCursor": null});

        let data = if query.contains("createProjectV2Field(") {
            let options: Vec<Value> = input["singleSelectOptions"]
                .as_array()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|option| {
                    json!({
                        "id": format!("OPT_{}", state.next()),
                        "name": option["name"],
                        "color": option["color"],
                        "description": option["description"],
                    })
                })
                .collect();
            json!({"createProjectV2Field": {"projectV2Field": {
                "id": format!("F_{}", state.next()),
                "name": input["name"],
                "dataType": input["dataType"],
                "options": options,
            }}})
        } else if query.contains("createProjectV2(") {
            let id = state.next();
            json!({"createProjectV2": {"projectV2": {
                "id": format!("PVT_{id}"),
                "number": id,
                "url": format!("https://github.com/orgs/dst/projects/{id}"),
            }}})
        } else if query.contains("updateProjectV2ItemFieldValue(") {
            json!({"updateProjectV2ItemFieldValue": {"projectV2Item": {"id": input["itemId"]}}})
        } else if query.contains("updateProjectV2(") {
            json!({"updateProjectV2": {"projectV2": {"id": input["projectId"]}}})
        } else if query.contains("addProjectV2DraftIssue(") {
            json!({"addProjectV2DraftIssue": {"projectItem": {"id": format!("PVTI_{}", state.next())}}})
        } else if query.contains("addProjectV2ItemById(") {
            json!({"addProjectV2ItemById": {"item": {"id": format!("PVTI_{}", state.next())}}})
        } else if query.contains("projectsV2(") {
            json!({"organization": {"projectsV2": {"pageInfo": done, "nodes": self.v2_projects}}})
        } else if query.contains("items(first") {
            let project = variables["projectId"].as_str().unwrap_or_default();
            let items = self.v2_items.get(project).cloned().unwrap_or_default();
            json!({"node": {"items": {"pageInfo": done, "nodes": items}}})
        } else if query.contains("issues(first") {
            json!({"repository": {"issues": {"pageInfo": done, "nodes": self.issues}}})
        } else if query.contains("organization(login") {
            json!({"organization": {"id": "O_target"}})
        } else if query.contains("fields(first") {
            json!({"node": {"fields": {"nodes": self.default_fields}}})
        } else {
            return json!({"errors": [{"message": format!("unexpected query: {query}")}]});
        };
        json!({ "data": data })
    }
}

impl FakeState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        9000 + self.next_id
    }
}

impl Transport for FakeGithub {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.clone());

        if let Some((marker, nth)) = &self.failure {
            if request_text(request).contains(marker.as_str()) {
                state.marker_hits += 1;
                if state.marker_hits == *nth {
                    return Ok(ApiResponse::new(422, r#"{"message": "Validation Failed"}"#));
                }
            }
        }

        if request.url == GRAPHQL_URL {
            let body = self.graphql(request, &mut state);
            Ok(ApiResponse::new(200, body.to_string()))
        } else {
            let (status, body) = self.rest(request, &mut state);
            Ok(ApiResponse::new(status, body.to_string()))
        }
    }
}

fn listed(table: &HashMap<u64, Vec<Value>>, id: &str) -> Value {
    let id: u64 = id.parse().unwrap();
    Value::Array(table.get(&id).cloned().unwrap_or_default())
}

fn request_text(request: &ApiRequest) -> String {
    match &request.body {
        Some(body) => format!("{} {}", request.url, body),
        None => request.url.clone(),
    }
}

/// Sleeper that returns immediately.
pub struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

pub fn client(fake: &FakeGithub) -> GithubClient<&FakeGithub, NoSleep> {
    GithubClient::with_transport(
        fake,
        NoSleep,
        RetryPolicy {
            max_rate_limit_retries: 1,
            max_network_retries: 1,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        },
        API_URL,
        GRAPHQL_URL,
    )
}
