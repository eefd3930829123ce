//! Retry bounds and pagination against a scripted GitHub.

mod common;

use std::time::Duration;

use gpm_github::{ApiResponse, ClientError, RestProject};
use serde_json::{Value, json};

use common::{RecordingSleeper, ScriptedTransport, client, policy};

#[test]
fn repeated_429_stops_at_configured_maximum() {
    let transport = ScriptedTransport::new();
    for _ in 0..10 {
        transport.respond(ApiResponse::new(429, r#"{"message": "slow down"}"#));
    }
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(3, 2));

    let err = github.get::<Value>("/orgs/acme/projects").unwrap_err();

    match err {
        ClientError::RateLimited { attempts, .. } => assert_eq!(attempts, 4),
        other => panic!("expected rate limit error, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 4);
    assert_eq!(
        sleeper.sleeps(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
}

#[test]
fn rate_limit_waits_for_retry_after_then_succeeds() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            ApiResponse::new(403, r#"{"message": "secondary rate limit"}"#)
                .with_header("Retry-After", "7"),
        )
        .respond_json(200, json!({"id": 1}));
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(3, 2));

    let value: Value = github.get("/projects/1").unwrap();

    assert_eq!(value["id"], 1);
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(7)]);
}

#[test]
fn server_wait_replaces_backoff_on_every_retry() {
    let transport = ScriptedTransport::new();
    for _ in 0..3 {
        transport.respond(ApiResponse::new(429, "").with_header("Retry-After", "1"));
    }
    transport.respond_json(200, json!({"id": 1}));
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(5, 2));

    let _: Value = github.get("/projects/1").unwrap();

    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(1); 3]);
}

#[test]
fn server_wait_is_capped_at_max_delay() {
    let transport = ScriptedTransport::new();
    transport
        .respond(ApiResponse::new(429, "").with_header("Retry-After", "3600"))
        .respond_json(200, json!({"id": 1}));
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(5, 2));

    let _: Value = github.get("/projects/1").unwrap();

    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(60)]);
}

#[test]
fn network_errors_use_the_smaller_budget() {
    let transport = ScriptedTransport::new();
    for _ in 0..5 {
        transport.fail("connection reset by peer");
    }
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(5, 2));

    let err = github.get::<Value>("/projects/1").unwrap_err();

    match err {
        ClientError::Network { attempts, message, .. } => {
            assert_eq!(attempts, 3);
            assert!(message.contains("connection reset"));
        }
        other => panic!("expected network error, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 3);
}

#[test]
fn server_error_recovers_within_budget() {
    let transport = ScriptedTransport::new();
    transport
        .respond(ApiResponse::new(502, "bad gateway"))
        .respond_json(200, json!({"ok": true}));
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(3, 2));

    let value: Value = github.get("/meta").unwrap();

    assert_eq!(value["ok"], true);
    assert_eq!(sleeper.sleeps().len(), 1);
}

#[test]
fn persistent_server_error_becomes_api_error() {
    let transport = ScriptedTransport::new();
    for _ in 0..3 {
        transport.respond(ApiResponse::new(503, r#"{"message": "unavailable"}"#));
    }
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(3, 2));

    let err = github.get::<Value>("/meta").unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 503, .. }));
    assert_eq!(transport.request_count(), 3);
}

#[test]
fn not_found_is_not_retried() {
    let transport = ScriptedTransport::new();
    transport.respond(ApiResponse::new(404, r#"{"message": "Not Found"}"#));
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(3, 3));

    let err = github.get::<Value>("/orgs/missing/projects").unwrap_err();

    match err {
        ClientError::Api { status, message, url } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
            assert_eq!(url, "https://api.example.test/orgs/missing/projects");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    assert!(sleeper.sleeps().is_empty());
}

#[test]
fn rest_pagination_follows_next_links() {
    let transport = ScriptedTransport::new();
    transport
        .respond(
            ApiResponse::new(200, json!([{"id": 1, "name": "One"}]).to_string()).with_header(
                "Link",
                r#"<https://api.example.test/orgs/acme/projects?page=2>; rel="next""#,
            ),
        )
        .respond(
            ApiResponse::new(200, json!([{"id": 2, "name": "Two", "state": "closed"}]).to_string())
                .with_header(
                    "Link",
                    r#"<https://api.example.test/orgs/acme/projects?page=1>; rel="prev""#,
                ),
        );
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(1, 1));

    let projects = github.list_org_projects("acme").unwrap();

    let names: Vec<_> = projects.iter().map(|p: &RestProject| p.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Two"]);
    assert_eq!(projects[1].state, "closed");
    let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://api.example.test/orgs/acme/projects?state=all&per_page=100&page=1",
            "https://api.example.test/orgs/acme/projects?state=all&per_page=100&page=2",
        ]
    );
}

#[test]
fn rest_pagination_without_link_stops_on_short_page() {
    let transport = ScriptedTransport::new();
    transport.respond_json(200, json!([{"id": 5, "name": "Todo"}]));
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(1, 1));

    let columns = github.list_columns(9).unwrap();

    assert_eq!(columns.len(), 1);
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn graphql_pagination_follows_cursors() {
    let transport = ScriptedTransport::new();
    transport
        .respond_json(
            200,
            json!({"data": {"repository": {"issues": {
                "pageInfo": {"hasNextPage": true, "endCursor": "c1"},
                "nodes": [{"id": "I_1", "number": 1, "title": "A", "url": "u1", "state": "OPEN"}]
            }}}}),
        )
        .respond_json(
            200,
            json!({"data": {"repository": {"issues": {
                "pageInfo": {"hasNextPage": false, "endCursor": "c2"},
                "nodes": [{"id": "I_2", "number": 2, "title": "B", "url": "u2", "state": "CLOSED"}]
            }}}}),
        );
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(1, 1));

    let issues = github.list_repository_issues("acme", "web").unwrap();

    assert_eq!(issues.len(), 2);
    let requests = transport.requests();
    let first = requests[0].body.as_ref().unwrap();
    let second = requests[1].body.as_ref().unwrap();
    assert_eq!(first["variables"]["cursor"], Value::Null);
    assert_eq!(second["variables"]["cursor"], "c1");
    assert_eq!(second["variables"]["repo"], "web");
}

#[test]
fn graphql_errors_surface_messages() {
    let transport = ScriptedTransport::new();
    transport.respond_json(
        200,
        json!({"data": null, "errors": [{"message": "Could not resolve to an Organization with the login of 'nope'."}]}),
    );
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(1, 1));

    let err = github.organization_id("nope").unwrap_err();

    match err {
        ClientError::GraphQl { messages } => assert!(messages[0].contains("nope")),
        other => panic!("expected graphql error, got {other:?}"),
    }
}

#[test]
fn graphql_rate_limit_is_retried() {
    let transport = ScriptedTransport::new();
    transport
        .respond_json(
            200,
            json!({"errors": [{"type": "RATE_LIMITED", "message": "API rate limit exceeded"}]}),
        )
        .respond_json(200, json!({"data": {"organization": {"id": "O_1"}}}));
    let sleeper = RecordingSleeper::default();
    let github = client(&transport, &sleeper, policy(2, 1));

    assert_eq!(github.organization_id("acme").unwrap(), "O_1");
    assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(1)]);
}
