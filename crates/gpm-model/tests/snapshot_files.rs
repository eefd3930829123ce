//! Snapshot and mapping files on disk.

use std::fs;

use gpm_model::{
    IdMapping, IdentifierMapping, ProjectMapping, ProjectType, SnapshotError, load_mapping,
    load_snapshot, save_mapping,
};
use tempfile::tempdir;

const CLASSIC_SNAPSHOT: &str = r#"{
  "org": "acme",
  "exported_at": "2024-03-01T12:00:00Z",
  "metadata": {"tool": "gpm"},
  "projects": {
    "type": "classic",
    "items": [
      {
        "id": 1,
        "name": "Roadmap",
        "body": "Q2 plan",
        "state": "closed",
        "columns": [
          {"id": 10, "name": "Todo", "cards": [{"id": 100, "note": "write docs"}]}
        ]
      }
    ]
  }
}"#;

#[test]
fn loads_handwritten_classic_snapshot() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.json");
    fs::write(&path, CLASSIC_SNAPSHOT).unwrap();

    let snapshot = load_snapshot(&path).unwrap();

    assert_eq!(snapshot.org, "acme");
    assert_eq!(snapshot.project_type(), ProjectType::Classic);
    assert_eq!(snapshot.item_count(), 1);
    assert_eq!(snapshot.metadata["tool"], "gpm");
}

#[test]
fn missing_required_field_is_format_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.json");
    fs::write(&path, CLASSIC_SNAPSHOT.replace(r#""name": "Roadmap","#, "")).unwrap();

    let err = load_snapshot(&path).unwrap_err();

    match err {
        SnapshotError::Format { reason, .. } => assert!(reason.contains("name"), "{reason}"),
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn unknown_project_type_is_format_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.json");
    fs::write(
        &path,
        CLASSIC_SNAPSHOT.replace(r#""type": "classic""#, r#""type": "beta""#),
    )
    .unwrap();

    assert!(matches!(
        load_snapshot(&path),
        Err(SnapshotError::Format { .. })
    ));
}

#[test]
fn mapping_survives_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mapping.json");
    let mut mapping = IdentifierMapping::new("acme", "acme-next", ProjectType::Classic);
    let mut project = ProjectMapping::new("1", "Roadmap", "901");
    project.columns.push(IdMapping::new("10", "9010"));
    project.items.push(IdMapping::new("100", "90100"));
    mapping.projects.push(project);
    mapping.finish(true);

    save_mapping(&mapping, &path).unwrap();
    let loaded = load_mapping(&path).unwrap();

    assert_eq!(loaded, mapping);
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(raw["projects"][0].get("fields").is_none());
}
