mod helpers;

use helpers::TestVault;
use strata::graph::index::BuildMode;
use strata::graph::snapshot::{load_snapshot, save_snapshot};
use tempfile::TempDir;

#[test]
fn missing_snapshot_loads_as_none() {
    let tmp = TempDir::new().unwrap();
    assert!(load_snapshot(&tmp.path().join("graph.json")).unwrap().is_none());
}

#[test]
fn saved_snapshot_reloads_equal() {
    let vault = TestVault::seeded();
    let index = vault.index();
    index.rebuild(BuildMode::Full).unwrap();
    let graph = index.snapshot().unwrap();

    let path = vault.tmp.path().join("copy").join("graph.json");
    save_snapshot(&path, &graph).unwrap();
    let loaded = load_snapshot(&path).unwrap().unwrap();
    assert_eq!(&loaded, graph.as_ref());
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn snapshot_json_shape() {
    let vault = TestVault::seeded();
    let index = vault.index();
    index.rebuild(BuildMode::Full).unwrap();

    let raw = std::fs::read_to_string(vault.config.resolved_snapshot_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["nodeCount"], 5);
    assert_eq!(json["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(json["edgeCount"], json["edges"].as_array().unwrap().len());
    assert!(json["builtAt"].is_string());
    let types: Vec<&str> = json["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"LINK"));
    assert!(types.contains(&"PARENT_OF"));
    assert!(json["nodes"][0]["accessedCount"].is_number());
}

#[test]
fn corrupt_snapshot_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("graph.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_snapshot(&path).is_err());
}
