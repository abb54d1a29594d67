use pretty_assertions::assert_eq;
use std::fs;
use topomap_config::{load_document, save_document, ConfigError, FileConfigStore};
use topomap_core::{CanvasSize, ConfigStore, NodeDraft, TopologyDocument, TopologyEngine};
use topomap_test_utils::{document, small_site};

#[test]
fn test_missing_file_is_default_document() {
    let dir = tempfile::tempdir().unwrap();
    let doc = load_document(&dir.path().join("absent.json")).unwrap();
    assert_eq!(doc, TopologyDocument::default());
}

#[test]
fn test_json_and_yaml_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let original = document(small_site());
    for name in ["site.json", "site.yaml"] {
        let path = dir.path().join(name);
        save_document(&path, &original).unwrap();
        assert_eq!(load_document(&path).unwrap(), original);
    }
}

#[test]
fn test_unknown_node_fields_survive_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("topomap.json");
    fs::write(
        &path,
        r#"{"nodes":[{"id":"gw","name":"Gateway","address":"10.0.0.1","sshUser":"admin"}]}"#,
    )
    .unwrap();

    let mut store = FileConfigStore::new(&path).unwrap();
    let doc = store.load().unwrap();
    store.save(&doc).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["nodes"][0]["sshUser"], "admin");
    assert_eq!(raw["settings"]["gridSize"], 100);
}

#[test]
fn test_save_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/topomap.yml");
    save_document(&path, &document(small_site())).unwrap();
    assert_eq!(load_document(&path).unwrap().nodes.len(), 4);
}

#[test]
fn test_corrupt_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{\"nodes\": [").unwrap();
    assert!(matches!(load_document(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn test_import_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConfigStore::new(dir.path().join("topomap.json")).unwrap();

    let exported = dir.path().join("backup.yaml");
    store.export(&document(small_site()), &exported).unwrap();
    let imported = store.import(&exported).unwrap();
    assert_eq!(imported.nodes.len(), 4);

    let missing = store.import(&dir.path().join("nope.json")).unwrap_err();
    assert!(missing.is_recoverable());
}

#[test]
fn test_engine_persists_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("topomap.json");
    save_document(&path, &document(small_site())).unwrap();

    let store = FileConfigStore::new(&path).unwrap();
    let mut engine = TopologyEngine::load(Box::new(store), CanvasSize::default()).unwrap();
    engine.add_node(NodeDraft::named("Printer").with_address("10.0.0.20")).unwrap();

    let on_disk = load_document(&path).unwrap();
    assert_eq!(on_disk.nodes.len(), 5);
    assert_eq!(on_disk.nodes[4].name, "Printer");
    assert_eq!((on_disk.nodes[4].x, on_disk.nodes[4].y), (Some(45.0), Some(10.0)));
}
