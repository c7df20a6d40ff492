use fheforge::error::Error;
use fheforge::loader::{split_module_id, TemplateStore};
use fheforge::model::InjectionMode;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn seed_store(root: &Path) {
    write(
        &root.join("bases/counter/forge.yaml"),
        r#"
name: counter
version: 1.2.0
description: Encrypted counter contract
slots:
  - state-vars
  - functions
typeParams:
  width: 64
exposes:
  functions:
    - increment
"#,
    );
    write(
        &root.join("bases/counter/files/contracts/Counter.sol"),
        "contract Counter {\n    {{state-vars}}\n    {{functions}}\n}\n",
    );
    write(
        &root.join("modules/acl/transient/forge.yaml"),
        r#"
name: transient
description: Transient access grants
semantics:
  - access-control
injections:
  functions:
    content: |
      function allowTransient() public {}
    mode: append
    order: 10
provides:
  functions:
    - allowTransient
"#,
    );
    write(
        &root.join("modules/compute/add/forge.json"),
        r#"{
  "name": "add",
  "description": "Encrypted addition",
  "requires": ["acl/transient"],
  "provides": { "functions": ["add"] }
}"#,
    );
}

#[test]
fn test_load_base() {
    let temp_dir = TempDir::new().unwrap();
    seed_store(temp_dir.path());
    let store = TemplateStore::new(temp_dir.path());

    let base = store.load_base("counter").unwrap();
    assert_eq!(base.name, "counter");
    assert_eq!(base.version, "1.2.0");
    assert_eq!(base.slots, vec!["state-vars", "functions"]);
    assert_eq!(base.type_params["width"], serde_json::json!(64));
    assert_eq!(base.exposes.functions, vec!["increment"]);
    assert!(base.files["contracts/Counter.sol"].contains("{{functions}}"));
}

#[test]
fn test_load_base_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = TemplateStore::new(temp_dir.path());

    match store.load_base("ghost") {
        Err(Error::BaseNotFound { name }) => assert_eq!(name, "ghost"),
        other => panic!("Expected BaseNotFound, got {:?}", other),
    }
}

#[test]
fn test_load_module_yaml() {
    let temp_dir = TempDir::new().unwrap();
    seed_store(temp_dir.path());
    let store = TemplateStore::new(temp_dir.path());

    let module = store.load_module("acl/transient").unwrap();
    assert_eq!(module.id, "acl/transient");
    assert_eq!(module.category(), "acl");
    assert_eq!(module.semantics, vec!["access-control"]);

    let injection = &module.injections["functions"];
    assert_eq!(injection.mode, InjectionMode::Append);
    assert_eq!(injection.order, 10);
    assert!(injection.content.contains("allowTransient"));
}

#[test]
fn test_load_module_json() {
    let temp_dir = TempDir::new().unwrap();
    seed_store(temp_dir.path());
    let store = TemplateStore::new(temp_dir.path());

    let module = store.load_module("compute/add").unwrap();
    assert_eq!(module.requires, vec!["acl/transient"]);
    assert_eq!(module.provides.functions, vec!["add"]);
}

#[test]
fn test_load_module_not_found() {
    let temp_dir = TempDir::new().unwrap();
    seed_store(temp_dir.path());
    let store = TemplateStore::new(temp_dir.path());

    match store.load_module("acl/ghost") {
        Err(Error::ModuleNotFound { id }) => assert_eq!(id, "acl/ghost"),
        other => panic!("Expected ModuleNotFound, got {:?}", other),
    }
}

#[test]
fn test_load_module_invalid_identifier() {
    let temp_dir = TempDir::new().unwrap();
    let store = TemplateStore::new(temp_dir.path());

    match store.load_module("not-an-id") {
        Err(Error::InvalidModuleId { id }) => assert_eq!(id, "not-an-id"),
        other => panic!("Expected InvalidModuleId, got {:?}", other),
    }
}

#[test]
fn test_load_all_modules_in_path_order() {
    let temp_dir = TempDir::new().unwrap();
    seed_store(temp_dir.path());
    let store = TemplateStore::new(temp_dir.path());

    let modules = store.load_all_modules().unwrap();
    let ids: Vec<&str> = modules.keys().map(|k| k.as_str()).collect();
    assert_eq!(ids, vec!["acl/transient", "compute/add"]);
}

#[test]
fn test_load_catalog() {
    let temp_dir = TempDir::new().unwrap();
    seed_store(temp_dir.path());
    let store = TemplateStore::new(temp_dir.path());

    let catalog = store.load_catalog().unwrap();
    assert_eq!(catalog.bases.len(), 1);
    assert_eq!(catalog.modules.len(), 2);
    assert!(catalog.base("counter").is_ok());
    assert!(catalog.module("acl/transient").is_ok());
}

#[test]
fn test_malformed_metadata_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    write(
        &temp_dir.path().join("bases/broken/forge.yaml"),
        "slots: \"not a list\"\n",
    );
    let store = TemplateStore::new(temp_dir.path());

    match store.load_base("broken") {
        Err(Error::MetadataError { path, .. }) => assert!(path.contains("forge.yaml")),
        other => panic!("Expected MetadataError, got {:?}", other),
    }
}

#[test]
fn test_split_module_id_rejects_malformed_input() {
    assert!(split_module_id("acl/transient").is_ok());
    assert!(split_module_id("acl").is_err());
    assert!(split_module_id("acl/").is_err());
    assert!(split_module_id("a/b/c").is_err());
}
