use fheforge::error::Error;
use fheforge::materializer::{ensure_output_dir, materialize};
use fheforge::model::MergeResult;
use fheforge::resolver::{ValidationReport, Violation};
use indexmap::IndexMap;
use std::fs;
use tempfile::TempDir;

fn merged(files: &[(&str, &str)]) -> MergeResult {
    let mut map = IndexMap::new();
    for (path, content) in files {
        map.insert(path.to_string(), content.to_string());
    }
    MergeResult { success: true, files: map, report: ValidationReport::default() }
}

#[test]
fn test_ensure_output_dir() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();

    // Test non-existent directory
    let new_dir = path.join("new_dir");
    assert!(ensure_output_dir(&new_dir, false).is_ok());

    // Test existing directory without force
    assert!(ensure_output_dir(path, false).is_err());

    // Test existing directory with force
    assert!(ensure_output_dir(path, true).is_ok());
}

#[test]
fn test_materialize_writes_all_files() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("project");

    let result = merged(&[
        ("contracts/Token.sol", "contract Token {}\n"),
        ("README.md", "# Token\n"),
    ]);

    let written = materialize(&result, &output, None, false).unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(
        fs::read_to_string(output.join("contracts/Token.sol")).unwrap(),
        "contract Token {}\n"
    );
    assert_eq!(fs::read_to_string(output.join("README.md")).unwrap(), "# Token\n");
}

#[test]
fn test_materialize_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("project");

    let result = merged(&[("contracts/Token.sol", "contract Token {}\n")]);

    let written = materialize(&result, &output, None, true).unwrap();
    assert_eq!(written.len(), 1);
    assert!(!output.exists());
}

#[test]
fn test_materialize_refuses_unsuccessful_result() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("project");

    let result = MergeResult {
        success: false,
        files: IndexMap::new(),
        report: ValidationReport {
            errors: vec![Violation::UnknownTypeParam {
                param: "width".to_string(),
                base: "token".to_string(),
            }],
            warnings: vec![],
        },
    };

    match materialize(&result, &output, None, false) {
        Err(Error::MergeRefused { error_count }) => assert_eq!(error_count, 1),
        other => panic!("Expected MergeRefused, got {:?}", other),
    }
    assert!(!output.exists());
}

#[test]
fn test_skeleton_is_copied_around_merged_files() {
    let temp_dir = TempDir::new().unwrap();
    let skeleton = temp_dir.path().join("skeleton");
    fs::create_dir_all(&skeleton).unwrap();
    fs::write(skeleton.join("hardhat.config.ts"), "export default {};\n").unwrap();
    fs::write(skeleton.join("README.md"), "skeleton readme\n").unwrap();
    fs::write(skeleton.join("scratch.log"), "noise\n").unwrap();
    fs::write(skeleton.join(".forgeignore"), "*.log\n").unwrap();

    let output = temp_dir.path().join("project");
    let result = merged(&[("README.md", "# merged\n")]);

    materialize(&result, &output, Some(&skeleton), false).unwrap();

    // Skeleton file copied
    assert_eq!(
        fs::read_to_string(output.join("hardhat.config.ts")).unwrap(),
        "export default {};\n"
    );
    // Merged output wins over the skeleton copy
    assert_eq!(fs::read_to_string(output.join("README.md")).unwrap(), "# merged\n");
    // Ignored patterns and the ignore file itself are skipped
    assert!(!output.join("scratch.log").exists());
    assert!(!output.join(".forgeignore").exists());
}
