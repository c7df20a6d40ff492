use clap::Parser;
use fheforge::cli::{parse_param_overrides, Args, Command};
use serde_json::json;
use std::ffi::OsString;
use std::path::PathBuf;

fn make_args(args: &[&str]) -> Vec<OsString> {
    let mut res = vec![OsString::from("fheforge")];
    res.extend(args.iter().map(OsString::from));
    res
}

#[test]
fn test_new_args() {
    let args = make_args(&[
        "new",
        "token",
        "./output",
        "-m",
        "acl/transient",
        "-m",
        "admin/roles",
        "--set",
        "width=64",
        "--name",
        "MyToken",
    ]);
    let parsed = Args::try_parse_from(args).unwrap();

    match parsed.command {
        Command::New { base, output_dir, modules, name, params, force, dry_run } => {
            assert_eq!(base, "token");
            assert_eq!(output_dir, PathBuf::from("./output"));
            assert_eq!(modules, vec!["acl/transient", "admin/roles"]);
            assert_eq!(name.as_deref(), Some("MyToken"));
            assert_eq!(params, vec!["width=64"]);
            assert!(!force);
            assert!(!dry_run);
        }
        other => panic!("Expected New command, got {:?}", other),
    }
}

#[test]
fn test_check_args() {
    let args = make_args(&["check", "token", "-m", "acl/transient"]);
    let parsed = Args::try_parse_from(args).unwrap();

    match parsed.command {
        Command::Check { base, modules, .. } => {
            assert_eq!(base, "token");
            assert_eq!(modules, vec!["acl/transient"]);
        }
        other => panic!("Expected Check command, got {:?}", other),
    }
}

#[test]
fn test_global_flags() {
    let args = make_args(&["--templates-dir", "./store", "-v", "list"]);
    let parsed = Args::try_parse_from(args).unwrap();

    assert_eq!(parsed.templates_dir, PathBuf::from("./store"));
    assert!(parsed.verbose);
    assert!(matches!(parsed.command, Command::List));
}

#[test]
fn test_templates_dir_default() {
    let args = make_args(&["list"]);
    let parsed = Args::try_parse_from(args).unwrap();
    assert_eq!(parsed.templates_dir, PathBuf::from("templates"));
}

#[test]
fn test_missing_args() {
    let args = make_args(&["new", "token"]);
    assert!(Args::try_parse_from(args).is_err());
}

#[test]
fn test_parse_param_overrides() {
    let values = vec![
        "width=64".to_string(),
        "owner=deployer".to_string(),
        "audited=true".to_string(),
    ];
    let overrides = parse_param_overrides(&values).unwrap();

    assert_eq!(overrides["width"], json!(64));
    assert_eq!(overrides["owner"], json!("deployer"));
    assert_eq!(overrides["audited"], json!(true));
}

#[test]
fn test_parse_param_overrides_rejects_malformed_input() {
    assert!(parse_param_overrides(&["no-equals".to_string()]).is_err());
    assert!(parse_param_overrides(&["=value".to_string()]).is_err());
}
