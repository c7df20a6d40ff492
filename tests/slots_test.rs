use fheforge::model::BaseTemplate;
use fheforge::slots::{parse_file, resolve_params, substitute_params, Segment};
use indexmap::IndexMap;
use serde_json::json;

fn slots(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_substitute_params() {
    let mut params = IndexMap::new();
    params.insert("width".to_string(), json!(64));
    params.insert("owner".to_string(), json!("deployer"));

    let result = substitute_params("euint{{width}} count; // {{owner}}", &params);
    assert_eq!(result, "euint64 count; // deployer");
}

#[test]
fn test_substitute_params_string_values_are_unquoted() {
    let mut params = IndexMap::new();
    params.insert("name".to_string(), json!("Counter"));

    assert_eq!(substitute_params("contract {{name}} {}", &params), "contract Counter {}");
}

#[test]
fn test_resolve_params_overrides_win() {
    let mut base = BaseTemplate::default();
    base.type_params.insert("width".to_string(), json!(64));
    base.type_params.insert("decimals".to_string(), json!(6));

    let mut overrides = IndexMap::new();
    overrides.insert("width".to_string(), json!(32));

    let params = resolve_params(&base, &overrides);
    assert_eq!(params.get("width"), Some(&json!(32)));
    assert_eq!(params.get("decimals"), Some(&json!(6)));
}

#[test]
fn test_parse_file_without_markers() {
    let segments = parse_file("contract C {}\n", &slots(&["functions"]));
    assert_eq!(segments, vec![Segment::Literal("contract C {}\n".to_string())]);
}

#[test]
fn test_parse_file_standalone_marker() {
    let text = "contract C {\n    {{state-vars}}\n}\n";
    let segments = parse_file(text, &slots(&["state-vars"]));

    assert_eq!(
        segments,
        vec![
            Segment::Literal("contract C {\n".to_string()),
            Segment::Slot {
                name: "state-vars".to_string(),
                indent: "    ".to_string(),
                standalone: true,
            },
            Segment::Literal("}\n".to_string()),
        ]
    );
}

#[test]
fn test_parse_file_inline_marker_keeps_surrounding_text() {
    let text = "uint x = {{initial}};\n";
    let segments = parse_file(text, &slots(&["initial"]));

    assert_eq!(
        segments,
        vec![
            Segment::Literal("uint x = ".to_string()),
            Segment::Slot {
                name: "initial".to_string(),
                indent: String::new(),
                standalone: false,
            },
            Segment::Literal(";\n".to_string()),
        ]
    );
}

#[test]
fn test_parse_file_preserves_slot_order() {
    let text = "{{imports}}\ncontract C {\n  {{state-vars}}\n  {{functions}}\n}\n";
    let segments = parse_file(text, &slots(&["imports", "state-vars", "functions"]));

    let names: Vec<&str> = segments
        .iter()
        .filter_map(|s| match s {
            Segment::Slot { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["imports", "state-vars", "functions"]);
}

#[test]
fn test_parse_file_undeclared_marker_passes_through() {
    let text = "mapping(address => {{valueType}}) balances;\n";
    let segments = parse_file(text, &slots(&["functions"]));
    assert_eq!(segments, vec![Segment::Literal(text.to_string())]);
}

#[test]
fn test_parse_is_deterministic() {
    let text = "contract C {\n    {{functions}}\n}\n";
    let declared = slots(&["functions"]);
    assert_eq!(parse_file(text, &declared), parse_file(text, &declared));
}
