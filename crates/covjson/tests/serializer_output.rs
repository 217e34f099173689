//! Output format of serialized coverage documents.

use covjson::{
    CompactPaths, CompactStyle, CoverageBuilder, ExportOptions, JsonTree, SelectiveSerializer,
};
use serde_json::{json, Value};
use test_utils::{tzyx_dataset, variables, xy_dataset};

fn coverage_text(opts: &ExportOptions) -> String {
    let dataset = xy_dataset();
    let coverage = CoverageBuilder::new(&dataset, opts)
        .build(&[variables::ICEC, variables::MASK])
        .unwrap();
    opts.serializer().unwrap().to_string(&coverage.document).unwrap()
}

#[test]
fn test_numeric_arrays_on_one_line() {
    let text = coverage_text(&ExportOptions::default());

    let values_lines: Vec<_> = text.lines().filter(|l| l.contains("\"values\"")).collect();
    // Two axes plus two ranges.
    assert_eq!(values_lines.len(), 4);
    for line in values_lines {
        assert!(line.trim_end().ends_with(']') || line.trim_end().ends_with("],"));
        assert!(!line.contains(", "), "compact arrays have no spaces: {}", line);
    }

    assert!(text.contains(r#""coordinates": ["x","y"]"#));
    assert!(text.contains(r#""axisNames": ["y","x"]"#));
    assert!(text.contains(r#""shape": [4,5]"#));
}

#[test]
fn test_structure_is_indented() {
    let text = coverage_text(&ExportOptions::default());
    assert!(text.starts_with("{\n  \"type\": \"Coverage\",\n  \"domain\": {\n    \"type\": \"Domain\""));
}

#[test]
fn test_output_parses_and_matches_model() {
    let dataset = tzyx_dataset(2, 2);
    let opts = ExportOptions::default();
    let coverage = CoverageBuilder::new(&dataset, &opts)
        .build(&[variables::TEMP])
        .unwrap();

    let text = opts.serializer().unwrap().to_string(&coverage.document).unwrap();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, serde_json::to_value(&coverage.document).unwrap());
}

#[test]
fn test_serializing_twice_is_identical() {
    let opts = ExportOptions::default();
    assert_eq!(coverage_text(&opts), coverage_text(&opts));
}

#[test]
fn test_no_compact_paths_is_plain_pretty_json() {
    let opts = ExportOptions {
        compact_paths: Vec::new(),
        ..Default::default()
    };
    let dataset = xy_dataset();
    let coverage = CoverageBuilder::new(&dataset, &opts)
        .build(&[variables::MASK])
        .unwrap();

    let ours = opts.serializer().unwrap().to_string(&coverage.document).unwrap();
    let plain = serde_json::to_string_pretty(&coverage.document).unwrap();
    assert_eq!(ours, plain);
}

#[test]
fn test_single_line_style() {
    let opts = ExportOptions {
        compact_paths: Vec::new(),
        single_line_paths: vec!["ranges.*.shape".to_string()],
        ..Default::default()
    };
    let text = coverage_text(&opts);
    assert!(text.contains(r#""shape": [4, 5]"#));
}

#[test]
fn test_nested_matches_use_outermost() {
    let value = json!({"a": {"b": [1, 2], "c": {"d": [3]}}, "e": [4, 5]});
    let paths = CompactPaths::from_patterns(["a", "a.b", "a.c.d"], CompactStyle::Compact).unwrap();
    let ser = SelectiveSerializer::new(paths, 2);

    let tree = ser.to_tree(&value).unwrap();
    assert_eq!(tree.raw_count(), 1);

    let text = ser.to_string(&value).unwrap();
    assert_eq!(
        text,
        "{\n  \"a\": {\"b\":[1,2],\"c\":{\"d\":[3]}},\n  \"e\": [\n    4,\n    5\n  ]\n}"
    );
}

#[test]
fn test_strings_that_look_like_markers_survive() {
    let value = json!({"label": "@@RAW_0@@", "values": ["\"quoted\"", "]"]});
    let paths = CompactPaths::from_patterns(["values"], CompactStyle::Compact).unwrap();
    let text = SelectiveSerializer::new(paths, 2).to_string(&value).unwrap();

    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, value);
}

#[test]
fn test_invalid_raw_fragment_rejected() {
    assert!(JsonTree::raw("[1,2".to_string()).is_err());
    assert!(JsonTree::raw("[1,2]".to_string()).is_ok());
}
