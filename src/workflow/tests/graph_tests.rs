//! Status graph construction and reachability tests.

use crate::workflow::domain::{StatusGraph, StatusGraphError};
use rstest::{fixture, rstest};
use std::collections::BTreeMap;

#[fixture]
fn default_graph() -> StatusGraph {
    StatusGraph::default_workflow()
}

fn labels(path: &[&str]) -> Vec<String> {
    path.iter().map(|label| (*label).to_owned()).collect()
}

#[rstest]
#[case("0", "5", &["0", "1", "2", "4", "5"])]
#[case("0", "6", &["0", "1", "2", "6"])]
#[case("4", "2", &["4", "5", "2"])]
fn default_graph_reaches_targets(
    default_graph: StatusGraph,
    #[case] current: &str,
    #[case] target: &str,
    #[case] expected: &[&str],
) {
    let result = default_graph.reachable(current, target);
    assert!(result.reachable);
    assert_eq!(result.path, labels(expected));
}

#[rstest]
fn unknown_target_fails_with_empty_path(default_graph: StatusGraph) {
    let result = default_graph.reachable("0", "12");
    assert!(!result.reachable);
    assert!(result.path.is_empty());
}

#[rstest]
fn backwards_transition_is_denied_with_diagnostic_path(default_graph: StatusGraph) {
    let result = default_graph.reachable("2", "1");
    assert!(!result.reachable);
    assert_eq!(result.path, labels(&["2", "3", "4", "5", "6"]));
}

#[rstest]
fn unknown_current_starts_from_entry_label(default_graph: StatusGraph) {
    let result = default_graph.reachable("9", "2");
    assert!(result.reachable);
    assert_eq!(result.path.first().map(String::as_str), Some("0"));
}

#[rstest]
fn reachability_leaves_graph_untouched(default_graph: StatusGraph) {
    let before = default_graph.clone();
    let outcome = default_graph.reachable("17", "5");
    assert!(outcome.reachable);
    assert_eq!(default_graph, before);
}

#[rstest]
fn wildcard_edge_reaches_any_node() {
    let graph = StatusGraph::from_json(r#"{"1": ["*"], "7": []}"#).expect("valid graph");
    let result = graph.reachable("1", "7");
    assert!(result.reachable);
    assert_eq!(result.path, labels(&["1", "*"]));
}

#[rstest]
fn from_json_adds_target_buckets_and_deduplicates() {
    let graph = StatusGraph::from_json(r#"{"0": ["10", "10"], "10": ["2", "3", "11"], "11": ["12"], "3": ["12"]}"#)
        .expect("valid graph");

    assert_eq!(graph.targets("0"), labels(&["10"]).as_slice());
    assert!(graph.contains("12"));
    assert!(graph.targets("12").is_empty());
    assert!(graph.reachable("0", "12").reachable);
    assert!(!graph.reachable("0", "5").reachable);
}

#[rstest]
fn json_round_trip_is_stable() {
    let source = r#"{"0":["1"],"1":["2","3"],"2":[],"3":[]}"#;
    let graph = StatusGraph::from_json(source).expect("valid graph");
    let rendered = graph.to_json().expect("serializes");
    assert_eq!(rendered, source);
    assert_eq!(StatusGraph::from_json(&rendered).expect("reparses"), graph);
}

#[rstest]
#[case(r#"{"21": ["1"]}"#, "21")]
#[case(r#"{"1": ["x"]}"#, "x")]
#[case(r#"{"-1": []}"#, "-1")]
#[case(r#"{"01": []}"#, "01")]
fn out_of_range_labels_are_rejected(#[case] json: &str, #[case] label: &str) {
    assert_eq!(
        StatusGraph::from_json(json),
        Err(StatusGraphError::InvalidLabel(label.to_owned()))
    );
}

#[rstest]
fn malformed_json_is_a_parse_error() {
    assert!(matches!(
        StatusGraph::from_json("{\"0\": 1"),
        Err(StatusGraphError::Malformed(_))
    ));
}

#[rstest]
fn add_route_is_a_union_insert() {
    let mut graph = StatusGraph::default();
    graph.add_route("1", "2").expect("valid labels");
    graph.add_route("1", "2").expect("valid labels");

    assert_eq!(graph.targets("1"), labels(&["2"]).as_slice());
    assert!(graph.contains("2"));
    assert!(graph.add_route("1", "42").is_err());
}

#[rstest]
fn remove_route_ignores_missing_source(mut default_graph: StatusGraph) {
    default_graph.remove_route("2", "6");
    default_graph.remove_route("19", "1");

    assert_eq!(default_graph.targets("2"), labels(&["3", "4"]).as_slice());
    assert!(!default_graph.reachable("0", "6").reachable);
}

#[rstest]
fn serde_uses_adjacency_map_shape() {
    let graph: StatusGraph = serde_json::from_str(r#"{"1":["2"]}"#).expect("deserializes");
    let mut expected = BTreeMap::new();
    expected.insert("1".to_owned(), labels(&["2"]));
    expected.insert("2".to_owned(), Vec::new());
    assert_eq!(graph.to_map(), &expected);
    assert!(serde_json::from_str::<StatusGraph>(r#"{"99":[]}"#).is_err());
}
