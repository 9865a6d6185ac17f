use std::path::PathBuf;

use lexiscope::lexicon::Lexicon;
use lexiscope::regex::{RegexForest, Target};
use lexiscope::trace::{Notify, Trace};
use rstest::rstest;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn trace() -> Trace {
    Trace::load(fixture("ab.json")).unwrap()
}

#[test]
fn json_and_log_encodings_agree() {
    let log = Trace::load(fixture("ab.log")).unwrap();
    assert_eq!(log, trace());
}

#[test]
fn summary_counts_every_kind() {
    let summary = trace().summary();
    assert_eq!(summary["RegexCompile"], 2);
    assert_eq!(summary["RegexAccept"], 2);
    assert_eq!(summary["LexiconAddTransfer"], 5);
    assert_eq!(summary["ScannerSetState"], 5);
    assert_eq!(summary["ScannerNextInput"], 3);
    assert_eq!(summary.values().sum::<usize>(), trace().events.len());
}

#[test]
fn scanner_fields_survive() {
    let trace = trace();
    assert_eq!(trace.scanner_states(), vec![1, 2, 2, 3]);
    let token = trace.accepted_tokens().next().unwrap();
    assert_eq!((token.name.as_str(), token.text.as_str()), ("AB", "aab"));
    assert!(trace.events.iter().any(|n| matches!(
        n,
        Notify::RegexUnion { lhs, rhs, .. } if lhs == "n0" && rhs == "n3"
    )));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = Trace::load(fixture("nope.json")).unwrap_err();
    assert!(err.to_string().contains("nope.json"));
}

#[rstest]
#[case("/", Some("u0"))]
#[case("/0", Some("n0"))]
#[case("/l", Some("n0"))]
#[case("/1", Some("n3"))]
#[case("/x", Some("n3"))]
#[case("/00", Some("n1"))]
#[case("/01", Some("n2"))]
#[case("/1z", Some("n4"))]
#[case("/000", None)]
#[case("n4", Some("n4"))]
#[case("gone", None)]
fn union_root_routes(#[case] path: &str, #[case] expected: Option<&str>) {
    let forest = RegexForest::from_trace(&trace());
    let root = forest.find("u0").unwrap();
    let found = forest.at(root, path).map(|idx| forest.node(idx).id.as_str());
    assert_eq!(found, expected);
}

#[test]
fn union_replaces_its_operands_as_roots() {
    let forest = RegexForest::from_trace(&trace());
    let ids: Vec<&str> = forest
        .roots()
        .iter()
        .map(|&r| forest.node(r).id.as_str())
        .collect();
    assert_eq!(ids, vec!["acc0", "acc1", "u0"]);
    assert_eq!(forest.patterns()[1].0, "a*");

    let n0 = forest.find("n0").unwrap();
    assert_eq!(forest.root_of(n0), forest.find("u0").unwrap());
}

#[test]
fn accept_skips_unknown_afters() {
    let forest = RegexForest::from_trace(&trace());
    let acc1 = forest.node(forest.find("acc1").unwrap());
    assert_eq!(acc1.edges.len(), 1);
    assert_eq!(forest.node(acc1.edges[0].to).id, "n3");
}

#[test]
fn highlight_through_union() {
    let mut forest = RegexForest::from_trace(&trace());
    let root = forest.find("u0").unwrap();
    forest.highlight(root, &[Target::from("/01")]);

    let lit = |id: &str| forest.node(forest.find(id).unwrap()).highlighted;
    assert!(lit("u0") && lit("n0") && lit("n2"));
    assert!(!lit("n1") && !lit("n3") && !lit("n4"));

    let u0 = forest.node(root);
    let emphasized: Vec<bool> = u0.edges.iter().map(|e| e.emphasized).collect();
    assert_eq!(emphasized, vec![true, false]);
}

#[test]
fn lexicon_from_fixture() {
    let lexicon = Lexicon::from_trace(&trace());
    assert_eq!(lexicon.states().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(lexicon.edges()[&(1, 2)], vec![97, 65]);
    assert_eq!(lexicon.state_label(2), "2\nAS");
    assert_eq!(lexicon.state_label(3), "3\nAB");
    assert_eq!(lexicon.poses(1), Some(&["n1".to_string(), "n4".to_string()][..]));
}
