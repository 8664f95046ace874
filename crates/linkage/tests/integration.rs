use std::path::PathBuf;

use rosterlink_linkage::config::JobConfig;
use rosterlink_linkage::engine::{
    load_csv_records, run_match, run_reconcile, MatchInput, ReconcileInput,
};
use rosterlink_linkage::model::{ConfidenceTier, MatchStatus, Record};
use rosterlink_linkage::{MatchConfig, MatchRun, ReconcileConfig, ReconcileRun};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(file: Option<&String>) -> Vec<Record> {
    let path = fixtures_dir().join(file.expect("fixture config names a file"));
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    load_csv_records(&data).unwrap()
}

fn reconcile_config(toml: &str) -> ReconcileConfig {
    match JobConfig::from_toml(toml).unwrap() {
        JobConfig::Reconcile(config) => config,
        JobConfig::Match(_) => panic!("expected a reconcile job"),
    }
}

fn match_config(toml: &str) -> MatchConfig {
    match JobConfig::from_toml(toml).unwrap() {
        JobConfig::Match(config) => config,
        JobConfig::Reconcile(_) => panic!("expected a match job"),
    }
}

fn reconcile(config: &ReconcileConfig) -> ReconcileRun {
    let input = ReconcileInput {
        anchors: load(config.anchor.file.as_ref()),
        source_a: load(config.source_a.file.as_ref()),
        source_b: load(config.source_b.file.as_ref()),
    };
    run_reconcile(config, &input).unwrap()
}

fn batch_match(config: &MatchConfig) -> MatchRun {
    let input = MatchInput {
        source: load(config.source.file.as_ref()),
        target: load(config.target.file.as_ref()),
    };
    run_match(config, &input).unwrap()
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_dir().join(name)).unwrap()
}

// -------------------------------------------------------------------------
// Reconcile
// -------------------------------------------------------------------------

#[test]
fn employees_reconciled_against_hires_and_positions() {
    let run = reconcile(&reconcile_config(&fixture("employees.reconcile.toml")));

    assert_eq!(run.meta.config_name, "Employee links");
    assert_eq!(run.meta.kind, "reconcile");

    let statuses: Vec<(Option<&str>, MatchStatus)> = run
        .records
        .iter()
        .map(|r| (r.anchor_id.as_deref(), r.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (Some("E001"), MatchStatus::Both),
            (Some("E002"), MatchStatus::SourceAOnly),
            (Some("E003"), MatchStatus::SourceBOnly),
            (Some("E004"), MatchStatus::SourceBOnly),
            (Some("E005"), MatchStatus::None),
            (Some("E006"), MatchStatus::None),
        ]
    );

    assert_eq!(run.summary.total_anchors, 6);
    assert_eq!(run.summary.both, 1);
    assert_eq!(run.summary.source_a_only, 1);
    assert_eq!(run.summary.source_b_only, 2);
    assert_eq!(run.summary.none, 2);
    assert!((run.summary.match_rate_any - 400.0 / 6.0).abs() < 1e-9);
    assert_eq!(run.unlinked(), 5);
}

#[test]
fn reconcile_link_tables_carry_ids() {
    let run = reconcile(&reconcile_config(&fixture("employees.reconcile.toml")));

    assert_eq!(run.links.len(), 2);
    let hires = &run.links[0];
    assert_eq!(hires.name, "hires_links");
    let pairs: Vec<(&str, &str)> = hires
        .rows
        .iter()
        .map(|r| (r.anchor_id.as_str(), r.candidate_id.as_str()))
        .collect();
    assert_eq!(pairs, vec![("E001", "A-100"), ("E002", "A-101")]);

    let positions = &run.links[1];
    assert_eq!(positions.name, "positions_links");
    let pairs: Vec<(&str, &str)> = positions
        .rows
        .iter()
        .map(|r| (r.anchor_id.as_str(), r.candidate_id.as_str()))
        .collect();
    assert_eq!(pairs, vec![("E001", "P-10"), ("E003", "P-11"), ("E004", "P-13")]);
}

#[test]
fn near_miss_first_name_links_only_at_half_threshold() {
    // Jon / John share no token: (0 + 1) / 2 = 0.5, under the 0.6 threshold
    let default_run = reconcile(&reconcile_config(&fixture("employees.reconcile.toml")));
    assert!(default_run.records[4].source_a_match.is_none());

    let toml = fixture("employees.reconcile.toml").replace("threshold = 0.6", "threshold = 0.5");
    let run = reconcile(&reconcile_config(&toml));
    let jon = &run.records[4];
    let hire = jon.source_a_match.as_ref().unwrap();
    assert_eq!(hire.combined_score, 50.0);
    assert_eq!(hire.confidence, ConfidenceTier::VeryLow);

    let json = serde_json::to_value(hire).unwrap();
    assert_eq!(json["method"], "low_confidence");
}

#[test]
fn source_b_threshold_does_not_move_source_a() {
    let base = fixture("employees.reconcile.toml");
    let strict_b = base.replace(
        "names = { full = \"new_hire_name\" }",
        "names = { full = \"new_hire_name\" }\nthreshold = 1.0",
    );

    let loose = reconcile(&reconcile_config(&base));
    let strict = reconcile(&reconcile_config(&strict_b));

    for (l, s) in loose.records.iter().zip(&strict.records) {
        assert_eq!(l.source_a_match, s.source_a_match);
    }
}

#[test]
fn reconcile_run_serializes() {
    let run = reconcile(&reconcile_config(&fixture("employees.reconcile.toml")));
    let json = serde_json::to_value(&run).unwrap();

    assert_eq!(json["meta"]["kind"], "reconcile");
    assert_eq!(json["records"][0]["status"], "both");
    assert_eq!(json["records"][0]["source_a_match"]["method"], "exact_match");
    assert_eq!(json["records"][0]["anchor"]["start_date"], "2024-02-12");
    assert!(json["records"][5]["source_b_match"].is_null());
    assert_eq!(json["summary"]["source_b_only"], 2);
}

// -------------------------------------------------------------------------
// Match
// -------------------------------------------------------------------------

#[test]
fn positions_matched_to_postings() {
    let run = batch_match(&match_config(&fixture("positions.match.toml")));

    assert_eq!(run.meta.kind, "match");
    assert_eq!(run.summary.anchors, 4);
    assert_eq!(run.summary.anchors_with_matches, 4);
    assert_eq!(run.unlinked(), 0);

    let top: Vec<(usize, usize)> = run
        .matches
        .iter()
        .filter(|m| m.rank == 1)
        .map(|m| (m.anchor_index, m.result.candidate_index))
        .collect();
    assert_eq!(top, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);

    let first = &run.matches[0];
    assert_eq!(first.result.combined_score, 100.0);
    assert_eq!(first.result.confidence, ConfidenceTier::VeryHigh);
    assert_eq!(first.result.field_scores["team"], 100.0);
}

#[test]
fn match_rows_sorted_within_anchor() {
    let run = batch_match(&match_config(&fixture("positions.match.toml")));
    for pair in run.matches.windows(2) {
        if pair[0].anchor_index == pair[1].anchor_index {
            assert!(pair[0].result.combined_score >= pair[1].result.combined_score);
            assert_eq!(pair[0].rank + 1, pair[1].rank);
        }
    }
    assert!(run.matches.iter().all(|m| m.rank <= 2));
    assert!(run.matches.iter().all(|m| m.result.combined_score >= 60.0));
}

#[test]
fn match_links_use_configured_ids() {
    let run = batch_match(&match_config(&fixture("positions.match.toml")));
    let links = run.links.expect("both id columns configured");
    let top_pairs: Vec<(&str, &str)> = links
        .rows
        .iter()
        .zip(&run.matches)
        .filter(|(_, m)| m.rank == 1)
        .map(|(r, _)| (r.anchor_id.as_str(), r.candidate_id.as_str()))
        .collect();
    assert_eq!(
        top_pairs,
        vec![("P-10", "J-1"), ("P-11", "J-2"), ("P-12", "J-3"), ("P-13", "J-4")]
    );
}

#[test]
fn raising_threshold_shrinks_results() {
    let base = fixture("positions.match.toml");
    let strict = base.replace("score_threshold = 60", "score_threshold = 95");
    let loose = batch_match(&match_config(&base));
    let strict = batch_match(&match_config(&strict));
    assert!(strict.matches.len() <= loose.matches.len());
    assert!(strict.matches.iter().all(|m| m.result.combined_score >= 95.0));
}

#[test]
fn uneven_weights_are_normalized() {
    let toml = fixture("positions.match.toml")
        .replace("weight = 0.7", "weight = 7")
        .replace("weight = 0.3", "weight = 3");
    let run = batch_match(&match_config(&toml));
    let reference = batch_match(&match_config(&fixture("positions.match.toml")));
    let scores = |r: &MatchRun| {
        r.matches
            .iter()
            .map(|m| m.result.combined_score)
            .collect::<Vec<_>>()
    };
    let (a, b) = (scores(&run), scores(&reference));
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).abs() < 1e-9);
    }
}
