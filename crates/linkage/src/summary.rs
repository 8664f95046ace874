use std::collections::{BTreeSet, HashMap};

use crate::model::{
    CombinedRecord, ConfidenceTier, MatchStatus, MatchSummary, RankedMatch, ReconcileSummary,
};

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Status counts and link rates over a reconciliation.
pub fn compute_reconcile_summary(records: &[CombinedRecord]) -> ReconcileSummary {
    let mut both = 0;
    let mut source_a_only = 0;
    let mut source_b_only = 0;
    let mut none = 0;

    for r in records {
        match r.status {
            MatchStatus::Both => both += 1,
            MatchStatus::SourceAOnly => source_a_only += 1,
            MatchStatus::SourceBOnly => source_b_only += 1,
            MatchStatus::None => none += 1,
        }
    }

    let total = records.len();
    ReconcileSummary {
        total_anchors: total,
        both,
        source_a_only,
        source_b_only,
        none,
        match_rate_any: percent(total - none, total),
        match_rate_both: percent(both, total),
    }
}

/// Coverage and tier counts over a batch match of `anchors` anchors.
pub fn compute_match_summary(rows: &[RankedMatch], anchors: usize) -> MatchSummary {
    let mut confidence_counts: HashMap<String, usize> =
        ConfidenceTier::ALL.iter().map(|t| (t.to_string(), 0)).collect();
    let mut matched: BTreeSet<usize> = BTreeSet::new();
    let mut total_score = 0.0;

    for row in rows {
        matched.insert(row.anchor_index);
        total_score += row.result.combined_score;
        *confidence_counts
            .entry(row.result.confidence.to_string())
            .or_insert(0) += 1;
    }

    let average_score = (!rows.is_empty()).then(|| total_score / rows.len() as f64);

    MatchSummary {
        anchors,
        anchors_with_matches: matched.len(),
        anchors_without_matches: anchors.saturating_sub(matched.len()),
        total_matches: rows.len(),
        average_score,
        confidence_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombineMethod;
    use crate::model::{MatchMethod, MatchResult, Record};

    fn combined(status: MatchStatus) -> CombinedRecord {
        CombinedRecord {
            anchor_index: 0,
            anchor_id: None,
            anchor: Record::new(),
            source_a_match: None,
            source_b_match: None,
            status,
        }
    }

    fn ranked(anchor_index: usize, score: f64) -> RankedMatch {
        RankedMatch {
            anchor_index,
            rank: 1,
            result: MatchResult {
                candidate_index: 0,
                candidate: Record::new(),
                combined_score: score,
                field_scores: Default::default(),
                confidence: ConfidenceTier::from_score(score),
                method: MatchMethod::Combined(CombineMethod::Weighted),
            },
        }
    }

    #[test]
    fn reconcile_summary_counts() {
        let records = vec![
            combined(MatchStatus::Both),
            combined(MatchStatus::Both),
            combined(MatchStatus::SourceAOnly),
            combined(MatchStatus::SourceBOnly),
            combined(MatchStatus::None),
        ];
        let s = compute_reconcile_summary(&records);
        assert_eq!(s.total_anchors, 5);
        assert_eq!(s.both, 2);
        assert_eq!(s.source_a_only, 1);
        assert_eq!(s.source_b_only, 1);
        assert_eq!(s.none, 1);
        assert_eq!(s.match_rate_any, 80.0);
        assert_eq!(s.match_rate_both, 40.0);
    }

    #[test]
    fn empty_reconcile_has_zero_rates() {
        let s = compute_reconcile_summary(&[]);
        assert_eq!(s.total_anchors, 0);
        assert_eq!(s.match_rate_any, 0.0);
    }

    #[test]
    fn match_summary_counts() {
        let rows = vec![ranked(0, 95.0), ranked(0, 65.0), ranked(2, 80.0)];
        let s = compute_match_summary(&rows, 4);
        assert_eq!(s.anchors_with_matches, 2);
        assert_eq!(s.anchors_without_matches, 2);
        assert_eq!(s.total_matches, 3);
        assert_eq!(s.average_score, Some(80.0));
        assert_eq!(s.confidence_counts["very_high"], 1);
        assert_eq!(s.confidence_counts["high"], 1);
        assert_eq!(s.confidence_counts["low"], 1);
        assert_eq!(s.confidence_counts["medium"], 0);
        assert_eq!(s.confidence_counts.len(), ConfidenceTier::ALL.len());
    }

    #[test]
    fn match_summary_without_rows() {
        let s = compute_match_summary(&[], 3);
        assert_eq!(s.average_score, None);
        assert_eq!(s.anchors_without_matches, 3);
    }
}
