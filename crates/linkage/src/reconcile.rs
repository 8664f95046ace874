//! Link every anchor against two candidate populations in independent passes.

use std::collections::BTreeMap;

use crate::config::{NameSource, ReconcileConfig, SourceConfig};
use crate::error::LinkageError;
use crate::matcher::WeightedRecordMatcher;
use crate::model::{CombinedRecord, MatchMethod, MatchResult, MatchStatus, Record, TierBands};
use crate::names::{extract_name, name_similarity, NameMatcher};

/// How one source pass picks its match.
#[derive(Debug, Clone)]
enum SourcePass {
    Names { source: NameSource, threshold: f64 },
    Weighted(WeightedRecordMatcher),
}

impl SourcePass {
    fn from_config(config: &SourceConfig) -> Result<Self, LinkageError> {
        match (&config.names, &config.matcher) {
            (Some(source), None) => Ok(Self::Names {
                source: source.clone(),
                threshold: config.threshold,
            }),
            (None, Some(matcher)) => {
                Ok(Self::Weighted(WeightedRecordMatcher::new(matcher.clone())?))
            }
            _ => Err(LinkageError::ConfigValidation(
                "source needs exactly one of `names` or `matcher`".into(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndependentSourceReconciler {
    anchor_id: Option<String>,
    anchor_names: Option<NameSource>,
    name_matcher: NameMatcher,
    tiers: TierBands,
    pass_a: SourcePass,
    pass_b: SourcePass,
    label_a: String,
    label_b: String,
}

impl IndependentSourceReconciler {
    pub fn new(config: ReconcileConfig) -> Result<Self, LinkageError> {
        config.validate()?;
        Ok(Self {
            pass_a: SourcePass::from_config(&config.source_a)?,
            pass_b: SourcePass::from_config(&config.source_b)?,
            label_a: config.source_a_label().to_string(),
            label_b: config.source_b_label().to_string(),
            anchor_id: config.anchor.id,
            anchor_names: config.anchor.names,
            name_matcher: NameMatcher::new(config.name_bands),
            tiers: config.tiers,
        })
    }

    /// Run pass A over all anchors, then pass B, and merge by anchor index.
    /// Neither pass sees the other's candidates or outcome.
    pub fn reconcile(
        &self,
        anchors: &[Record],
        candidate_set_a: &[Record],
        candidate_set_b: &[Record],
    ) -> Vec<CombinedRecord> {
        let matches_a = self.run_pass(&self.pass_a, anchors, candidate_set_a);
        let matches_b = self.run_pass(&self.pass_b, anchors, candidate_set_b);

        log::debug!(
            "{}: {} of {} anchors matched",
            self.label_a,
            matches_a.iter().filter(|m| m.is_some()).count(),
            anchors.len()
        );
        log::debug!(
            "{}: {} of {} anchors matched",
            self.label_b,
            matches_b.iter().filter(|m| m.is_some()).count(),
            anchors.len()
        );

        anchors
            .iter()
            .zip(matches_a.into_iter().zip(matches_b))
            .enumerate()
            .map(|(anchor_index, (anchor, (source_a_match, source_b_match)))| {
                let status =
                    MatchStatus::from_presence(source_a_match.is_some(), source_b_match.is_some());
                CombinedRecord {
                    anchor_index,
                    anchor_id: self
                        .anchor_id
                        .as_deref()
                        .and_then(|field| anchor.text(field))
                        .map(|id| id.into_owned()),
                    anchor: anchor.clone(),
                    source_a_match,
                    source_b_match,
                    status,
                }
            })
            .collect()
    }

    fn run_pass(
        &self,
        pass: &SourcePass,
        anchors: &[Record],
        candidates: &[Record],
    ) -> Vec<Option<MatchResult>> {
        match pass {
            SourcePass::Weighted(matcher) => anchors
                .iter()
                .map(|anchor| matcher.match_record(anchor, candidates, 1).into_iter().next())
                .collect(),
            SourcePass::Names { source, threshold } => {
                let candidate_names: Vec<Option<(String, String)>> =
                    candidates.iter().map(|c| extract_name(c, source)).collect();
                anchors
                    .iter()
                    .map(|anchor| {
                        let anchor_name = self
                            .anchor_names
                            .as_ref()
                            .and_then(|names| extract_name(anchor, names))?;
                        self.best_name_match(&anchor_name, candidates, &candidate_names, *threshold)
                    })
                    .collect()
            }
        }
    }

    /// Highest-scoring candidate at or above `threshold`; the earliest wins ties.
    /// A zero score never links, whatever the threshold.
    fn best_name_match(
        &self,
        (first, last): &(String, String),
        candidates: &[Record],
        candidate_names: &[Option<(String, String)>],
        threshold: f64,
    ) -> Option<MatchResult> {
        let mut best: Option<(usize, crate::names::NameMatch)> = None;
        for (index, name) in candidate_names.iter().enumerate() {
            let Some((cand_first, cand_last)) = name else {
                continue;
            };
            let m = self.name_matcher.match_names(first, last, cand_first, cand_last);
            if m.score <= 0.0 || m.score < threshold {
                continue;
            }
            if best.as_ref().map_or(true, |(_, b)| m.score > b.score) {
                best = Some((index, m));
            }
        }

        let (candidate_index, m) = best?;
        let (cand_first, cand_last) = candidate_names[candidate_index].as_ref()?;
        let mut field_scores = BTreeMap::new();
        field_scores.insert("first_name".to_string(), name_similarity(first, cand_first) * 100.0);
        field_scores.insert("last_name".to_string(), name_similarity(last, cand_last) * 100.0);

        let combined_score = m.score * 100.0;
        Some(MatchResult {
            candidate_index,
            candidate: candidates[candidate_index].clone(),
            combined_score,
            field_scores,
            confidence: self.tiers.classify(combined_score),
            method: MatchMethod::Name(m.method),
        })
    }

    pub fn source_a_label(&self) -> &str {
        &self.label_a
    }

    pub fn source_b_label(&self) -> &str {
        &self.label_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnchorConfig, FieldMatchSpec, MatcherConfig};
    use crate::model::{ConfidenceTier, NameMatchMethod};
    use crate::scorer::Scorer;

    fn split() -> NameSource {
        NameSource::Split {
            first: "first".into(),
            last: "last".into(),
        }
    }

    fn full(field: &str) -> NameSource {
        NameSource::Full { full: field.into() }
    }

    fn employee(id: &str, name: &str) -> Record {
        Record::new().with("employee_id", id).with("full_name", name)
    }

    fn hire(first: &str, last: &str) -> Record {
        Record::new().with("first", first).with("last", last)
    }

    fn position(name: &str) -> Record {
        Record::new().with("new_hire_name", name)
    }

    fn config(threshold_a: f64, threshold_b: f64) -> ReconcileConfig {
        ReconcileConfig::new(
            AnchorConfig {
                file: None,
                id: Some("employee_id".into()),
                names: Some(full("full_name")),
            },
            SourceConfig::names(split()).label("hires").threshold(threshold_a),
            SourceConfig::names(full("new_hire_name")).label("positions").threshold(threshold_b),
        )
    }

    #[test]
    fn status_from_independent_passes() {
        let r = IndependentSourceReconciler::new(config(0.6, 0.6)).unwrap();
        let anchors = vec![
            employee("E1", "Ana López"),
            employee("E2", "Luis Marín"),
            employee("E3", "Sara Gil"),
            employee("E4", "Pablo Sanz"),
        ];
        let hires = vec![hire("Ana", "Lopez"), hire("Luis", "Marin")];
        let positions = vec![position("Ana López"), position("Sara Gil")];

        let out = r.reconcile(&anchors, &hires, &positions);
        let statuses: Vec<MatchStatus> = out.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                MatchStatus::Both,
                MatchStatus::SourceAOnly,
                MatchStatus::SourceBOnly,
                MatchStatus::None,
            ]
        );
        assert_eq!(out[0].anchor_id.as_deref(), Some("E1"));
        let a = out[0].source_a_match.as_ref().unwrap();
        assert_eq!(a.combined_score, 100.0);
        assert_eq!(a.method, MatchMethod::Name(NameMatchMethod::ExactMatch));
        assert_eq!(a.confidence, ConfidenceTier::VeryHigh);
        assert_eq!(a.field_scores["first_name"], 100.0);
    }

    #[test]
    fn no_candidates_gives_none() {
        let r = IndependentSourceReconciler::new(config(0.6, 0.6)).unwrap();
        let out = r.reconcile(&[employee("E1", "Ana López")], &[], &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].status, MatchStatus::None);
        assert!(out[0].source_a_match.is_none());
        assert!(out[0].source_b_match.is_none());
    }

    #[test]
    fn pass_a_independent_of_pass_b_threshold() {
        let anchors = vec![employee("E1", "Ana López García"), employee("E2", "Luis Marín")];
        let hires = vec![hire("Ana", "López"), hire("Luis", "Marin")];
        let positions = vec![position("Ana López"), position("Luis Marín")];

        let loose = IndependentSourceReconciler::new(config(0.6, 0.0)).unwrap();
        let strict = IndependentSourceReconciler::new(config(0.6, 1.0)).unwrap();
        let a_loose: Vec<_> = loose
            .reconcile(&anchors, &hires, &positions)
            .into_iter()
            .map(|c| c.source_a_match)
            .collect();
        let a_strict: Vec<_> = strict
            .reconcile(&anchors, &hires, &positions)
            .into_iter()
            .map(|c| c.source_a_match)
            .collect();
        assert_eq!(a_loose, a_strict);
    }

    #[test]
    fn best_candidate_wins_and_ties_keep_first() {
        let r = IndependentSourceReconciler::new(config(0.6, 0.6)).unwrap();
        let anchors = vec![employee("E1", "Ana López García")];
        // 0.75, 1.0, 1.0
        let hires = vec![
            hire("Ana", "López"),
            hire("Ana", "Lopez Garcia"),
            hire("ANA", "López García"),
        ];
        let out = r.reconcile(&anchors, &hires, &[]);
        let a = out[0].source_a_match.as_ref().unwrap();
        assert_eq!(a.candidate_index, 1);
    }

    #[test]
    fn below_threshold_or_unnamed_candidates_skipped() {
        let r = IndependentSourceReconciler::new(config(0.8, 0.6)).unwrap();
        let anchors = vec![employee("E1", "Jon Doe"), employee("E2", "Cher")];
        let hires = vec![hire("John", "Doe"), Record::new().with("first", "Jon")];
        let out = r.reconcile(&anchors, &hires, &[]);
        // Jon/John Doe scores 0.5; the second hire has no last name
        assert!(out[0].source_a_match.is_none());
        // single-token anchor name cannot be split
        assert!(out[1].source_a_match.is_none());
    }

    #[test]
    fn zero_threshold_never_links_disjoint_names() {
        let r = IndependentSourceReconciler::new(config(0.0, 0.0)).unwrap();
        let anchors = vec![employee("E1", "Ana López")];
        let hires = vec![hire("Luis", "Marín")];
        let positions = vec![position("Sara Gil"), position("Ana Ruiz")];
        let out = r.reconcile(&anchors, &hires, &positions);
        assert!(out[0].source_a_match.is_none());
        // first name shared: 0.5 clears a zero threshold
        let b = out[0].source_b_match.as_ref().unwrap();
        assert_eq!(b.candidate_index, 1);
        assert_eq!(out[0].status, MatchStatus::SourceBOnly);
    }

    #[test]
    fn weighted_source_uses_top_match() {
        let matcher = MatcherConfig::new(vec![FieldMatchSpec::new("full_name", "title")
            .scorer(Scorer::TokenOrder)])
        .score_threshold(90.0);
        let cfg = ReconcileConfig::new(
            AnchorConfig {
                file: None,
                id: Some("employee_id".into()),
                names: Some(full("full_name")),
            },
            SourceConfig::names(split()),
            SourceConfig::weighted(matcher).label("directory"),
        );
        let r = IndependentSourceReconciler::new(cfg).unwrap();
        assert_eq!(r.source_a_label(), "source_a");
        assert_eq!(r.source_b_label(), "directory");

        let anchors = vec![employee("E1", "Ana López")];
        let directory = vec![
            Record::new().with("title", "Luis Marín"),
            Record::new().with("title", "López Ana"),
        ];
        let out = r.reconcile(&anchors, &[], &directory);
        assert_eq!(out[0].status, MatchStatus::SourceBOnly);
        let b = out[0].source_b_match.as_ref().unwrap();
        assert_eq!(b.candidate_index, 1);
        assert_eq!(b.method, MatchMethod::Combined(crate::config::CombineMethod::Weighted));
    }

    #[test]
    fn invalid_config_rejected() {
        let mut cfg = config(0.6, 0.6);
        cfg.anchor.names = None;
        assert!(IndependentSourceReconciler::new(cfg).unwrap_err().is_config());
    }
}
