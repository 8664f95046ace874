use std::collections::BTreeMap;

use crate::config::{CombineMethod, FieldMatchSpec, MatcherConfig};
use crate::error::LinkageError;
use crate::model::{MatchMethod, MatchResult, RankedMatch, Record, TierBands};
use crate::scorer::Scorer;

const WEIGHT_EPSILON: f64 = 1e-9;

/// Scale weights proportionally so they sum to 1.0. A zero total is left
/// untouched (validation rejects it for the weighted strategy).
pub fn normalize_weights(specs: &[FieldMatchSpec]) -> Vec<FieldMatchSpec> {
    let total: f64 = specs.iter().map(|s| s.weight).sum();
    if total <= 0.0 {
        return specs.to_vec();
    }
    specs
        .iter()
        .map(|s| FieldMatchSpec {
            weight: s.weight / total,
            ..s.clone()
        })
        .collect()
}

/// Scores one anchor against a candidate population across several fields.
#[derive(Debug, Clone)]
pub struct WeightedRecordMatcher {
    specs: Vec<FieldMatchSpec>,
    score_threshold: f64,
    combine_method: CombineMethod,
    tiers: TierBands,
}

impl WeightedRecordMatcher {
    pub fn new(config: MatcherConfig) -> Result<Self, LinkageError> {
        config.validate()?;

        let mut specs = config.fields;
        if config.combine_method == CombineMethod::Weighted {
            let total: f64 = specs.iter().map(|s| s.weight).sum();
            if (total - 1.0).abs() > WEIGHT_EPSILON {
                log::warn!("field weights sum to {total}, normalizing to 1.0");
                specs = normalize_weights(&specs);
            }
        }

        Ok(Self {
            specs,
            score_threshold: config.score_threshold,
            combine_method: config.combine_method,
            tiers: config.tiers,
        })
    }

    /// Build from specs with the default tier bands.
    pub fn with_specs(
        specs: Vec<FieldMatchSpec>,
        score_threshold: f64,
        combine_method: CombineMethod,
    ) -> Result<Self, LinkageError> {
        Self::new(
            MatcherConfig::new(specs)
                .score_threshold(score_threshold)
                .combine_method(combine_method),
        )
    }

    /// Effective specs (weights already normalized for the weighted strategy).
    pub fn specs(&self) -> &[FieldMatchSpec] {
        &self.specs
    }

    pub fn score_threshold(&self) -> f64 {
        self.score_threshold
    }

    pub fn combine_method(&self) -> CombineMethod {
        self.combine_method
    }

    fn field_score(&self, anchor: &Record, candidate: &Record, spec: &FieldMatchSpec) -> f64 {
        let (Some(source), Some(target)) =
            (anchor.text(&spec.source_field), candidate.text(&spec.target_field))
        else {
            return 0.0;
        };

        let source = source.trim().to_lowercase();
        let target = target.trim().to_lowercase();
        if source.is_empty() || target.is_empty() {
            return 0.0;
        }

        let score = spec.scorer.score(&source, &target);
        if score >= spec.field_threshold {
            score
        } else {
            0.0
        }
    }

    /// Score a single (anchor, candidate) pair regardless of the threshold.
    pub fn score_pair(&self, anchor: &Record, candidate: &Record) -> (f64, BTreeMap<String, f64>) {
        let scores: Vec<f64> = self
            .specs
            .iter()
            .map(|spec| self.field_score(anchor, candidate, spec))
            .collect();
        let weights: Vec<f64> = self.specs.iter().map(|s| s.weight).collect();
        let combined = self.combine_method.combine(&scores, &weights);

        let field_scores = self
            .specs
            .iter()
            .zip(scores)
            .map(|(spec, score)| (spec.source_field.clone(), score))
            .collect();
        (combined, field_scores)
    }

    /// Rank `candidates` for `anchor`: drop those under the score threshold,
    /// sort by combined score descending (ties keep candidate order), keep
    /// at most `top_n`.
    pub fn match_record(
        &self,
        anchor: &Record,
        candidates: &[Record],
        top_n: usize,
    ) -> Vec<MatchResult> {
        let mut matches: Vec<MatchResult> = candidates
            .iter()
            .enumerate()
            .filter_map(|(candidate_index, candidate)| {
                let (combined_score, field_scores) = self.score_pair(anchor, candidate);
                if combined_score < self.score_threshold {
                    return None;
                }
                Some(MatchResult {
                    candidate_index,
                    candidate: candidate.clone(),
                    combined_score,
                    field_scores,
                    confidence: self.tiers.classify(combined_score),
                    method: MatchMethod::Combined(self.combine_method),
                })
            })
            .collect();

        matches.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
        matches.truncate(top_n);
        matches
    }

    /// Run [`Self::match_record`] for every anchor.
    pub fn match_all(
        &self,
        anchors: &[Record],
        candidates: &[Record],
        top_n: usize,
    ) -> Vec<RankedMatch> {
        anchors
            .iter()
            .enumerate()
            .flat_map(|(anchor_index, anchor)| {
                self.match_record(anchor, candidates, top_n)
                    .into_iter()
                    .enumerate()
                    .map(move |(i, result)| RankedMatch {
                        anchor_index,
                        rank: i + 1,
                        result,
                    })
            })
            .collect()
    }
}

/// Single-field matching over plain string lists: each source value's best
/// `limit` targets by `scorer`, highest first (ties keep target order).
pub fn quick_match(
    source_values: &[String],
    target_values: &[String],
    limit: usize,
    scorer: Scorer,
) -> BTreeMap<String, Vec<(String, f64)>> {
    source_values
        .iter()
        .map(|source| {
            let mut scored: Vec<(String, f64)> = target_values
                .iter()
                .map(|target| (target.clone(), scorer.score(source, target)))
                .collect();
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            scored.truncate(limit);
            (source.clone(), scored)
        })
        .collect()
}
