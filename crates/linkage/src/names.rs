//! Two-part (first / last) person-name comparison.

use std::borrow::Cow;

use serde::Serialize;

use crate::config::{NameBands, NameSource};
use crate::model::{NameMatchMethod, Record};
use crate::normalize::{normalize, token_set};

/// Similarity on a 0–1 scale plus the label it classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NameMatch {
    pub score: f64,
    pub method: NameMatchMethod,
}

/// Similarity of two name parts, 0–1: 1.0 when equal after normalization,
/// else the Jaccard index of their token sets.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let left = normalize(a);
    let right = normalize(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }

    let left = token_set(&left);
    let right = token_set(&right);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    intersection as f64 / union as f64
}

/// Split "Ana María López García" into ("Ana", "María López García").
/// Fewer than two tokens yields `None`.
pub fn split_full_name(full: &str) -> Option<(String, String)> {
    let mut parts = full.split_whitespace();
    let first = parts.next()?;
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        return None;
    }
    Some((first.to_string(), rest.join(" ")))
}

/// Read a (first, last) pair out of a record. `None` when either part is
/// missing or blank.
pub fn extract_name(record: &Record, source: &NameSource) -> Option<(String, String)> {
    match source {
        NameSource::Split { first, last } => {
            let first = record.text(first).map(Cow::into_owned)?;
            let last = record.text(last).map(Cow::into_owned)?;
            Some((first.trim().to_string(), last.trim().to_string()))
        }
        NameSource::Full { full } => split_full_name(&record.text(full)?),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatcher {
    bands: NameBands,
}

impl NameMatcher {
    pub fn new(bands: NameBands) -> Self {
        Self { bands }
    }

    pub fn match_names(
        &self,
        first_a: &str,
        last_a: &str,
        first_b: &str,
        last_b: &str,
    ) -> NameMatch {
        let (nf_a, nl_a) = (normalize(first_a), normalize(last_a));
        let (nf_b, nl_b) = (normalize(first_b), normalize(last_b));

        if !nf_a.is_empty() && !nl_a.is_empty() && nf_a == nf_b && nl_a == nl_b {
            return NameMatch {
                score: 1.0,
                method: NameMatchMethod::ExactMatch,
            };
        }

        let first = name_similarity(first_a, first_b);
        let last = name_similarity(last_a, last_b);
        let score = (first + last) / 2.0;

        NameMatch {
            score,
            method: self.label(score),
        }
    }

    fn label(&self, score: f64) -> NameMatchMethod {
        if score >= self.bands.high {
            NameMatchMethod::HighConfidence
        } else if score >= self.bands.medium {
            NameMatchMethod::MediumConfidence
        } else {
            NameMatchMethod::LowConfidence
        }
    }
}

/// Shorthand for a default-banded [`NameMatcher`].
pub fn match_names(first_a: &str, last_a: &str, first_b: &str, last_b: &str) -> NameMatch {
    NameMatcher::default().match_names(first_a, last_a, first_b, last_b)
}
