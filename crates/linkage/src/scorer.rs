//! Interchangeable string similarity functions, all on a 0–100 scale.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LinkageError;
use crate::normalize::{normalize, token_set, tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scorer {
    /// 100 when the normalized strings are equal, else 0.
    ExactNormalized,
    /// Tokens sorted on both sides before comparing ("Smith John" == "John Smith").
    #[default]
    TokenOrder,
    /// Jaccard similarity of the token sets.
    TokenSet,
    /// Best window of the longer string against the shorter one.
    Partial,
    /// Plain edit-distance ratio of the normalized strings.
    Ratio,
}

impl Scorer {
    pub const ALL: [Scorer; 5] = [
        Self::ExactNormalized,
        Self::TokenOrder,
        Self::TokenSet,
        Self::Partial,
        Self::Ratio,
    ];

    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self {
            Self::ExactNormalized => exact_normalized(a, b),
            Self::TokenOrder => token_order_similarity(a, b),
            Self::TokenSet => token_set_similarity(a, b),
            Self::Partial => partial_similarity(a, b),
            Self::Ratio => ratio(&normalize(a), &normalize(b)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ExactNormalized => "exact_normalized",
            Self::TokenOrder => "token_order",
            Self::TokenSet => "token_set",
            Self::Partial => "partial",
            Self::Ratio => "ratio",
        }
    }
}

impl std::fmt::Display for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scorer {
    type Err = LinkageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scorer| scorer.name() == s.trim())
            .ok_or_else(|| LinkageError::UnknownScorer(s.to_string()))
    }
}

/// Normalized Levenshtein similarity of two already-normalized strings.
fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

pub fn exact_normalized(a: &str, b: &str) -> f64 {
    if normalize(a) == normalize(b) {
        100.0
    } else {
        0.0
    }
}

/// Token-less input (punctuation only, blank) scores 0.
pub fn token_order_similarity(a: &str, b: &str) -> f64 {
    let mut left = tokens(a);
    let mut right = tokens(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    left.sort();
    right.sort();
    ratio(&left.join(" "), &right.join(" "))
}

pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let left = token_set(a);
    let right = token_set(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    let union = left.union(&right).count();
    intersection as f64 / union as f64 * 100.0
}

pub fn partial_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    if short_len == long_chars.len() {
        return ratio(&short, &long);
    }

    let mut best = 0.0_f64;
    for window in long_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        let score = ratio(&short, &candidate);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}
