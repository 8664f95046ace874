use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::CombineMethod;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single attribute value. Anything else the collaborator layer has is
/// expected to arrive as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Null,
}

impl FieldValue {
    /// Text used for comparison. `None` for null and blank values.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(s) if s.trim().is_empty() => None,
            Self::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Number(n) if !n.is_finite() => None,
            Self::Number(n) => Some(Cow::Owned(format_number(*n))),
            Self::Date(d) => Some(Cow::Owned(d.format("%Y-%m-%d").to_string())),
            Self::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.as_text().is_none()
    }
}

/// Integral numbers render without a fractional part (`42`, not `42.0`).
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// An attribute map: an anchor (e.g. an employee) or a candidate (a hire
/// event, a position). Field lookups never fail; absent fields read as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Comparison text for `field`, `None` when absent, null or blank.
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        self.fields.get(field).and_then(FieldValue::as_text)
    }

    /// True when `field` holds comparable text.
    pub fn has_value(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|v| !v.is_null())
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceTier {
    /// Classify a 0–100 score with the default bands.
    pub fn from_score(score: f64) -> Self {
        TierBands::default().classify(score)
    }

    pub const ALL: [ConfidenceTier; 5] = [
        Self::VeryHigh,
        Self::High,
        Self::Medium,
        Self::Low,
        Self::VeryLow,
    ];
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VeryLow => write!(f, "very_low"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::VeryHigh => write!(f, "very_high"),
        }
    }
}

/// Lower bounds (inclusive, 0–100 scale) of each tier above `VeryLow`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TierBands {
    pub very_high: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for TierBands {
    fn default() -> Self {
        Self {
            very_high: 90.0,
            high: 80.0,
            medium: 70.0,
            low: 60.0,
        }
    }
}

impl TierBands {
    pub fn classify(&self, score: f64) -> ConfidenceTier {
        if score >= self.very_high {
            ConfidenceTier::VeryHigh
        } else if score >= self.high {
            ConfidenceTier::High
        } else if score >= self.medium {
            ConfidenceTier::Medium
        } else if score >= self.low {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::VeryLow
        }
    }

    pub(crate) fn is_descending(&self) -> bool {
        self.very_high >= self.high && self.high >= self.medium && self.medium >= self.low
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Label attached by the name matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatchMethod {
    ExactMatch,
    HighConfidence,
    MediumConfidence,
    LowConfidence,
}

impl NameMatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactMatch => "exact_match",
            Self::HighConfidence => "high_confidence",
            Self::MediumConfidence => "medium_confidence",
            Self::LowConfidence => "low_confidence",
        }
    }
}

impl std::fmt::Display for NameMatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a match was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MatchMethod {
    Combined(CombineMethod),
    Name(NameMatchMethod),
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Combined(m) => write!(f, "{m}"),
            Self::Name(m) => write!(f, "{m}"),
        }
    }
}

/// Per-field similarity of one (anchor, candidate) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldScore {
    pub field_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Position of the candidate in the supplied candidate set.
    pub candidate_index: usize,
    pub candidate: Record,
    /// 0–100.
    pub combined_score: f64,
    pub field_scores: BTreeMap<String, f64>,
    pub confidence: ConfidenceTier,
    pub method: MatchMethod,
}

impl MatchResult {
    /// Field scores as a list, in field-name order.
    pub fn scores(&self) -> Vec<FieldScore> {
        self.field_scores
            .iter()
            .map(|(field_name, score)| FieldScore {
                field_name: field_name.clone(),
                score: *score,
            })
            .collect()
    }
}

/// One row of a batch match: a `MatchResult` tagged with its anchor and rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub anchor_index: usize,
    /// 1-based rank within the anchor's results.
    pub rank: usize,
    #[serde(flatten)]
    pub result: MatchResult,
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Both,
    SourceAOnly,
    SourceBOnly,
    None,
}

impl MatchStatus {
    /// Pure classification over the two independent pass outcomes.
    pub fn from_presence(in_a: bool, in_b: bool) -> Self {
        match (in_a, in_b) {
            (true, true) => Self::Both,
            (true, false) => Self::SourceAOnly,
            (false, true) => Self::SourceBOnly,
            (false, false) => Self::None,
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Both => write!(f, "both"),
            Self::SourceAOnly => write!(f, "source_a_only"),
            Self::SourceBOnly => write!(f, "source_b_only"),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedRecord {
    pub anchor_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<String>,
    pub anchor: Record,
    pub source_a_match: Option<MatchResult>,
    pub source_b_match: Option<MatchResult>,
    pub status: MatchStatus,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileSummary {
    pub total_anchors: usize,
    pub both: usize,
    pub source_a_only: usize,
    pub source_b_only: usize,
    pub none: usize,
    /// Percentage of anchors with a match in at least one source.
    pub match_rate_any: f64,
    /// Percentage of anchors matched in both sources.
    pub match_rate_both: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    pub anchors: usize,
    pub anchors_with_matches: usize,
    pub anchors_without_matches: usize,
    pub total_matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    pub confidence_counts: HashMap<String, usize>,
}

/// Anchor → candidate links for one source, ready for a downstream writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkTable {
    pub name: String,
    pub rows: Vec<LinkRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRow {
    pub anchor_id: String,
    pub candidate_id: String,
    pub score: f64,
    pub confidence: ConfidenceTier,
    pub method: MatchMethod,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub kind: String,
    pub engine_version: String,
    pub run_at: String,
}
