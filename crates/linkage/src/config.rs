use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LinkageError;
use crate::model::TierBands;
use crate::scorer::Scorer;

// ---------------------------------------------------------------------------
// Top-level job config
// ---------------------------------------------------------------------------

/// A job file: either a batch match of one table against another, or an
/// independent two-source reconciliation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobConfig {
    Match(MatchConfig),
    Reconcile(ReconcileConfig),
}

impl JobConfig {
    pub fn from_toml(input: &str) -> Result<Self, LinkageError> {
        let config: JobConfig =
            toml::from_str(input).map_err(|e| LinkageError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LinkageError> {
        match self {
            Self::Match(m) => m.validate(),
            Self::Reconcile(r) => r.validate(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Match(m) => &m.name,
            Self::Reconcile(r) => &r.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Match(_) => "match",
            Self::Reconcile(_) => "reconcile",
        }
    }
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// Where a table comes from and which column identifies its rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetConfig {
    /// CSV path, resolved by the caller. Engine-only users leave it empty.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

// ---------------------------------------------------------------------------
// Field specs + matcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMethod {
    /// Σ score·weight.
    #[default]
    Weighted,
    /// Mean of all field scores.
    Average,
    Max,
    Min,
}

impl CombineMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Weighted => "weighted",
            Self::Average => "average",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    /// Combine per-field scores. `weights` is only read by `Weighted` and must
    /// be parallel to `scores`.
    pub fn combine(&self, scores: &[f64], weights: &[f64]) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }
        match self {
            Self::Weighted => scores.iter().zip(weights).map(|(s, w)| s * w).sum(),
            Self::Average => scores.iter().sum::<f64>() / scores.len() as f64,
            Self::Max => scores.iter().copied().fold(f64::MIN, f64::max),
            Self::Min => scores.iter().copied().fold(f64::MAX, f64::min),
        }
    }
}

impl std::fmt::Display for CombineMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CombineMethod {
    type Err = LinkageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "weighted" => Ok(Self::Weighted),
            "average" => Ok(Self::Average),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            other => Err(LinkageError::UnknownCombineMethod(other.to_string())),
        }
    }
}

/// One field-pair comparison.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldMatchSpec {
    #[serde(rename = "source")]
    pub source_field: String,
    #[serde(rename = "target")]
    pub target_field: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub scorer: Scorer,
    /// Field scores below this are forced to 0 before combination.
    #[serde(default, rename = "threshold")]
    pub field_threshold: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl FieldMatchSpec {
    pub fn new(source_field: &str, target_field: &str) -> Self {
        Self {
            source_field: source_field.to_string(),
            target_field: target_field.to_string(),
            weight: default_weight(),
            scorer: Scorer::default(),
            field_threshold: 0.0,
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn field_threshold(mut self, threshold: f64) -> Self {
        self.field_threshold = threshold;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    pub fields: Vec<FieldMatchSpec>,
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    #[serde(default)]
    pub combine_method: CombineMethod,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub tiers: TierBands,
}

fn default_score_threshold() -> f64 {
    60.0
}

fn default_top_n() -> usize {
    1
}

impl MatcherConfig {
    pub fn new(fields: Vec<FieldMatchSpec>) -> Self {
        Self {
            fields,
            score_threshold: default_score_threshold(),
            combine_method: CombineMethod::default(),
            top_n: default_top_n(),
            tiers: TierBands::default(),
        }
    }

    pub fn score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn combine_method(mut self, method: CombineMethod) -> Self {
        self.combine_method = method;
        self
    }

    pub fn top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn validate(&self) -> Result<(), LinkageError> {
        if self.fields.is_empty() {
            return Err(LinkageError::EmptyFieldSpecs);
        }

        let mut seen = HashSet::new();
        for spec in &self.fields {
            if spec.source_field.trim().is_empty() || spec.target_field.trim().is_empty() {
                return Err(LinkageError::ConfigValidation(
                    "field spec with an empty source or target field name".into(),
                ));
            }
            if !seen.insert(spec.source_field.as_str()) {
                return Err(LinkageError::DuplicateField(spec.source_field.clone()));
            }
            if !spec.weight.is_finite() || spec.weight < 0.0 {
                return Err(LinkageError::InvalidWeight {
                    field: spec.source_field.clone(),
                    weight: spec.weight,
                });
            }
            check_percent(
                &format!("field '{}' threshold", spec.source_field),
                spec.field_threshold,
            )?;
        }

        if self.combine_method == CombineMethod::Weighted {
            let total: f64 = self.fields.iter().map(|s| s.weight).sum();
            if total <= 0.0 {
                return Err(LinkageError::InvalidWeight {
                    field: "(all fields)".into(),
                    weight: total,
                });
            }
        }

        check_percent("score_threshold", self.score_threshold)?;
        if self.top_n == 0 {
            return Err(LinkageError::ConfigValidation("top_n must be at least 1".into()));
        }
        if !self.tiers.is_descending() {
            return Err(LinkageError::ConfigValidation(
                "tier bands must satisfy very_high >= high >= medium >= low".into(),
            ));
        }
        Ok(())
    }
}

fn check_percent(what: &str, value: f64) -> Result<(), LinkageError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(LinkageError::ConfigValidation(format!(
            "{what} must be within 0..=100, got {value}"
        )));
    }
    Ok(())
}

fn check_unit(what: &str, value: f64) -> Result<(), LinkageError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(LinkageError::ConfigValidation(format!(
            "{what} must be within 0..=1, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Match job
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: DatasetConfig,
    #[serde(default)]
    pub target: DatasetConfig,
    pub matcher: MatcherConfig,
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), LinkageError> {
        self.matcher.validate()
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// Where a record keeps its person name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NameSource {
    /// Separate first / last name columns.
    Split { first: String, last: String },
    /// One full-name column; first token is the first name, the rest the last.
    Full { full: String },
}

/// Label cutoffs for the name matcher, on a 0–1 scale.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NameBands {
    pub high: f64,
    pub medium: f64,
}

impl Default for NameBands {
    fn default() -> Self {
        Self {
            high: 0.9,
            medium: 0.7,
        }
    }
}

// ---------------------------------------------------------------------------
// Reconcile job
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnchorConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub names: Option<NameSource>,
}

/// One candidate population. Exactly one of `names` / `matcher` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub names: Option<NameSource>,
    #[serde(default)]
    pub matcher: Option<MatcherConfig>,
    /// Minimum name similarity (0–1) for names mode.
    #[serde(default = "default_name_threshold")]
    pub threshold: f64,
}

fn default_name_threshold() -> f64 {
    0.6
}

impl SourceConfig {
    pub fn names(names: NameSource) -> Self {
        Self {
            label: None,
            file: None,
            id: None,
            names: Some(names),
            matcher: None,
            threshold: default_name_threshold(),
        }
    }

    pub fn weighted(matcher: MatcherConfig) -> Self {
        Self {
            label: None,
            file: None,
            id: None,
            names: None,
            matcher: Some(matcher),
            threshold: default_name_threshold(),
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    fn validate(&self, side: &str, anchor: &AnchorConfig) -> Result<(), LinkageError> {
        match (&self.names, &self.matcher) {
            (Some(_), Some(_)) => Err(LinkageError::ConfigValidation(format!(
                "{side}: set either `names` or `matcher`, not both"
            ))),
            (None, None) => Err(LinkageError::ConfigValidation(format!(
                "{side}: one of `names` or `matcher` is required"
            ))),
            (Some(_), None) => {
                if anchor.names.is_none() {
                    return Err(LinkageError::ConfigValidation(format!(
                        "{side}: name matching requires `anchor.names`"
                    )));
                }
                check_unit(&format!("{side} threshold"), self.threshold)
            }
            (None, Some(matcher)) => matcher.validate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub anchor: AnchorConfig,
    pub source_a: SourceConfig,
    pub source_b: SourceConfig,
    #[serde(default)]
    pub name_bands: NameBands,
    /// Bands used to tier name-match scores (similarity × 100).
    #[serde(default)]
    pub tiers: TierBands,
}

impl ReconcileConfig {
    pub fn new(anchor: AnchorConfig, source_a: SourceConfig, source_b: SourceConfig) -> Self {
        Self {
            name: String::new(),
            anchor,
            source_a,
            source_b,
            name_bands: NameBands::default(),
            tiers: TierBands::default(),
        }
    }

    pub fn validate(&self) -> Result<(), LinkageError> {
        self.source_a.validate("source_a", &self.anchor)?;
        self.source_b.validate("source_b", &self.anchor)?;

        let bands = &self.name_bands;
        check_unit("name_bands.high", bands.high)?;
        check_unit("name_bands.medium", bands.medium)?;
        if bands.medium > bands.high {
            return Err(LinkageError::ConfigValidation(
                "name_bands.medium must not exceed name_bands.high".into(),
            ));
        }
        if !self.tiers.is_descending() {
            return Err(LinkageError::ConfigValidation(
                "tier bands must satisfy very_high >= high >= medium >= low".into(),
            ));
        }
        Ok(())
    }

    pub fn source_a_label(&self) -> &str {
        self.source_a.label.as_deref().unwrap_or("source_a")
    }

    pub fn source_b_label(&self) -> &str {
        self.source_b.label.as_deref().unwrap_or("source_b")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
