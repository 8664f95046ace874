use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{MatchConfig, MatcherConfig, NameSource, ReconcileConfig, SourceConfig};
use crate::error::LinkageError;
use crate::links::{build_link_table, build_match_link_table, LinkSide};
use crate::matcher::WeightedRecordMatcher;
use crate::model::{
    format_number, CombinedRecord, FieldValue, LinkTable, MatchSummary, RankedMatch, Record,
    ReconcileSummary, RunMeta,
};
use crate::reconcile::IndependentSourceReconciler;
use crate::summary::{compute_match_summary, compute_reconcile_summary};

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Pre-loaded records for a match job.
#[derive(Debug, Clone, Default)]
pub struct MatchInput {
    pub source: Vec<Record>,
    pub target: Vec<Record>,
}

/// Pre-loaded records for a reconcile job.
#[derive(Debug, Clone, Default)]
pub struct ReconcileInput {
    pub anchors: Vec<Record>,
    pub source_a: Vec<Record>,
    pub source_b: Vec<Record>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchRun {
    pub meta: RunMeta,
    pub summary: MatchSummary,
    pub matches: Vec<RankedMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<LinkTable>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileRun {
    pub meta: RunMeta,
    pub summary: ReconcileSummary,
    pub records: Vec<CombinedRecord>,
    pub links: Vec<LinkTable>,
}

impl ReconcileRun {
    /// Anchors not linked in both sources.
    pub fn unlinked(&self) -> usize {
        self.summary.total_anchors - self.summary.both
    }
}

impl MatchRun {
    pub fn unlinked(&self) -> usize {
        self.summary.anchors_without_matches
    }
}

fn meta(config_name: &str, kind: &str) -> RunMeta {
    RunMeta {
        config_name: config_name.to_string(),
        kind: kind.to_string(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        run_at: chrono::Utc::now().to_rfc3339(),
    }
}

// ---------------------------------------------------------------------------
// Runners
// ---------------------------------------------------------------------------

/// Rank target records for every source record.
pub fn run_match(config: &MatchConfig, input: &MatchInput) -> Result<MatchRun, LinkageError> {
    let matcher = WeightedRecordMatcher::new(config.matcher.clone())?;

    for spec in matcher.specs() {
        warn_missing("source", &spec.source_field, &input.source);
        warn_missing("target", &spec.target_field, &input.target);
    }

    let matches = matcher.match_all(&input.source, &input.target, config.matcher.top_n);
    log::debug!(
        "matched {} source records against {} targets: {} rows",
        input.source.len(),
        input.target.len(),
        matches.len()
    );

    let summary = compute_match_summary(&matches, input.source.len());
    let links = match (&config.source.id, &config.target.id) {
        (Some(source_id), Some(target_id)) => Some(build_match_link_table(
            "links",
            &matches,
            &input.source,
            source_id,
            target_id,
        )),
        _ => None,
    };

    Ok(MatchRun {
        meta: meta(&config.name, "match"),
        summary,
        matches,
        links,
    })
}

/// Link every anchor against both sources.
pub fn run_reconcile(
    config: &ReconcileConfig,
    input: &ReconcileInput,
) -> Result<ReconcileRun, LinkageError> {
    let reconciler = IndependentSourceReconciler::new(config.clone())?;

    if let Some(names) = &config.anchor.names {
        warn_missing_names("anchor", names, &input.anchors);
    }
    let sources = [
        (reconciler.source_a_label(), &config.source_a, &input.source_a),
        (reconciler.source_b_label(), &config.source_b, &input.source_b),
    ];
    for (label, source, candidates) in sources {
        warn_missing_source(label, source, &input.anchors, candidates);
    }

    let records = reconciler.reconcile(&input.anchors, &input.source_a, &input.source_b);
    let summary = compute_reconcile_summary(&records);

    let mut links = Vec::new();
    if config.anchor.id.is_some() {
        let sides = [
            (LinkSide::SourceA, reconciler.source_a_label(), &config.source_a),
            (LinkSide::SourceB, reconciler.source_b_label(), &config.source_b),
        ];
        for (side, label, source) in sides {
            if let Some(id) = &source.id {
                links.push(build_link_table(&format!("{label}_links"), &records, side, id));
            }
        }
    }

    Ok(ReconcileRun {
        meta: meta(&config.name, "reconcile"),
        summary,
        records,
        links,
    })
}

fn warn_missing(role: &str, field: &str, records: &[Record]) {
    if !records.is_empty() && !records.iter().any(|r| r.has_value(field)) {
        log::warn!("{role} field '{field}' is missing or blank in every record; it will score 0");
    }
}

fn warn_missing_names(role: &str, names: &NameSource, records: &[Record]) {
    match names {
        NameSource::Split { first, last } => {
            warn_missing(role, first, records);
            warn_missing(role, last, records);
        }
        NameSource::Full { full } => warn_missing(role, full, records),
    }
}

fn warn_missing_source(
    label: &str,
    source: &SourceConfig,
    anchors: &[Record],
    candidates: &[Record],
) {
    if let Some(names) = &source.names {
        warn_missing_names(label, names, candidates);
    }
    if let Some(MatcherConfig { fields, .. }) = &source.matcher {
        for spec in fields {
            warn_missing("anchor", &spec.source_field, anchors);
            warn_missing(label, &spec.target_field, candidates);
        }
    }
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

/// Load CSV rows into records, one field per header. Blank cells become
/// `Null`, `YYYY-MM-DD` cells `Date`, numeric cells `Number` when the number
/// renders back to the same text (so `007` stays text), anything else `Text`.
pub fn load_csv_records(csv_data: &str) -> Result<Vec<Record>, LinkageError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LinkageError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| LinkageError::Csv(e.to_string()))?;
        let record: Record = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), infer_value(row.get(i).unwrap_or(""))))
            .collect();
        records.push(record);
    }
    Ok(records)
}

fn infer_value(cell: &str) -> FieldValue {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return FieldValue::Date(date);
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() && format_number(n) == trimmed {
            return FieldValue::Number(n);
        }
    }
    FieldValue::Text(cell.to_string())
}

/// Read and parse a CSV file.
pub fn load_csv_file(path: &std::path::Path) -> Result<Vec<Record>, LinkageError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| LinkageError::Io(format!("cannot read {}: {e}", path.display())))?;
    load_csv_records(&data)
}
