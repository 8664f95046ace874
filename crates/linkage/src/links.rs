//! Link tables: anchor id → candidate id rows derived from match results.
//!
//! Only pairs where both sides carry an id make it into a table; writing the
//! table anywhere is left to the caller.

use crate::model::{CombinedRecord, LinkRow, LinkTable, MatchResult, RankedMatch, Record};

/// Which source of a reconciliation a link table is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSide {
    SourceA,
    SourceB,
}

impl LinkSide {
    fn pick<'a>(&self, record: &'a CombinedRecord) -> Option<&'a MatchResult> {
        match self {
            Self::SourceA => record.source_a_match.as_ref(),
            Self::SourceB => record.source_b_match.as_ref(),
        }
    }
}

fn record_id(record: &Record, field: &str) -> Option<String> {
    record.text(field).map(|id| id.trim().to_string()).filter(|id| !id.is_empty())
}

fn link_row(anchor_id: String, candidate_field: &str, result: &MatchResult) -> Option<LinkRow> {
    Some(LinkRow {
        anchor_id,
        candidate_id: record_id(&result.candidate, candidate_field)?,
        score: result.combined_score,
        confidence: result.confidence,
        method: result.method,
    })
}

/// One row per reconciled anchor that has an id and a match on `side` whose
/// candidate has an id in `candidate_id_field`.
pub fn build_link_table(
    name: &str,
    records: &[CombinedRecord],
    side: LinkSide,
    candidate_id_field: &str,
) -> LinkTable {
    let rows = records
        .iter()
        .filter_map(|record| {
            let anchor_id = record.anchor_id.clone().filter(|id| !id.trim().is_empty())?;
            link_row(anchor_id, candidate_id_field, side.pick(record)?)
        })
        .collect();

    LinkTable {
        name: name.to_string(),
        rows,
    }
}

/// Link rows for a batch match; `anchors` are the records the rows'
/// `anchor_index` refers to.
pub fn build_match_link_table(
    name: &str,
    rows: &[RankedMatch],
    anchors: &[Record],
    anchor_id_field: &str,
    candidate_id_field: &str,
) -> LinkTable {
    let rows = rows
        .iter()
        .filter_map(|row| {
            let anchor = anchors.get(row.anchor_index)?;
            let anchor_id = record_id(anchor, anchor_id_field)?;
            link_row(anchor_id, candidate_id_field, &row.result)
        })
        .collect();

    LinkTable {
        name: name.to_string(),
        rows,
    }
}
