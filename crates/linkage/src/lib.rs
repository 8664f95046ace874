//! `rosterlink-linkage` — Fuzzy record-linkage engine.
//!
//! Pure engine crate: receives pre-loaded records, returns ranked matches and
//! reconciled anchor records. No CLI dependencies; logging goes through the
//! `log` facade.

pub mod config;
pub mod engine;
pub mod error;
pub mod links;
pub mod matcher;
pub mod model;
pub mod names;
pub mod normalize;
pub mod reconcile;
pub mod scorer;
pub mod summary;

pub use config::{
    CombineMethod, FieldMatchSpec, JobConfig, MatchConfig, MatcherConfig, NameBands, NameSource,
    ReconcileConfig, SourceConfig,
};
pub use engine::{
    load_csv_records, run_match, run_reconcile, MatchInput, MatchRun, ReconcileInput, ReconcileRun,
};
pub use error::LinkageError;
pub use matcher::{normalize_weights, quick_match, WeightedRecordMatcher};
pub use model::{
    CombinedRecord, ConfidenceTier, FieldValue, MatchMethod, MatchResult, MatchStatus, Record,
};
pub use names::{match_names, NameMatch, NameMatcher};
pub use reconcile::IndependentSourceReconciler;
pub use scorer::Scorer;
