//! `rlink run` / `rlink validate` — config-driven linkage jobs.

use std::path::{Path, PathBuf};

use rosterlink_linkage::config::{JobConfig, SourceConfig};
use rosterlink_linkage::engine::{
    load_csv_file, run_match, run_reconcile, MatchInput, ReconcileInput,
};
use rosterlink_linkage::model::Record;
use rosterlink_linkage::{MatchConfig, ReconcileConfig};
use serde::Serialize;

use crate::CliError;

fn read_config(config_path: &Path) -> Result<JobConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::runtime(format!("cannot read config: {e}")))?;
    JobConfig::from_toml(&config_str).map_err(|e| {
        CliError::linkage(e).with_hint(format!("rlink validate {}", config_path.display()))
    })
}

/// Load a configured CSV, resolving it against the config file's directory.
fn load_table(base_dir: &Path, what: &str, file: Option<&String>) -> Result<Vec<Record>, CliError> {
    let file = file.ok_or_else(|| {
        CliError::config(format!("{what}.file is required to run from the CLI"))
    })?;
    let path = base_dir.join(file);
    let records = load_csv_file(&path).map_err(CliError::linkage)?;
    log::debug!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn emit<T: Serialize>(
    result: &T,
    json_output: bool,
    output_file: Option<&PathBuf>,
) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(result)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;

    if let Some(path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::runtime(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }
    Ok(())
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    match config {
        JobConfig::Match(config) => {
            run_match_job(&config, base_dir, json_output, output_file.as_ref(), strict)
        }
        JobConfig::Reconcile(config) => {
            run_reconcile_job(&config, base_dir, json_output, output_file.as_ref(), strict)
        }
    }
}

fn run_match_job(
    config: &MatchConfig,
    base_dir: &Path,
    json_output: bool,
    output_file: Option<&PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let input = MatchInput {
        source: load_table(base_dir, "source", config.source.file.as_ref())?,
        target: load_table(base_dir, "target", config.target.file.as_ref())?,
    };

    let result = run_match(config, &input).map_err(CliError::linkage)?;
    emit(&result, json_output, output_file)?;

    let s = &result.summary;
    let average = s
        .average_score
        .map(|a| format!(", average score {a:.1}"))
        .unwrap_or_default();
    eprintln!(
        "match '{}': {} anchors, {} matched, {} unmatched ({} rows{average})",
        result.meta.config_name,
        s.anchors,
        s.anchors_with_matches,
        s.anchors_without_matches,
        s.total_matches,
    );

    if strict && result.unlinked() > 0 {
        return Err(CliError::unlinked(format!("{} anchor(s) without a match", result.unlinked())));
    }
    Ok(())
}

fn run_reconcile_job(
    config: &ReconcileConfig,
    base_dir: &Path,
    json_output: bool,
    output_file: Option<&PathBuf>,
    strict: bool,
) -> Result<(), CliError> {
    let input = ReconcileInput {
        anchors: load_table(base_dir, "anchor", config.anchor.file.as_ref())?,
        source_a: load_table(base_dir, config.source_a_label(), config.source_a.file.as_ref())?,
        source_b: load_table(base_dir, config.source_b_label(), config.source_b.file.as_ref())?,
    };

    let result = run_reconcile(config, &input).map_err(CliError::linkage)?;
    emit(&result, json_output, output_file)?;

    let s = &result.summary;
    eprintln!(
        "reconcile '{}': {} anchors, {} in both, {} {} only, {} {} only, {} unmatched",
        result.meta.config_name,
        s.total_anchors,
        s.both,
        s.source_a_only,
        config.source_a_label(),
        s.source_b_only,
        config.source_b_label(),
        s.none,
    );
    eprintln!(
        "match rate: {:.1}% any source, {:.1}% both",
        s.match_rate_any, s.match_rate_both
    );

    if strict && result.unlinked() > 0 {
        return Err(CliError::unlinked(format!(
            "{} anchor(s) not matched in both sources",
            result.unlinked()
        )));
    }
    Ok(())
}

fn describe_source(label: &str, source: &SourceConfig) -> String {
    match &source.matcher {
        Some(matcher) => format!("{label}: weighted, {} field(s)", matcher.fields.len()),
        None => format!("{label}: names, threshold {}", source.threshold),
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::runtime(format!("cannot read config: {e}")))?;

    match JobConfig::from_toml(&config_str).map_err(CliError::linkage)? {
        JobConfig::Match(config) => {
            eprintln!(
                "valid: match job '{}' with {} field(s), {} combine, threshold {}",
                config.name,
                config.matcher.fields.len(),
                config.matcher.combine_method,
                config.matcher.score_threshold,
            );
        }
        JobConfig::Reconcile(config) => {
            eprintln!(
                "valid: reconcile job '{}' ({}; {})",
                config.name,
                describe_source(config.source_a_label(), &config.source_a),
                describe_source(config.source_b_label(), &config.source_b),
            );
        }
    }
    Ok(())
}
