//! `rlink quick` — single-scorer matching of two plain value lists.

use std::path::{Path, PathBuf};

use rosterlink_linkage::{quick_match, Scorer};

use crate::CliError;

/// Non-blank, trimmed lines of a file.
fn read_values(path: &Path) -> Result<Vec<String>, CliError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| CliError::runtime(format!("cannot read {}: {e}", path.display())))?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn cmd_quick(
    source: PathBuf,
    target: PathBuf,
    limit: usize,
    scorer: &str,
    json_output: bool,
) -> Result<(), CliError> {
    let scorer: Scorer = scorer.parse().map_err(|e: rosterlink_linkage::LinkageError| {
        CliError::usage(e.to_string()).with_hint("rlink quick --help")
    })?;

    let source_values = read_values(&source)?;
    let target_values = read_values(&target)?;
    let matches = quick_match(&source_values, &target_values, limit, scorer);

    if json_output {
        let json_str = serde_json::to_string_pretty(&matches)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    // Keep the input order rather than the map's sorted order.
    for value in &source_values {
        let Some(ranked) = matches.get(value) else {
            continue;
        };
        println!("{value}");
        for (target, score) in ranked {
            println!("  {score:>6.1}  {target}");
        }
    }
    eprintln!(
        "{} source value(s) against {} target(s), scorer {scorer}",
        source_values.len(),
        target_values.len()
    );
    Ok(())
}
