// rosterlink CLI - run record-linkage jobs from TOML configs and CSV files

mod exit_codes;
mod quick;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{
    EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_UNLINKED, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "rlink")]
#[command(about = "Fuzzy record linkage across weakly-keyed tables")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a match or reconcile job from a TOML config file
    #[command(after_help = "\
Exit code 5 under --strict means at least one anchor was left unlinked \
(no match at all for match jobs, not matched in both sources for reconcile jobs).

Examples:
  rlink run employees.reconcile.toml
  rlink run employees.reconcile.toml --json
  rlink run positions.match.toml --output links.json
  rlink run employees.reconcile.toml --strict")]
    Run {
        /// Path to the job config (.toml)
        config: PathBuf,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit non-zero when any anchor is left unlinked
        #[arg(long)]
        strict: bool,
    },

    /// Validate a job config without running it
    #[command(after_help = "\
Examples:
  rlink validate employees.reconcile.toml")]
    Validate {
        /// Path to the job config (.toml)
        config: PathBuf,
    },

    /// Match two newline-separated value lists with a single scorer
    #[command(after_help = "\
Examples:
  rlink quick roles.txt titles.txt
  rlink quick roles.txt titles.txt --limit 5 --scorer token_set
  rlink quick roles.txt titles.txt --json")]
    Quick {
        /// File with one source value per line
        source: PathBuf,

        /// File with one target value per line
        target: PathBuf,

        /// Best targets kept per source value
        #[arg(long, default_value_t = 3)]
        limit: usize,

        /// exact_normalized, token_order, token_set, partial or ratio
        #[arg(long, default_value = "token_order")]
        scorer: String,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  rosterlink-linkage ", env!("CARGO_PKG_VERSION"),
    )
}

/// Logs go to stderr so `--json` stdout stays a single document.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
            strict,
        } => run::cmd_run(config, json, output, strict),
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Quick {
            source,
            target,
            limit,
            scorer,
            json,
        } => quick::cmd_quick(source, target, limit, &scorer, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_CONFIG, msg)
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, msg)
    }

    pub fn unlinked(msg: impl Into<String>) -> Self {
        Self::new(EXIT_UNLINKED, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Map an engine error onto the config / runtime split.
    pub fn linkage(err: rosterlink_linkage::LinkageError) -> Self {
        if err.is_config() {
            Self::config(err.to_string())
        } else {
            Self::runtime(err.to_string())
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
