//! prgate - pull-request compliance checks
//!
//! Offline driver for the rule engine. Reads a pull-request snapshot from
//! disk and runs a rule catalog against it; label and branch-update actions
//! are applied to the in-memory snapshot only.
//!
//! ## Commands
//!
//! - `validate`: Compile a rule manifest (or the built-in catalog)
//! - `check`: Evaluate a pull-request snapshot and print the result as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use prgate_core::{
    demo_rules, EngineConfig, EvaluationResult, PullRequestSnapshot, RuleEngine, RuleSet,
    RulesManifest, SnapshotClient,
};

#[derive(Parser)]
#[command(name = "prgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pull-request compliance rule engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a rule manifest and report what it declares
    Validate {
        /// Rule manifest (.toml or .json); the built-in catalog if omitted
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Evaluate a pull-request snapshot against a rule catalog
    ///
    /// Exits non-zero when the pull request is not compliant.
    Check {
        /// Pull-request snapshot (JSON)
        #[arg(long)]
        pr: PathBuf,

        /// Rule manifest (.toml or .json); the built-in catalog if omitted
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Maximum checks evaluated at once [default: $PRGATE_MAX_CONCURRENT or 4]
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Let every freshness check request a branch update
        /// [default: $PRGATE_UPDATE_REMEDIATION or off]
        #[arg(long)]
        update_remediation: bool,
    },
}

#[derive(Serialize)]
struct ValidateReport {
    source: String,
    automatic: usize,
    manual: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    prgate_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Validate { rules } => cmd_validate(rules.as_deref()),
        Commands::Check {
            pr,
            rules,
            max_concurrent,
            update_remediation,
        } => {
            let config = engine_config(max_concurrent, update_remediation)?;
            cmd_check(&pr, rules.as_deref(), config).await
        }
    }
}

/// Environment configuration with explicit flags layered on top.
fn engine_config(max_concurrent: Option<usize>, update_remediation: bool) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_env().context("Invalid PRGATE_* environment")?;
    if let Some(n) = max_concurrent {
        config = config.with_max_concurrent(n);
    }
    if update_remediation {
        config = config.with_update_remediation(true);
    }
    Ok(config)
}

fn load_rules(path: Option<&Path>) -> Result<RuleSet> {
    match path {
        Some(path) => {
            let manifest = RulesManifest::load(path)
                .with_context(|| format!("Failed to load rule manifest {}", path.display()))?;
            manifest
                .compile()
                .with_context(|| format!("Invalid rule manifest {}", path.display()))
        }
        None => demo_rules().context("Built-in catalog is invalid"),
    }
}

fn source_name(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string())
}

fn cmd_validate(path: Option<&Path>) -> Result<()> {
    let rules = load_rules(path)?;
    let report = ValidateReport {
        source: source_name(path),
        automatic: rules.automatic().len(),
        manual: rules.manual().len(),
    };
    info!(source = %report.source, "Rule catalog is valid");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<PullRequestSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    PullRequestSnapshot::from_json_str(&raw)
        .with_context(|| format!("Invalid snapshot {}", path.display()))
}

async fn cmd_check(pr: &Path, rules: Option<&Path>, config: EngineConfig) -> Result<()> {
    let rules = load_rules(rules)?;
    let snapshot = load_snapshot(pr)?;
    let engine = RuleEngine::new(rules, config);

    let client = Arc::new(SnapshotClient::new(snapshot.clone()));
    let result = engine.evaluate(snapshot.id(), client).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    ensure_compliant(&result)
}

fn ensure_compliant(result: &EvaluationResult) -> Result<()> {
    if result.is_compliant() {
        return Ok(());
    }
    let failed = result.failed().count();
    let indeterminate = result.indeterminate().count();
    anyhow::bail!(
        "{} is not compliant ({} failed, {} indeterminate)",
        result.pull_request,
        failed,
        indeterminate
    )
}
