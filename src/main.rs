use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use schema_diff::config::{self, Config, DatabaseConfig};
use schema_diff::risk::{ExecutionOptions, RiskAnalyzer, ScriptExecutor};
use schema_diff::schema::SchemaSnapshot;
use schema_diff::sync::{SyncDirection, SyncFilters, SyncScriptGenerator};
use schema_diff::utils::logging::init_logging;
use schema_diff::{ComparisonEngine, DatabaseConnection};

#[derive(Parser)]
#[command(
    name = "schema-diff",
    version,
    about = "Compare schema snapshots and generate synchronization scripts"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum DirectionArg {
    SourceToTarget,
    TargetToSource,
}

impl From<DirectionArg> for SyncDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::SourceToTarget => SyncDirection::SourceToTarget,
            DirectionArg::TargetToSource => SyncDirection::TargetToSource,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Compare two snapshot files and print the difference report
    Compare {
        /// Source snapshot (JSON)
        source: PathBuf,
        /// Target snapshot (JSON)
        target: PathBuf,
        /// Write the full report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate forward and rollback SQL from two snapshot files
    Script {
        source: PathBuf,
        target: PathBuf,
        #[arg(long, value_enum, default_value = "source-to-target")]
        direction: DirectionArg,
        /// Restrict generation to these schemas
        #[arg(long)]
        schema: Vec<String>,
        /// Write the forward script here (default stdout)
        #[arg(long)]
        forward_out: Option<PathBuf>,
        /// Write the rollback script here
        #[arg(long)]
        rollback_out: Option<PathBuf>,
    },
    /// Generate, analyze and execute the forward script against a database
    Apply {
        source: PathBuf,
        target: PathBuf,
        #[arg(long, value_enum, default_value = "source-to-target")]
        direction: DirectionArg,
        /// Connection URL of the database to modify
        #[arg(long)]
        url: String,
        /// Database driver: mysql, postgres or sqlite
        #[arg(long, default_value = "mysql")]
        driver: String,
        /// Confirm execution of a script rated high risk
        #[arg(long)]
        acknowledge_high_risk: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => config::load_from_file(&path.to_string_lossy())
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn load_snapshot(path: &Path) -> Result<SchemaSnapshot> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing snapshot {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_logging(config.logging.as_ref())?;

    match cli.command {
        Command::Compare {
            source,
            target,
            output,
        } => {
            let source = load_snapshot(&source)?;
            let target = load_snapshot(&target)?;
            let engine = ComparisonEngine::new(config.comparison.clone());
            let outcome = engine.compare(&source, &target)?;

            println!(
                "{} differences ({} auto-fixable) across {} schema(s)",
                outcome.summary.total_differences,
                outcome.summary.can_auto_fix,
                outcome.summary.schemas_affected.len()
            );
            for warning in &outcome.warnings {
                println!("warning: {}", warning);
            }
            let report = serde_json::to_string_pretty(&outcome)?;
            match output {
                Some(path) => fs::write(&path, report)
                    .with_context(|| format!("writing report to {}", path.display()))?,
                None => println!("{}", report),
            }
        }

        Command::Script {
            source,
            target,
            direction,
            schema,
            forward_out,
            rollback_out,
        } => {
            let source = load_snapshot(&source)?;
            let target = load_snapshot(&target)?;
            let engine = ComparisonEngine::new(config.comparison.clone());
            let outcome = engine.compare(&source, &target)?;

            let filters = SyncFilters {
                schemas: if schema.is_empty() { None } else { Some(schema) },
                ..Default::default()
            };
            let generator = SyncScriptGenerator::new(direction.into(), filters);
            let script = generator.generate(&outcome.differences)?;

            for warning in &script.warnings {
                eprintln!("warning: {}", warning);
            }
            match forward_out {
                Some(path) => fs::write(&path, &script.forward_script)
                    .with_context(|| format!("writing forward script to {}", path.display()))?,
                None => println!("{}", script.forward_script),
            }
            if let Some(path) = rollback_out {
                fs::write(&path, &script.rollback_script)
                    .with_context(|| format!("writing rollback script to {}", path.display()))?;
            }
        }

        Command::Apply {
            source,
            target,
            direction,
            url,
            driver,
            acknowledge_high_risk,
        } => {
            let source = load_snapshot(&source)?;
            let target = load_snapshot(&target)?;
            let engine = ComparisonEngine::new(config.comparison.clone());
            let outcome = engine.compare(&source, &target)?;

            let generator = SyncScriptGenerator::new(direction.into(), SyncFilters::default());
            let script = generator.generate(&outcome.differences)?;

            let analyzer = RiskAnalyzer::new();
            let report = analyzer.analyze(&script.forward_statements);
            info!(level = ?report.level, destructive = report.destructive_operations.len(), "risk analysis");

            let connection = DatabaseConnection::connect(&DatabaseConfig {
                driver,
                url,
                pool_size: None,
                timeout_seconds: None,
            })
            .await?;
            let executor = ScriptExecutor::new(connection);
            let options = ExecutionOptions {
                acknowledge_high_risk,
            };
            let result = executor
                .execute(&script.forward_statements, &report, &options)
                .await?;

            println!(
                "executed {} / failed {} / skipped {}",
                result.executed_statements, result.failed_statements, result.skipped_statements
            );
            if result.failed_statements > 0 {
                for outcome in result.statements.iter().filter(|s| s.error.is_some()) {
                    eprintln!(
                        "failed: {}\n  {}",
                        outcome.statement,
                        outcome.error.as_deref().unwrap_or_default()
                    );
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
