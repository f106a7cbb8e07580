//! reprod-diff CLI - check nested diff reports against an acceptance threshold

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn, Level};

use reprod_diff::logging::init_logger_with_level;
use reprod_diff::{CheckConfig, DiffTree, Statistic, TracingSink, VERSION};

/// reprod-diff - reproducibility diff reporting
#[derive(Parser, Debug)]
#[command(name = "reprod-diff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write the log to this file (truncated, parent dirs created)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report a JSON diff tree and check every leaf against the threshold
    Check {
        /// Path to the JSON diff tree
        #[arg(short, long)]
        tree: PathBuf,

        /// YAML file with statistic / threshold / indent
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Statistic to check: min, max or mean
        #[arg(short, long)]
        statistic: Option<String>,

        /// Acceptance threshold
        #[arg(long)]
        threshold: Option<f64>,

        /// Indentation per nesting level
        #[arg(long)]
        indent: Option<String>,
    },
}

fn resolve_config(
    config: Option<PathBuf>,
    statistic: Option<String>,
    threshold: Option<f64>,
    indent: Option<String>,
) -> Result<CheckConfig> {
    let mut cfg = match config {
        Some(path) => CheckConfig::load(&path)
            .with_context(|| format!("Failed to load config: {:?}", path))?,
        None => CheckConfig::default(),
    };

    if let Some(stat) = statistic {
        cfg.statistic = stat.parse::<Statistic>()?;
    }
    if let Some(threshold) = threshold {
        cfg.threshold = threshold;
    }
    if let Some(indent) = indent {
        cfg.indent = indent;
    }

    cfg.validate()?;
    Ok(cfg)
}

/// Process exit status for a check verdict: 0 when every leaf passed, 1 otherwise
fn exit_status(passed: bool) -> u8 {
    if passed {
        0
    } else {
        1
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_logger_with_level(cli.log_file.as_deref(), level).context("Failed to set up logging")?;

    info!("reprod-diff v{}", VERSION);

    match cli.command {
        Commands::Check {
            tree,
            config,
            statistic,
            threshold,
            indent,
        } => {
            let cfg = resolve_config(config, statistic, threshold, indent)?;
            let diff_tree = DiffTree::load(&tree)
                .with_context(|| format!("Failed to load diff tree: {:?}", tree))?;

            info!(
                "Checking {:?} ({} <= {:e})",
                tree, cfg.statistic, cfg.threshold
            );
            let passed = cfg.check(&diff_tree, &mut TracingSink)?;
            if passed {
                info!("diff check passed");
            } else {
                let failing = diff_tree.failing_leaves(cfg.statistic, cfg.threshold);
                warn!("diff check failed for {} leaf(s)", failing.len());
            }
            Ok(ExitCode::from(exit_status(passed)))
        }
    }
}
