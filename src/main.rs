//! feature-screen - univariate case/control screening of pathway or orthology tables.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use feature_screen::config::AnalysisConfig;
use feature_screen::data::DatasetType;
use feature_screen::pipeline;
use log::info;

/// CLI-friendly dataset type
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDatasetType {
    Pathway,
    Orthology,
}

impl From<CliDatasetType> for DatasetType {
    fn from(kind: CliDatasetType) -> Self {
        match kind {
            CliDatasetType::Pathway => DatasetType::Pathway,
            CliDatasetType::Orthology => DatasetType::Orthology,
        }
    }
}

/// Descriptive statistics, univariate logistic regression and FDR control per feature
#[derive(Parser)]
#[command(name = "feature-screen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the analysis configuration YAML
    #[arg(short, long)]
    config: PathBuf,

    /// Override the dataset type of the configuration
    #[arg(short, long, value_enum)]
    dataset_type: Option<CliDatasetType>,

    /// Override the FDR significance level
    #[arg(short, long)]
    alpha: Option<f64>,

    /// Override the log level (error, warn, info, debug, trace)
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AnalysisConfig::from_yaml_file(&cli.config)?;
    if let Some(kind) = cli.dataset_type {
        config.dataset_type = kind.into();
    }
    if let Some(alpha) = cli.alpha {
        config.alpha = alpha;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    let _logger = flexi_logger::Logger::try_with_env_or_str(&config.log_level)
        .context("Invalid log level")?
        .start()
        .context("Failed to start logger")?;

    let summary = pipeline::run(&config)?;
    info!(
        "{} features screened, {} significant at FDR {}; report written to {}",
        summary.output.results.len(),
        summary.output.report.n_significant,
        config.alpha,
        summary.report_path.display()
    );

    Ok(())
}
