//! End-to-end screening run: load, analyze, label, export.

use std::path::PathBuf;

use anyhow::Context;
use log::{info, warn};

use crate::analysis::{AnalysisOutput, run_analysis};
use crate::config::AnalysisConfig;
use crate::data::{LabelTable, load_feature_table};
use crate::report::LabeledReport;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report_path: PathBuf,
    /// Feature columns removed during preprocessing.
    pub dropped_features: Vec<String>,
    pub output: AnalysisOutput,
}

/// Run the screen described by `config` and write the labeled report into its output directory.
pub fn run(config: &AnalysisConfig) -> anyhow::Result<RunSummary> {
    config.validate()?;
    info!(
        "Starting {} screen on {}",
        config.dataset_type,
        config.data_path.display()
    );

    let (table, dropped_features) =
        load_feature_table(&config.data_path, &config.loader_options())?;
    if !dropped_features.is_empty() {
        warn!(
            "Columns removed for missing values: {}",
            dropped_features.join(", ")
        );
    }

    let output = run_analysis(&table, &config.analysis_options())?;
    if !output.report.problematic.is_empty() {
        warn!(
            "Logistic regression failed for {} features: {}",
            output.report.problematic.len(),
            output.report.problematic_ids().join(", ")
        );
    }

    let labels = LabelTable::from_csv(&config.label_path, config.dataset_type)?;
    let report = LabeledReport::merge(&output.results, &labels);

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;
    let report_path = config.report_path();
    report.write_csv(&report_path)?;

    Ok(RunSummary {
        report_path,
        dropped_features,
        output,
    })
}
