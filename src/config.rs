//! YAML configuration of a screening run.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisOptions;
use crate::data::{DatasetType, LoaderOptions};
use crate::testing::inference::LogitOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub dataset_type: DatasetType,
    /// Feature table with the outcome column and one column per feature.
    #[serde(default = "empty_path")]
    pub data_path: PathBuf,
    /// Label file with `KEGG_no` and the label column of `dataset_type`.
    #[serde(default = "empty_path")]
    pub label_path: PathBuf,
    #[serde(default = "output_dir_default")]
    pub output_dir: PathBuf,

    #[serde(default = "outcome_column_default")]
    pub outcome_column: String,
    #[serde(default)]
    pub feature_offset: Option<usize>,
    #[serde(default)]
    pub drop_incomplete: bool,

    #[serde(default = "alpha_default")]
    pub alpha: f64,
    #[serde(default = "max_iter_default")]
    pub max_iter: usize,

    #[serde(default = "log_level_default")]
    pub log_level: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            dataset_type: DatasetType::default(),
            data_path: empty_path(),
            label_path: empty_path(),
            output_dir: output_dir_default(),
            outcome_column: outcome_column_default(),
            feature_offset: None,
            drop_incomplete: false,
            alpha: alpha_default(),
            max_iter: max_iter_default(),
            log_level: log_level_default(),
        }
    }
}

impl AnalysisConfig {
    /// Read and validate a configuration file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config {}", path.display()))?;
        let config: AnalysisConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let config: AnalysisConfig =
            serde_yaml::from_str(text).context("Failed to parse inline config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(anyhow!("alpha must be between 0 and 1, got {}", self.alpha));
        }
        if self.max_iter == 0 {
            return Err(anyhow!("max_iter must be positive"));
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(anyhow!("data_path is required"));
        }
        if self.label_path.as_os_str().is_empty() {
            return Err(anyhow!("label_path is required"));
        }
        if self.outcome_column.is_empty() {
            return Err(anyhow!("outcome_column must not be empty"));
        }
        Ok(())
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            outcome_column: self.outcome_column.clone(),
            feature_offset: self.feature_offset,
            drop_incomplete: self.drop_incomplete,
            ..LoaderOptions::default()
        }
    }

    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            alpha: self.alpha,
            logit: LogitOptions {
                max_iter: self.max_iter,
                ..LogitOptions::default()
            },
        }
    }

    /// Where the labeled report of this run is written.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.csv", self.dataset_type.report_stem()))
    }
}

fn empty_path() -> PathBuf {
    PathBuf::new()
}
fn output_dir_default() -> PathBuf {
    PathBuf::from(".")
}
fn outcome_column_default() -> String {
    "group_2".to_string()
}
fn alpha_default() -> f64 {
    0.05
}
fn max_iter_default() -> usize {
    crate::testing::inference::regression::MAX_ITER
}
fn log_level_default() -> String {
    "info".to_string()
}
