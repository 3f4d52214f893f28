//! The two-stage screen: descriptive statistics followed by univariate association.
//!
//! Both stages write into one [`ResultsTable`]. The descriptive stage creates it, the association
//! stage takes it by `&mut` and fills the regression columns.

use std::collections::HashMap;

use log::info;

use crate::data::FeatureTable;
use crate::testing::inference::LogitOptions;

pub mod association;
pub mod descriptive;

pub use association::{
    AssociationReport, ProblematicFeature, correct_fitted, logistic_regression_univariate,
};
pub use descriptive::compute_statistics;

/// Report column names of the statistical columns, in output order.
pub const STAT_COLUMNS: [&str; 7] = [
    "Control_mean",
    "Cancer_mean",
    "FC_value",
    "log2FC_value",
    "Wilcoxon_p",
    "LogReg_p_univ",
    "LogReg_p_fdr",
];

/// One row of the results table. `None` marks an undefined value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureStats {
    pub feature_id: String,
    pub control_mean: Option<f64>,
    pub cancer_mean: Option<f64>,
    pub fc_value: Option<f64>,
    pub log2fc_value: Option<f64>,
    pub wilcoxon_p: Option<f64>,
    pub logreg_p_univ: Option<f64>,
    pub logreg_p_fdr: Option<f64>,
}

impl FeatureStats {
    pub fn new(feature_id: impl Into<String>) -> Self {
        FeatureStats {
            feature_id: feature_id.into(),
            ..FeatureStats::default()
        }
    }

    /// Values of [`STAT_COLUMNS`] in the same order.
    pub fn stat_values(&self) -> [Option<f64>; 7] {
        [
            self.control_mean,
            self.cancer_mean,
            self.fc_value,
            self.log2fc_value,
            self.wilcoxon_p,
            self.logreg_p_univ,
            self.logreg_p_fdr,
        ]
    }
}

/// Per-feature results in feature order, addressable by identifier.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    rows: Vec<FeatureStats>,
    index: HashMap<String, usize>,
}

impl ResultsTable {
    pub fn new() -> Self {
        ResultsTable::default()
    }

    /// Append a row. A row with an identifier already present replaces the old one in place.
    pub fn upsert(&mut self, row: FeatureStats) {
        match self.index.get(&row.feature_id).copied() {
            Some(i) => self.rows[i] = row,
            None => {
                self.index.insert(row.feature_id.clone(), self.rows.len());
                self.rows.push(row);
            }
        }
    }

    pub fn get(&self, feature_id: &str) -> Option<&FeatureStats> {
        self.index.get(feature_id).map(|&i| &self.rows[i])
    }

    /// Mutable access to a row, creating an empty one when the feature is new.
    pub fn entry(&mut self, feature_id: &str) -> &mut FeatureStats {
        let existing = self.index.get(feature_id).copied();
        let i = match existing {
            Some(i) => i,
            None => {
                self.upsert(FeatureStats::new(feature_id));
                self.rows.len() - 1
            }
        };
        &mut self.rows[i]
    }

    pub fn rows(&self) -> &[FeatureStats] {
        &self.rows
    }

    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.feature_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the FDR column holds at least one value.
    pub fn has_fdr(&self) -> bool {
        self.rows.iter().any(|r| r.logreg_p_fdr.is_some())
    }
}

/// Settings of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    /// Significance level of the FDR procedure.
    pub alpha: f64,
    pub logit: LogitOptions,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            alpha: 0.05,
            logit: LogitOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub results: ResultsTable,
    pub report: AssociationReport,
}

/// Run both stages over every feature of `table`, in column order.
pub fn run_analysis(
    table: &FeatureTable,
    options: &AnalysisOptions,
) -> anyhow::Result<AnalysisOutput> {
    let split = table.split_by_outcome();
    info!(
        "Screening {} features over {} control and {} case samples",
        table.n_features(),
        split.control.len(),
        split.case.len()
    );

    let features = table.feature_ids();
    let mut results = compute_statistics(table, &split, features)?;
    let report = logistic_regression_univariate(table, features, &mut results, options)?;

    Ok(AnalysisOutput { results, report })
}
