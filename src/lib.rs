//! # feature-screen
//!
//! Univariate screening of pathway or orthology abundance tables against a binary case/control
//! outcome.
//!
//! Every feature column goes through two stages that share one [`analysis::ResultsTable`]:
//!
//! - **Descriptive statistics**: group means, fold change, log2 fold change and a two-sided
//!   Mann-Whitney U p-value
//! - **Univariate association**: a single-predictor logistic regression per feature, its Wald
//!   p-value, and a Benjamini-Hochberg adjustment over all features that could be fitted
//!
//! Features that cannot be fitted never abort a run. They get an undefined p-value and are
//! listed in [`analysis::AssociationReport`].
//!
//! ## Quick Start
//!
//! Build a [`data::FeatureTable`] (or load one with [`data::load_feature_table`]) and call
//! [`analysis::run_analysis`]. [`pipeline::run`] does the whole thing from a YAML
//! [`config::AnalysisConfig`], including the label merge and CSV export.
//!
//! ## Module Organization
//!
//! - **[`data`]**: Feature tables, CSV loading and label files
//! - **[`testing`]**: Rank-sum test, logistic regression, effect sizes and FDR correction
//! - **[`analysis`]**: The two screening stages and their results table
//! - **[`report`]**: Label merge and report export
//! - **[`config`]**: YAML configuration of a run
//! - **[`pipeline`]**: Load, analyze, label and export in one call

pub mod analysis;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod testing;
