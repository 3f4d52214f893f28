use crate::data::{FeatureTable, GroupSplit};
use crate::testing::{Alternative, TestResult};

pub mod nonparametric;

pub mod regression;

pub use regression::{FitFailure, FitOutcome, LogisticFit, LogitOptions};

/// Per-feature tests on a two-group feature table.
pub trait FeatureStatTests {
    /// Rank-sum test of the case values of `feature` against its control values.
    ///
    /// `Ok(None)` when either group has no numeric value.
    fn mann_whitney_test(
        &self,
        feature: &str,
        split: &GroupSplit,
        alternative: Alternative,
    ) -> anyhow::Result<Option<TestResult<f64>>>;

    /// Logistic regression of the outcome on `feature` alone.
    fn logistic_test(&self, feature: &str, options: &LogitOptions) -> anyhow::Result<FitOutcome>;
}

impl FeatureStatTests for FeatureTable {
    fn mann_whitney_test(
        &self,
        feature: &str,
        split: &GroupSplit,
        alternative: Alternative,
    ) -> anyhow::Result<Option<TestResult<f64>>> {
        let column = self.column(feature)?;
        let case_values = GroupSplit::values_at(column, &split.case);
        let control_values = GroupSplit::values_at(column, &split.control);
        Ok(nonparametric::mann_whitney(
            &case_values,
            &control_values,
            alternative,
        ))
    }

    fn logistic_test(&self, feature: &str, options: &LogitOptions) -> anyhow::Result<FitOutcome> {
        let column = self.column(feature)?;
        let x: Vec<f64> = column.iter().copied().collect();
        Ok(regression::fit_logistic(self.outcome(), &x, options))
    }
}
