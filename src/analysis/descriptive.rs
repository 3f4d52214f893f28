use log::debug;

use crate::analysis::{FeatureStats, ResultsTable};
use crate::data::{FeatureTable, GroupSplit};
use crate::testing::effect::{fold_change, log2_fold_change, mean};
use crate::testing::inference::FeatureStatTests;
use crate::testing::Alternative;

/// Group means, fold change and rank-sum p-value for every feature in `features`.
///
/// Missing measurements are left out of every statistic. A group without any numeric value has
/// an undefined mean, which makes the fold change and the rank-sum p-value undefined as well.
/// Fails only when a feature is not a column of `table`.
pub fn compute_statistics(
    table: &FeatureTable,
    split: &GroupSplit,
    features: &[String],
) -> anyhow::Result<ResultsTable> {
    let mut results = ResultsTable::new();

    for feature in features {
        let column = table.column(feature)?;
        let control_values = GroupSplit::values_at(column, &split.control);
        let case_values = GroupSplit::values_at(column, &split.case);

        let control_mean = mean(&control_values);
        let cancer_mean = mean(&case_values);
        let fc_value = fold_change(cancer_mean, control_mean);
        let log2fc_value = log2_fold_change(fc_value);

        let wilcoxon_p = table
            .mann_whitney_test(feature, split, Alternative::TwoSided)?
            .and_then(|r| r.defined_p_value());
        if wilcoxon_p.is_none() {
            debug!("Rank-sum test undefined for '{}'", feature);
        }

        results.upsert(FeatureStats {
            control_mean,
            cancer_mean,
            fc_value,
            log2fc_value,
            wilcoxon_p,
            ..FeatureStats::new(feature.as_str())
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn table() -> FeatureTable {
        FeatureTable::new(
            "group_2",
            vec![0, 0, 0, 1, 1, 1],
            vec!["A".into(), "Z".into(), "M".into()],
            array![
                [1.0, 0.0, f64::NAN],
                [2.0, 0.0, f64::NAN],
                [3.0, 0.0, f64::NAN],
                [4.0, 1.0, 2.0],
                [5.0, 2.0, 4.0],
                [6.0, 3.0, f64::NAN],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_separated_groups() {
        let table = table();
        let split = table.split_by_outcome();
        let results = compute_statistics(&table, &split, &["A".to_string()]).unwrap();
        let row = results.get("A").unwrap();

        assert_relative_eq!(row.control_mean.unwrap(), 2.0);
        assert_relative_eq!(row.cancer_mean.unwrap(), 5.0);
        assert_relative_eq!(row.fc_value.unwrap(), 2.5);
        assert_relative_eq!(row.log2fc_value.unwrap(), 2.5f64.log2());
        assert_relative_eq!(row.wilcoxon_p.unwrap(), 0.1, epsilon = 1e-12);
        assert_eq!(row.logreg_p_univ, None);
    }

    #[test]
    fn test_zero_control_mean_and_missing_group() {
        let table = table();
        let split = table.split_by_outcome();
        let results = compute_statistics(&table, &split, table.feature_ids()).unwrap();

        let z = results.get("Z").unwrap();
        assert_eq!(z.control_mean, Some(0.0));
        assert_eq!(z.fc_value, None);
        assert_eq!(z.log2fc_value, None);
        assert!(z.wilcoxon_p.is_some());

        let m = results.get("M").unwrap();
        assert_eq!(m.control_mean, None);
        assert_eq!(m.cancer_mean, Some(3.0));
        assert_eq!(m.fc_value, None);
        assert_eq!(m.wilcoxon_p, None);
    }

    #[test]
    fn test_unknown_feature_is_an_error() {
        let table = table();
        let split = table.split_by_outcome();
        assert!(compute_statistics(&table, &split, &["nope".to_string()]).is_err());
    }
}
