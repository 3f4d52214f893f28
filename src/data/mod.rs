//! In-memory feature tables and the tables that travel alongside them.
//!
//! A [`FeatureTable`] holds one binary outcome per sample (0 = control, 1 = case) and a dense
//! samples × features matrix of measurements. Missing measurements are stored as `NaN` and are
//! skipped by every statistic computed on the table.

use std::collections::HashMap;

use ndarray::{Array2, ArrayView1, Axis};

pub mod labels;
pub mod loader;

pub use labels::{DatasetType, LabelTable, KEY_COLUMN};
pub use loader::{LoaderOptions, load_feature_table};

/// Outcome value of control samples.
pub const CONTROL: u8 = 0;
/// Outcome value of case samples.
pub const CASE: u8 = 1;

#[derive(Debug, Clone)]
pub struct FeatureTable {
    outcome_name: String,
    outcome: Vec<u8>,
    feature_ids: Vec<String>,
    index: HashMap<String, usize>,
    values: Array2<f64>,
}

impl FeatureTable {
    /// Build a table from an outcome vector and a samples × features value matrix.
    ///
    /// Fails when the table is empty, when the shapes disagree, when an outcome is not 0 or 1,
    /// or when two features share an identifier.
    pub fn new(
        outcome_name: impl Into<String>,
        outcome: Vec<u8>,
        feature_ids: Vec<String>,
        values: Array2<f64>,
    ) -> anyhow::Result<Self> {
        if outcome.is_empty() {
            return Err(anyhow::anyhow!("Feature table has no samples"));
        }
        if feature_ids.is_empty() {
            return Err(anyhow::anyhow!("Feature table has no feature columns"));
        }
        if values.nrows() != outcome.len() || values.ncols() != feature_ids.len() {
            return Err(anyhow::anyhow!(
                "Shape mismatch: values are {}x{}, expected {}x{}",
                values.nrows(),
                values.ncols(),
                outcome.len(),
                feature_ids.len()
            ));
        }
        if let Some((row, &v)) = outcome
            .iter()
            .enumerate()
            .find(|&(_, &v)| v != CONTROL && v != CASE)
        {
            return Err(anyhow::anyhow!(
                "Invalid outcome value {} at row {}, expected 0 or 1",
                v,
                row
            ));
        }

        let index = build_index(&feature_ids)?;

        Ok(FeatureTable {
            outcome_name: outcome_name.into(),
            outcome,
            feature_ids,
            index,
            values,
        })
    }

    pub fn outcome_name(&self) -> &str {
        &self.outcome_name
    }

    pub fn outcome(&self) -> &[u8] {
        &self.outcome
    }

    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_samples(&self) -> usize {
        self.outcome.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_ids.len()
    }

    /// Column index of a feature.
    pub fn feature_index(&self, feature_id: &str) -> Option<usize> {
        self.index.get(feature_id).copied()
    }

    /// All measurements of one feature, in sample order.
    pub fn column(&self, feature_id: &str) -> anyhow::Result<ArrayView1<'_, f64>> {
        let idx = self
            .feature_index(feature_id)
            .ok_or_else(|| anyhow::anyhow!("Unknown feature '{}'", feature_id))?;
        Ok(self.values.column(idx))
    }

    /// Row indices of control and case samples.
    pub fn split_by_outcome(&self) -> GroupSplit {
        GroupSplit::from_outcome(&self.outcome)
    }

    /// Remove every feature column holding at least one missing value.
    ///
    /// Returns the identifiers of the removed columns in their original order.
    pub fn drop_incomplete_features(&mut self) -> anyhow::Result<Vec<String>> {
        let (keep, dropped): (Vec<usize>, Vec<usize>) = (0..self.n_features())
            .partition(|&j| self.values.column(j).iter().all(|v| v.is_finite()));

        if dropped.is_empty() {
            return Ok(Vec::new());
        }
        if keep.is_empty() {
            return Err(anyhow::anyhow!(
                "Every feature column contains missing values"
            ));
        }

        let removed = dropped
            .iter()
            .map(|&j| self.feature_ids[j].clone())
            .collect();
        self.values = self.values.select(Axis(1), &keep);
        self.feature_ids = keep.iter().map(|&j| self.feature_ids[j].clone()).collect();
        self.index = build_index(&self.feature_ids)?;

        Ok(removed)
    }
}

fn build_index(feature_ids: &[String]) -> anyhow::Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(feature_ids.len());
    for (i, id) in feature_ids.iter().enumerate() {
        if index.insert(id.clone(), i).is_some() {
            return Err(anyhow::anyhow!("Duplicate feature identifier '{}'", id));
        }
    }
    Ok(index)
}

/// Sample indices of the two outcome groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSplit {
    pub control: Vec<usize>,
    pub case: Vec<usize>,
}

impl GroupSplit {
    pub fn from_outcome(outcome: &[u8]) -> Self {
        let control = outcome
            .iter()
            .enumerate()
            .filter_map(|(i, &g)| if g == CONTROL { Some(i) } else { None })
            .collect();

        let case = outcome
            .iter()
            .enumerate()
            .filter_map(|(i, &g)| if g == CASE { Some(i) } else { None })
            .collect();

        GroupSplit { control, case }
    }

    /// Numeric values of `column` at `indices`; missing entries are skipped.
    pub fn values_at(column: ArrayView1<'_, f64>, indices: &[usize]) -> Vec<f64> {
        indices
            .iter()
            .map(|&i| column[i])
            .filter(|v| v.is_finite())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rejects_bad_outcome() {
        let result = FeatureTable::new(
            "group_2",
            vec![0, 2],
            ids(&["A"]),
            array![[1.0], [2.0]],
        );
        assert!(result.unwrap_err().to_string().contains("row 1"));
    }

    #[test]
    fn test_rejects_shape_mismatch_and_duplicates() {
        assert!(FeatureTable::new("y", vec![0, 1], ids(&["A", "B"]), array![[1.0], [2.0]]).is_err());
        assert!(
            FeatureTable::new("y", vec![0, 1], ids(&["A", "A"]), array![[1.0, 1.0], [2.0, 2.0]])
                .is_err()
        );
        assert!(FeatureTable::new("y", vec![], ids(&["A"]), Array2::zeros((0, 1))).is_err());
    }

    #[test]
    fn test_split_by_outcome() {
        let table = FeatureTable::new(
            "group_2",
            vec![1, 0, 0, 1],
            ids(&["A"]),
            array![[1.0], [2.0], [3.0], [4.0]],
        )
        .unwrap();
        let split = table.split_by_outcome();
        assert_eq!(split.control, vec![1, 2]);
        assert_eq!(split.case, vec![0, 3]);

        let col = table.column("A").unwrap();
        assert_eq!(GroupSplit::values_at(col, &split.case), vec![1.0, 4.0]);
    }

    #[test]
    fn test_drop_incomplete_features() {
        let mut table = FeatureTable::new(
            "group_2",
            vec![0, 1],
            ids(&["A", "B", "C"]),
            array![[1.0, f64::NAN, 3.0], [2.0, 5.0, 6.0]],
        )
        .unwrap();

        let dropped = table.drop_incomplete_features().unwrap();
        assert_eq!(dropped, vec!["B".to_string()]);
        assert_eq!(table.feature_ids(), &["A".to_string(), "C".to_string()]);
        assert_eq!(table.values(), &array![[1.0, 3.0], [2.0, 6.0]]);
        assert_eq!(table.feature_index("C"), Some(1));
        assert_eq!(table.feature_index("B"), None);
        assert_eq!(table.column("C").unwrap().to_vec(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_feature_lookup_on_wide_table() {
        let n = 5000;
        let names: Vec<String> = (0..n).map(|j| format!("K{:05}", j)).collect();
        let values = Array2::from_shape_fn((2, n), |(i, j)| (i * n + j) as f64);
        let table = FeatureTable::new("group_2", vec![0, 1], names, values).unwrap();

        for j in (0..n).step_by(997) {
            let id = format!("K{:05}", j);
            assert_eq!(table.feature_index(&id), Some(j));
            assert_eq!(table.column(&id).unwrap()[1], (n + j) as f64);
        }
        assert_eq!(table.feature_index("K99999"), None);
    }
}
