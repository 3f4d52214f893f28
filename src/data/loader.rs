use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use log::{debug, info, warn};
use ndarray::Array2;

use crate::data::FeatureTable;

/// How to read a feature table from a delimited text file.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Header name of the binary outcome column.
    pub outcome_column: String,
    /// First column (0-based) holding feature measurements. Defaults to the column right after
    /// the outcome.
    pub feature_offset: Option<usize>,
    pub delimiter: u8,
    /// Remove feature columns that contain any missing value after numeric coercion.
    pub drop_incomplete: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            outcome_column: "group_2".to_string(),
            feature_offset: None,
            delimiter: b',',
            drop_incomplete: false,
        }
    }
}

/// Coerce a raw cell to a number. Anything that does not parse to a finite value is missing.
pub fn coerce_numeric(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => f64::NAN,
    }
}

fn parse_outcome(cell: &str, row: usize, column: &str) -> anyhow::Result<u8> {
    let value = cell.trim().parse::<f64>().map_err(|_| {
        anyhow::anyhow!(
            "Outcome column '{}' has non-numeric value '{}' at row {}",
            column,
            cell,
            row
        )
    })?;
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(anyhow::anyhow!(
            "Outcome column '{}' has value {} at row {}, expected 0 or 1",
            column,
            value,
            row
        ))
    }
}

/// Load a feature table from a delimited file.
///
/// Duplicate feature column names keep their first occurrence. When
/// [`LoaderOptions::drop_incomplete`] is set the identifiers of the removed columns are
/// returned as the second element.
pub fn load_feature_table<P: AsRef<Path>>(
    path: P,
    options: &LoaderOptions,
) -> anyhow::Result<(FeatureTable, Vec<String>)> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open feature table {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();

    let outcome_idx = headers
        .iter()
        .position(|h| h == options.outcome_column)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Outcome column '{}' not found in {}",
                options.outcome_column,
                path.display()
            )
        })?;

    let offset = options.feature_offset.unwrap_or(outcome_idx + 1);
    let mut seen = HashSet::new();
    let mut feature_cols = Vec::new();
    let mut feature_ids = Vec::new();
    for (idx, name) in headers.iter().enumerate().skip(offset) {
        if idx == outcome_idx {
            continue;
        }
        if !seen.insert(name.to_string()) {
            warn!("Dropping duplicate feature column '{}' at position {}", name, idx);
            continue;
        }
        feature_cols.push(idx);
        feature_ids.push(name.to_string());
    }

    let mut outcome = Vec::new();
    let mut flat = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Malformed record {} in {}", row, path.display()))?;
        let cell = record.get(outcome_idx).unwrap_or("");
        outcome.push(parse_outcome(cell, row, &options.outcome_column)?);
        flat.extend(
            feature_cols
                .iter()
                .map(|&c| record.get(c).map_or(f64::NAN, coerce_numeric)),
        );
    }

    let values = Array2::from_shape_vec((outcome.len(), feature_cols.len()), flat)?;
    let mut table = FeatureTable::new(options.outcome_column.clone(), outcome, feature_ids, values)
        .with_context(|| format!("Invalid feature table {}", path.display()))?;
    debug!(
        "Loaded {} samples x {} features from {}",
        table.n_samples(),
        table.n_features(),
        path.display()
    );

    let dropped = if options.drop_incomplete {
        let dropped = table.drop_incomplete_features()?;
        info!(
            "Removed {} feature columns with missing values, {} remain",
            dropped.len(),
            table.n_features()
        );
        dropped
    } else {
        Vec::new()
    };

    Ok((table, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(" 2.5 "), 2.5);
        assert!(coerce_numeric("abc").is_nan());
        assert!(coerce_numeric("").is_nan());
        assert!(coerce_numeric("inf").is_nan());
    }

    #[test]
    fn test_load_with_duplicates_and_text() {
        let file = write_tmp("group_2,K1,K2,K1\n0,1.0,x,9\n1,2.0,3.0,9\n");
        let (table, dropped) = load_feature_table(file.path(), &LoaderOptions::default()).unwrap();

        assert!(dropped.is_empty());
        assert_eq!(table.feature_ids(), &["K1".to_string(), "K2".to_string()]);
        assert_eq!(table.outcome(), &[0, 1]);
        assert!(table.values()[[0, 1]].is_nan());
        assert_eq!(table.values()[[1, 1]], 3.0);
    }

    #[test]
    fn test_load_with_offset_and_drop() {
        let file = write_tmp("sample,group_2,site,K1,K2\ns1,0,a,1,\ns2,1,b,2,4\n");
        let options = LoaderOptions {
            feature_offset: Some(3),
            drop_incomplete: true,
            ..LoaderOptions::default()
        };
        let (table, dropped) = load_feature_table(file.path(), &options).unwrap();

        assert_eq!(dropped, vec!["K2".to_string()]);
        assert_eq!(table.feature_ids(), &["K1".to_string()]);
    }

    #[test]
    fn test_missing_outcome_column() {
        let file = write_tmp("label,K1\n0,1\n");
        let err = load_feature_table(file.path(), &LoaderOptions::default()).unwrap_err();
        assert!(err.to_string().contains("group_2"));
    }

    #[test]
    fn test_empty_table() {
        let file = write_tmp("group_2,K1\n");
        assert!(load_feature_table(file.path(), &LoaderOptions::default()).is_err());
    }
}
