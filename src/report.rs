//! Label merge and report export.

use std::path::Path;

use anyhow::Context;
use log::info;

use crate::analysis::{FeatureStats, ResultsTable, STAT_COLUMNS};
use crate::data::{DatasetType, KEY_COLUMN, LabelTable};

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRow {
    pub label: Option<String>,
    pub stats: FeatureStats,
    /// Extra label-file values, empty cells when the row has no label.
    pub extras: Vec<String>,
}

/// Results left-joined with their labels, in results order.
#[derive(Debug, Clone)]
pub struct LabeledReport {
    pub dataset_type: DatasetType,
    pub extra_columns: Vec<String>,
    pub rows: Vec<LabeledRow>,
}

impl LabeledReport {
    /// Every result row appears exactly once; rows without a label keep `None`.
    pub fn merge(results: &ResultsTable, labels: &LabelTable) -> Self {
        let n_extra = labels.extra_columns().len();
        let rows = results
            .rows()
            .iter()
            .map(|stats| LabeledRow {
                label: labels.get(&stats.feature_id).map(str::to_string),
                extras: labels
                    .extras(&stats.feature_id)
                    .map(<[String]>::to_vec)
                    .unwrap_or_else(|| vec![String::new(); n_extra]),
                stats: stats.clone(),
            })
            .collect();

        LabeledReport {
            dataset_type: labels.dataset_type(),
            extra_columns: labels.extra_columns().to_vec(),
            rows,
        }
    }

    /// Header of the written report: key, label, the statistical columns, then any extra label
    /// columns.
    pub fn header(&self) -> Vec<&str> {
        let mut header = vec![KEY_COLUMN, self.dataset_type.label_column()];
        header.extend(STAT_COLUMNS);
        header.extend(self.extra_columns.iter().map(String::as_str));
        header
    }

    pub fn n_unlabeled(&self) -> usize {
        self.rows.iter().filter(|r| r.label.is_none()).count()
    }

    /// Write the report as CSV. Undefined values are empty cells.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;

        writer.write_record(self.header())?;
        for row in &self.rows {
            let mut record = Vec::with_capacity(2 + STAT_COLUMNS.len() + row.extras.len());
            record.push(row.stats.feature_id.clone());
            record.push(row.label.clone().unwrap_or_default());
            record.extend(
                row.stats
                    .stat_values()
                    .iter()
                    .map(|v| v.map(format_value).unwrap_or_default()),
            );
            record.extend(row.extras.iter().cloned());
            writer.write_record(&record)?;
        }
        writer.flush()?;

        info!(
            "Wrote {} rows ({} without label) to {}",
            self.rows.len(),
            self.n_unlabeled(),
            path.display()
        );
        Ok(())
    }
}

/// Plain decimal for ordinary magnitudes, scientific notation for very small or very large ones.
pub fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        format!("{:e}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn results() -> ResultsTable {
        let mut results = ResultsTable::new();
        results.upsert(FeatureStats {
            control_mean: Some(2.0),
            cancer_mean: Some(5.0),
            fc_value: Some(2.5),
            wilcoxon_p: Some(0.1),
            ..FeatureStats::new("K00001")
        });
        results.upsert(FeatureStats {
            control_mean: Some(1.0),
            ..FeatureStats::new("K00002")
        });
        results
    }

    #[test]
    fn test_left_join_keeps_unlabeled_rows() {
        let labels = LabelTable::new(
            DatasetType::Orthology,
            HashMap::from([("K00002".to_string(), "alcohol dehydrogenase".to_string())]),
        );
        let report = LabeledReport::merge(&results(), &labels);

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].stats.feature_id, "K00001");
        assert_eq!(report.rows[0].label, None);
        assert_eq!(report.rows[0].stats.fc_value, Some(2.5));
        assert_eq!(report.rows[1].label.as_deref(), Some("alcohol dehydrogenase"));
        assert_eq!(report.n_unlabeled(), 1);
        assert_eq!(report.header()[..2], ["KEGG_no", "Orthology_Name"]);
    }

    #[test]
    fn test_write_csv() {
        let labels = LabelTable::new(
            DatasetType::Pathway,
            HashMap::from([("K00002".to_string(), "Glycolysis".to_string())]),
        )
        .with_extra_columns(
            vec!["orthology_names".to_string(), "class".to_string()],
            HashMap::from([(
                "K00002".to_string(),
                vec!["adh".to_string(), "Metabolism".to_string()],
            )]),
        )
        .unwrap();
        let report = LabeledReport::merge(&results(), &labels);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        report.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "KEGG_no,Pathway_Name,Control_mean,Cancer_mean,FC_value,log2FC_value,Wilcoxon_p,LogReg_p_univ,LogReg_p_fdr,orthology_names,class"
        );
        assert_eq!(lines[1], "K00001,,2,5,2.5,,0.1,,,,");
        assert_eq!(lines[2], "K00002,Glycolysis,1,,,,,,,adh,Metabolism");
    }

    #[test]
    fn test_tiny_p_values_use_exponent_form() {
        assert_eq!(format_value(1e-300), "1e-300");
        assert_eq!(format_value(1.5e-7), "1.5e-7");
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(format_value(2.0), "2");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(-0.00025), "-0.00025");
        assert_eq!("1e-300".parse::<f64>().unwrap(), 1e-300);
    }
}
