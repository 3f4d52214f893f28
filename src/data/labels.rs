use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};

/// Column that joins results and labels.
pub const KEY_COLUMN: &str = "KEGG_no";

/// The two kinds of feature tables the screen runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DatasetType {
    #[default]
    Pathway,
    Orthology,
}

impl DatasetType {
    /// Label column as it appears in the label file.
    pub fn source_label_column(&self) -> &'static str {
        match self {
            DatasetType::Pathway => "pathway_kegg_no",
            DatasetType::Orthology => "orthology_names",
        }
    }

    /// Label column as it appears in the report.
    pub fn label_column(&self) -> &'static str {
        match self {
            DatasetType::Pathway => "Pathway_Name",
            DatasetType::Orthology => "Orthology_Name",
        }
    }

    pub fn report_stem(&self) -> String {
        format!("statistical_analysis_results_with_labels_{}", self)
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetType::Pathway => write!(f, "Pathway"),
            DatasetType::Orthology => write!(f, "Orthology"),
        }
    }
}

/// Human-readable names keyed by feature identifier, plus any further columns of the label file.
#[derive(Debug, Clone)]
pub struct LabelTable {
    dataset_type: DatasetType,
    names: HashMap<String, String>,
    extra_columns: Vec<String>,
    extras: HashMap<String, Vec<String>>,
}

impl LabelTable {
    pub fn new(dataset_type: DatasetType, names: HashMap<String, String>) -> Self {
        LabelTable {
            dataset_type,
            names,
            extra_columns: Vec::new(),
            extras: HashMap::new(),
        }
    }

    /// Attach further label columns. Every value list must hold one cell per column.
    pub fn with_extra_columns(
        mut self,
        columns: Vec<String>,
        extras: HashMap<String, Vec<String>>,
    ) -> anyhow::Result<Self> {
        if let Some((key, values)) = extras.iter().find(|(_, v)| v.len() != columns.len()) {
            return Err(anyhow::anyhow!(
                "Label row '{}' has {} extra values, expected {}",
                key,
                values.len(),
                columns.len()
            ));
        }
        self.extra_columns = columns;
        self.extras = extras;
        Ok(self)
    }

    /// Read a label CSV. The key and label columns are required; every other column is kept as
    /// an extra column. The first row wins when a key repeats.
    pub fn from_csv<P: AsRef<Path>>(path: P, dataset_type: DatasetType) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open label file {}", path.display()))?;
        let headers = reader.headers()?.clone();

        let find = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                anyhow::anyhow!("Column '{}' not found in label file {}", name, path.display())
            })
        };
        let key_idx = find(KEY_COLUMN)?;
        let label_idx = find(dataset_type.source_label_column())?;
        let extra_idx: Vec<usize> = (0..headers.len())
            .filter(|&i| i != key_idx && i != label_idx)
            .collect();
        let extra_columns = extra_idx.iter().map(|&i| headers[i].to_string()).collect();

        let mut names = HashMap::new();
        let mut extras = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let key = record.get(key_idx).unwrap_or("").trim().to_string();
            if key.is_empty() {
                continue;
            }
            let label = record.get(label_idx).unwrap_or("").to_string();
            if names.contains_key(&key) {
                warn!("Label file repeats key '{}', keeping the first row", key);
                continue;
            }
            let values = extra_idx
                .iter()
                .map(|&i| record.get(i).unwrap_or("").to_string())
                .collect::<Vec<_>>();
            extras.insert(key.clone(), values);
            names.insert(key, label);
        }

        LabelTable::new(dataset_type, names).with_extra_columns(extra_columns, extras)
    }

    pub fn dataset_type(&self) -> DatasetType {
        self.dataset_type
    }

    pub fn get(&self, feature_id: &str) -> Option<&str> {
        self.names.get(feature_id).map(String::as_str)
    }

    /// Names of the label-file columns besides the key and the label.
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Extra column values of one key, in [`LabelTable::extra_columns`] order.
    pub fn extras(&self, feature_id: &str) -> Option<&[String]> {
        self.extras.get(feature_id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
