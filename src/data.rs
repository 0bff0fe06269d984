//! Training Data Loading
//!
//! Loads the crop recommendation dataset (one row per field observation,
//! seven feature columns plus a `label` column) using Polars.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;

use crate::types::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Name of the target column in the training CSV.
pub const LABEL_COLUMN: &str = "label";

/// Feature rows with their crop labels.
#[derive(Debug, Clone, Default)]
pub struct CropDataset {
    pub rows: Vec<FeatureVector>,
    pub labels: Vec<String>,
}

impl CropDataset {
    /// Build a dataset from in-memory rows.
    pub fn from_rows(rows: Vec<FeatureVector>, labels: Vec<String>) -> Result<Self> {
        if rows.len() != labels.len() {
            anyhow::bail!("{} feature rows but {} labels", rows.len(), labels.len());
        }
        Ok(Self { rows, labels })
    }

    /// Load the dataset from CSV.
    ///
    /// Feature columns are selected by name (so column order in the file
    /// does not matter) and cast to Float64. Any null value is an error.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to load dataset CSV: {:?}", path))?;

        tracing::info!("Dataset loaded: {} rows, columns {:?}", df.height(), df.get_column_names());

        let mut exprs: Vec<Expr> = FEATURE_NAMES
            .iter()
            .map(|name| col(*name).cast(DataType::Float64))
            .collect();
        exprs.push(col(LABEL_COLUMN).cast(DataType::String));

        let df = df
            .lazy()
            .select(exprs)
            .collect()
            .with_context(|| "Dataset is missing a feature or label column")?;

        let height = df.height();
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(FEATURE_COUNT);
        for name in FEATURE_NAMES {
            let series = df
                .column(name)
                .with_context(|| format!("Column '{}' not found", name))?
                .f64()
                .with_context(|| format!("Column '{}' is not numeric", name))?;

            let values = series
                .into_iter()
                .enumerate()
                .map(|(idx, v)| {
                    v.with_context(|| format!("Missing value in column '{}' at row {}", name, idx))
                })
                .collect::<Result<Vec<f64>>>()?;
            columns.push(values);
        }

        let labels = df
            .column(LABEL_COLUMN)
            .with_context(|| format!("Column '{}' not found", LABEL_COLUMN))?
            .str()
            .with_context(|| format!("Column '{}' is not string type", LABEL_COLUMN))?
            .into_iter()
            .enumerate()
            .map(|(idx, v)| {
                v.map(|s| s.trim().to_string())
                    .with_context(|| format!("Missing label at row {}", idx))
            })
            .collect::<Result<Vec<String>>>()?;

        let rows = (0..height)
            .map(|i| {
                let mut values = [0.0; FEATURE_COUNT];
                for (slot, column) in values.iter_mut().zip(&columns) {
                    *slot = column[i];
                }
                FeatureVector::from_array(values)
            })
            .collect();

        Self::from_rows(rows, labels)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct labels, sorted.
    pub fn classes(&self) -> Vec<String> {
        self.labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Map each label to its index in `classes`. Unknown labels map to `None`.
    pub fn encode_labels(&self, classes: &[String]) -> Vec<Option<usize>> {
        let index: FxHashMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        self.labels
            .iter()
            .map(|label| index.get(label.as_str()).copied())
            .collect()
    }

    /// Rows at the given indices, in that order.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            rows: indices.iter().map(|&i| self.rows[i]).collect(),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tiny() -> CropDataset {
        CropDataset::from_rows(
            vec![
                FeatureVector::from_array([90.0, 42.0, 43.0, 20.9, 82.0, 6.5, 202.9]),
                FeatureVector::from_array([40.0, 72.0, 77.0, 17.0, 17.0, 7.5, 88.5]),
                FeatureVector::from_array([85.0, 58.0, 41.0, 21.8, 80.3, 7.0, 226.7]),
            ],
            vec!["rice".into(), "chickpea".into(), "rice".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_classes_sorted_unique() {
        assert_eq!(tiny().classes(), vec!["chickpea".to_string(), "rice".to_string()]);
    }

    #[test]
    fn test_encode_labels() {
        let ds = tiny();
        let classes = vec!["rice".to_string()];
        assert_eq!(ds.encode_labels(&classes), vec![Some(0), None, Some(0)]);
    }

    #[test]
    fn test_subset() {
        let ds = tiny().subset(&[2, 0]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].as_slice()[0], 85.0);
        assert_eq!(ds.labels[1], "rice");
    }

    #[test]
    fn test_length_mismatch() {
        assert!(CropDataset::from_rows(vec![], vec!["rice".into()]).is_err());
    }

    #[test]
    fn test_from_csv_reorders_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crops.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        // label first, ph before humidity
        writeln!(file, "label,N,P,K,temperature,ph,humidity,rainfall").unwrap();
        writeln!(file, "rice,90,42,43,20.88,6.5,82.0,202.9").unwrap();
        writeln!(file, "maize,71,54,16,22.61,5.7,63.7,87.8").unwrap();
        drop(file);

        let ds = CropDataset::from_csv(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0].as_slice(), &[90.0, 42.0, 43.0, 20.88, 82.0, 6.5, 202.9]);
        assert_eq!(ds.labels, vec!["rice".to_string(), "maize".to_string()]);
    }

    #[test]
    fn test_from_csv_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crops.csv");
        std::fs::write(&path, "N,P,K,label\n1,2,3,rice\n").unwrap();

        assert!(CropDataset::from_csv(&path).is_err());
    }
}
