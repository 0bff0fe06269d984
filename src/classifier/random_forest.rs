//! Random forest crop classifier.
//!
//! Ensemble of [`DecisionTree`]s. Class probabilities are the mean of the
//! leaf class distributions across trees, the same soft-voting rule
//! scikit-learn's `predict_proba` uses. The predicted label is the argmax
//! of those probabilities.
//!
//! Models are persisted as JSON (see [`RandomForestModel::save`]).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::decision_tree::{argmax, DecisionTree};
use super::CropClassifier;
use crate::error::ClassifierError;
use crate::types::{ClassProbability, FeatureVector, FEATURE_COUNT};

/// Serialized form; converted through [`RandomForestModel::from_trees`].
#[derive(Serialize, Deserialize)]
struct ForestParts {
    classes: Vec<String>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

/// A trained random forest over crop labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ForestParts", into = "ForestParts")]
pub struct RandomForestModel {
    classes: Vec<String>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl TryFrom<ForestParts> for RandomForestModel {
    type Error = ClassifierError;

    fn try_from(parts: ForestParts) -> Result<Self, Self::Error> {
        let mut model = RandomForestModel::from_trees(parts.classes, parts.trees)?;
        if model.trees.is_empty() {
            model.n_features = parts.n_features;
        }
        Ok(model)
    }
}

impl From<RandomForestModel> for ForestParts {
    fn from(model: RandomForestModel) -> Self {
        ForestParts {
            classes: model.classes,
            n_features: model.n_features,
            trees: model.trees,
        }
    }
}

impl RandomForestModel {
    /// Build a forest from pre-trained trees.
    ///
    /// An empty forest is representable but every prediction on it fails
    /// with [`ClassifierError::NotLoaded`].
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidModel`] if trees disagree on the
    /// feature count or their class count differs from `classes.len()`.
    pub fn from_trees(classes: Vec<String>, trees: Vec<DecisionTree>) -> Result<Self, ClassifierError> {
        let n_features = trees.first().map_or(FEATURE_COUNT, DecisionTree::n_features);

        if trees.iter().any(|t| t.n_features() != n_features) {
            return Err(ClassifierError::InvalidModel(
                "inconsistent n_features across trees".into(),
            ));
        }
        if let Some(tree) = trees.iter().find(|t| t.n_classes() != classes.len()) {
            return Err(ClassifierError::InvalidModel(format!(
                "tree has {} classes, model has {}",
                tree.n_classes(),
                classes.len()
            )));
        }

        Ok(Self {
            classes,
            n_features,
            trees,
        })
    }

    /// Load a model from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file: {:?}", path))?;

        let model: RandomForestModel = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse model file: {:?}", path))?;

        if model.trees.is_empty() {
            tracing::warn!("Model file {:?} contains no trees", path);
        }
        tracing::info!(
            "Loaded random forest: {} trees, {} classes, {} features",
            model.n_trees(),
            model.classes.len(),
            model.n_features
        );

        Ok(model)
    }

    /// Write the model as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize model")?;
        fs::write(path, json).with_context(|| format!("Failed to write model file: {:?}", path))?;
        Ok(())
    }

    /// Mean leaf distribution across trees, one entry per class.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
        if self.n_features != FEATURE_COUNT {
            return Err(ClassifierError::FeatureCount {
                expected: self.n_features,
                actual: FEATURE_COUNT,
            });
        }
        if let Some(name) = features.first_non_finite() {
            return Err(ClassifierError::NonFiniteFeature(name));
        }
        if self.trees.is_empty() {
            return Err(ClassifierError::NotLoaded);
        }

        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (total, p) in totals.iter_mut().zip(tree.predict_proba(features.as_slice())) {
                *total += p;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let n_trees = self.trees.len() as f64;
        for total in &mut totals {
            *total /= n_trees;
        }

        if totals.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::Numeric("non-finite class probability".into()));
        }

        Ok(totals)
    }

    /// Most likely class index.
    pub fn predict_index(&self, features: &FeatureVector) -> Result<usize, ClassifierError> {
        self.predict_proba(features).map(|p| argmax(&p))
    }

    /// Class labels (sorted at training time).
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of trees in the forest.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Expected number of features per sample.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Average tree depth across the forest.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }

    /// Total number of nodes across all trees.
    #[must_use]
    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }
}

impl CropClassifier for RandomForestModel {
    fn class_labels(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, features: &FeatureVector) -> Result<String, ClassifierError> {
        let idx = self.predict_index(features)?;
        self.classes
            .get(idx)
            .cloned()
            .ok_or_else(|| ClassifierError::InvalidModel("model has no classes".into()))
    }

    fn predict_probabilities(
        &self,
        features: &FeatureVector,
    ) -> Result<Option<Vec<ClassProbability>>, ClassifierError> {
        let probabilities = self.predict_proba(features)?;
        Ok(Some(
            self.classes
                .iter()
                .zip(probabilities)
                .map(|(label, p)| ClassProbability::new(label.clone(), p))
                .collect(),
        ))
    }
}
