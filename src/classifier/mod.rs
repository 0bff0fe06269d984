//! Crop classifier capability
//!
//! The engine depends on the [`CropClassifier`] trait only. The shipped
//! implementation is a random forest:
//! - `decision_tree`: array-based CART tree (inference)
//! - `random_forest`: ensemble with probability averaging + JSON persistence
//! - `training`: offline fitting from the crop dataset

pub mod decision_tree;
pub mod random_forest;
pub mod training;

pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::RandomForestModel;
pub use training::{
    evaluate, fit_forest, train_from_csv, train_on_dataset, train_test_split, MaxFeatures,
    TrainingConfig, TrainingReport,
};

use crate::error::ClassifierError;
use crate::types::{ClassProbability, FeatureVector};

/// A pre-trained crop classifier.
///
/// Implementations are loaded once at startup and shared read-only across
/// requests, hence `Send + Sync`.
pub trait CropClassifier: Send + Sync {
    /// Known class labels in the classifier's internal order.
    fn class_labels(&self) -> &[String];

    /// Single best label.
    fn predict(&self, features: &FeatureVector) -> Result<String, ClassifierError>;

    /// One probability per known class, in internal class order.
    ///
    /// `Ok(None)` means the classifier can only report a single label.
    fn predict_probabilities(
        &self,
        features: &FeatureVector,
    ) -> Result<Option<Vec<ClassProbability>>, ClassifierError> {
        let _ = features;
        Ok(None)
    }
}
