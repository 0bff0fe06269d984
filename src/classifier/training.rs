//! Offline random forest training
//!
//! CART trees grown on bootstrap samples with Gini impurity and a random
//! feature subset per split, then collected into a [`RandomForestModel`].
//! Trees are fitted in parallel with Rayon; tree `i` draws from its own RNG
//! seeded with `seed + i`, so the fitted model does not depend on thread
//! scheduling.

use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::decision_tree::{DecisionTree, TreeNode};
use super::random_forest::RandomForestModel;
use crate::data::CropDataset;
use crate::error::ClassifierError;
use crate::types::{FeatureVector, FEATURE_COUNT};

/// Number of features considered at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `max(1, floor(sqrt(n_features)))`
    Sqrt,
    /// Every feature
    All,
    Fixed(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Forest hyperparameters and split settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
    /// Fraction of rows held out for evaluation
    pub test_fraction: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
            test_fraction: 0.2,
        }
    }
}

impl TrainingConfig {
    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            anyhow::bail!("n_estimators must be at least 1");
        }
        if self.min_samples_split < 2 {
            anyhow::bail!("min_samples_split must be at least 2");
        }
        if !(0.0..1.0).contains(&self.test_fraction) {
            anyhow::bail!("test_fraction must be in [0, 1), got {}", self.test_fraction);
        }
        Ok(())
    }
}

/// Outcome of a full training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model: RandomForestModel,
    /// Accuracy on the held-out split (0.0 when nothing was held out)
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub classes: Vec<String>,
}

/// Seeded shuffle, then the first `ceil(n * test_fraction)` rows become the
/// test split.
pub fn train_test_split(
    dataset: &CropDataset,
    test_fraction: f64,
    seed: u64,
) -> (CropDataset, CropDataset) {
    let mut indices: Vec<usize> = (0..dataset.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let n_test = ((dataset.len() as f64) * test_fraction).ceil() as usize;
    let n_test = n_test.min(dataset.len());

    let (test_idx, train_idx) = indices.split_at(n_test);
    (dataset.subset(train_idx), dataset.subset(test_idx))
}

/// Fit a random forest on every row of `dataset`.
pub fn fit_forest(dataset: &CropDataset, config: &TrainingConfig) -> Result<RandomForestModel> {
    config.validate()?;
    if dataset.is_empty() {
        anyhow::bail!("cannot train on an empty dataset");
    }

    let classes = dataset.classes();
    let targets: Vec<usize> = dataset
        .encode_labels(&classes)
        .into_iter()
        .map(|t| t.context("label missing from class list"))
        .collect::<Result<_>>()?;

    tracing::info!(
        "Fitting {} trees on {} rows ({} classes)",
        config.n_estimators,
        dataset.len(),
        classes.len()
    );

    let trees = (0..config.n_estimators)
        .into_par_iter()
        .map(|i| {
            let rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
            TreeBuilder::new(&dataset.rows, &targets, classes.len(), config, rng).build()
        })
        .collect::<Result<Vec<DecisionTree>, ClassifierError>>()
        .context("Failed to assemble decision tree")?;

    let model = RandomForestModel::from_trees(classes, trees)?;
    tracing::info!(
        "Forest fitted: {} nodes, average depth {:.1}",
        model.total_nodes(),
        model.avg_depth()
    );

    Ok(model)
}

/// Fraction of rows whose predicted label matches. Rows with a label the
/// model has never seen count as misses.
pub fn evaluate(model: &RandomForestModel, dataset: &CropDataset) -> Result<f64, ClassifierError> {
    if dataset.is_empty() {
        return Ok(0.0);
    }

    let targets = dataset.encode_labels(model.classes());
    let mut correct = 0usize;
    for (row, target) in dataset.rows.iter().zip(targets) {
        if Some(model.predict_index(row)?) == target {
            correct += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    Ok(correct as f64 / dataset.len() as f64)
}

/// Load the CSV, split, fit and evaluate.
pub fn train_from_csv(path: &Path, config: &TrainingConfig) -> Result<TrainingReport> {
    config.validate()?;
    let dataset = CropDataset::from_csv(path)?;
    train_on_dataset(&dataset, config)
}

/// Split, fit and evaluate an in-memory dataset.
pub fn train_on_dataset(dataset: &CropDataset, config: &TrainingConfig) -> Result<TrainingReport> {
    let (train, test) = train_test_split(dataset, config.test_fraction, config.seed);
    tracing::info!("Train/test split: {} / {}", train.len(), test.len());

    let model = fit_forest(&train, config)?;
    let accuracy = evaluate(&model, &test)?;
    tracing::info!("Held-out accuracy: {:.4}", accuracy);

    Ok(TrainingReport {
        classes: model.classes().to_vec(),
        model,
        accuracy,
        n_train: train.len(),
        n_test: test.len(),
    })
}

// ============================================================================
// CART tree growth
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    /// Sum of child Gini impurities weighted by child size
    impurity: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [FeatureVector],
    targets: &'a [usize],
    n_classes: usize,
    config: &'a TrainingConfig,
    max_features: usize,
    rng: StdRng,
    nodes: Vec<TreeNode>,
}

impl<'a> TreeBuilder<'a> {
    fn new(
        rows: &'a [FeatureVector],
        targets: &'a [usize],
        n_classes: usize,
        config: &'a TrainingConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            rows,
            targets,
            n_classes,
            config,
            max_features: config.max_features.resolve(FEATURE_COUNT),
            rng,
            nodes: Vec::new(),
        }
    }

    fn build(mut self) -> Result<DecisionTree, ClassifierError> {
        let n = self.rows.len();
        let sample: Vec<usize> = if self.config.bootstrap {
            (0..n).map(|_| self.rng.gen_range(0..n)).collect()
        } else {
            (0..n).collect()
        };

        self.grow(sample, 0);
        DecisionTree::from_nodes(self.nodes, FEATURE_COUNT, self.n_classes)
    }

    /// Grow the subtree for `indices`, returning its root node index.
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&indices);
        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::leaf(distribution(&counts, indices.len())));

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || indices.len() < self.config.min_samples_split {
            return node_id;
        }

        let Some(split) = self.best_split(&indices, &counts) else {
            return node_id;
        };

        let rows = self.rows;
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i].as_slice()[split.feature] <= split.threshold);

        let left_id = self.grow(left, depth + 1);
        let right_id = self.grow(right, depth + 1);
        self.nodes[node_id] = TreeNode::split(split.feature, split.threshold, left_id, right_id);

        node_id
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[self.targets[i]] += 1;
        }
        counts
    }

    /// Best Gini split over a random feature subset.
    ///
    /// Like scikit-learn, the search continues past `max_features` when
    /// none of the sampled features admits a split (all values equal).
    fn best_split(&mut self, indices: &[usize], totals: &[usize]) -> Option<Split> {
        let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<Split> = None;
        let mut pairs: Vec<(f64, usize)> = Vec::with_capacity(indices.len());

        for (visited, &feature) in features.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }

            pairs.clear();
            pairs.extend(
                indices
                    .iter()
                    .map(|&i| (self.rows[i].as_slice()[feature], self.targets[i])),
            );
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = vec![0usize; self.n_classes];
            let mut right = totals.to_vec();
            let n = pairs.len();

            for i in 0..n - 1 {
                let (value, class) = pairs[i];
                left[class] += 1;
                right[class] -= 1;

                let next = pairs[i + 1].0;
                if next <= value {
                    continue;
                }

                let impurity = weighted_gini(&left, i + 1) + weighted_gini(&right, n - i - 1);
                if best.map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = value + (next - value) / 2.0;
                    if threshold >= next || !threshold.is_finite() {
                        threshold = value;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

/// Gini impurity times node size: `n - Σ c² / n`.
#[allow(clippy::cast_precision_loss)]
fn weighted_gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = counts.iter().map(|&c| (c * c) as f64).sum();
    n as f64 - sum_sq / n as f64
}

#[allow(clippy::cast_precision_loss)]
fn distribution(counts: &[usize], n: usize) -> Vec<f64> {
    if n == 0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / n as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two crops separated by humidity, one by pH
    fn separable() -> CropDataset {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let jitter = i as f64;
            rows.push(FeatureVector::from_array([80.0 + jitter, 45.0, 40.0, 24.0, 82.0 + jitter / 4.0, 6.2, 220.0 + jitter]));
            labels.push("rice".to_string());
            rows.push(FeatureVector::from_array([40.0 + jitter, 68.0, 80.0, 18.5, 16.0 + jitter / 4.0, 7.3, 80.0 + jitter]));
            labels.push("chickpea".to_string());
            rows.push(FeatureVector::from_array([78.0 + jitter, 48.0, 20.0, 22.0, 65.0 + jitter / 4.0, 6.1, 90.0 + jitter]));
            labels.push("maize".to_string());
        }
        CropDataset::from_rows(rows, labels).unwrap()
    }

    #[test]
    fn test_weighted_gini() {
        assert_eq!(weighted_gini(&[4, 0], 4), 0.0);
        // 2/2 split: 4 * 0.5
        assert!((weighted_gini(&[2, 2], 4) - 2.0).abs() < 1e-12);
        assert_eq!(weighted_gini(&[0, 0], 0), 0.0);
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(7), 2);
        assert_eq!(MaxFeatures::All.resolve(7), 7);
        assert_eq!(MaxFeatures::Fixed(0).resolve(7), 1);
        assert_eq!(MaxFeatures::Fixed(20).resolve(7), 7);
    }

    #[test]
    fn test_split_sizes() {
        let ds = separable();
        let (train, test) = train_test_split(&ds, 0.2, 42);
        // ceil(36 * 0.2) = 8
        assert_eq!(test.len(), 8);
        assert_eq!(train.len(), 28);
    }

    #[test]
    fn test_split_is_seeded() {
        let ds = separable();
        let (_, a) = train_test_split(&ds, 0.25, 7);
        let (_, b) = train_test_split(&ds, 0.25, 7);
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.rows, b.rows);
    }

    #[test]
    fn test_single_tree_fits_training_data() {
        let ds = separable();
        let config = TrainingConfig {
            n_estimators: 1,
            bootstrap: false,
            max_features: MaxFeatures::All,
            ..TrainingConfig::default()
        };

        let model = fit_forest(&ds, &config).unwrap();
        assert_eq!(evaluate(&model, &ds).unwrap(), 1.0);
    }

    #[test]
    fn test_forest_probabilities_sum_to_one() {
        let ds = separable();
        let config = TrainingConfig {
            n_estimators: 15,
            ..TrainingConfig::default()
        };
        let model = fit_forest(&ds, &config).unwrap();

        for row in &ds.rows {
            let p = model.predict_proba(row).unwrap();
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_max_depth_limits_tree() {
        let ds = separable();
        let config = TrainingConfig {
            n_estimators: 3,
            max_depth: Some(1),
            ..TrainingConfig::default()
        };
        let model = fit_forest(&ds, &config).unwrap();
        assert!(model.avg_depth() <= 1.0);
    }

    #[test]
    fn test_constant_features_give_leaf() {
        let rows = vec![FeatureVector::from_array([1.0; FEATURE_COUNT]); 4];
        let labels = vec!["a".into(), "b".into(), "a".into(), "b".into()];
        let ds = CropDataset::from_rows(rows, labels).unwrap();
        let config = TrainingConfig {
            n_estimators: 1,
            bootstrap: false,
            ..TrainingConfig::default()
        };

        let model = fit_forest(&ds, &config).unwrap();
        assert_eq!(model.total_nodes(), 1);
        let p = model.predict_proba(&ds.rows[0]).unwrap();
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn test_invalid_config() {
        let ds = separable();
        let config = TrainingConfig {
            n_estimators: 0,
            ..TrainingConfig::default()
        };
        assert!(fit_forest(&ds, &config).is_err());
        assert!(fit_forest(&CropDataset::default(), &TrainingConfig::default()).is_err());
    }
}
