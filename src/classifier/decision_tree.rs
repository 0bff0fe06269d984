//! Array-based decision tree (inference only).
//!
//! Nodes are stored in a flat vector with child indices, mirroring the
//! layout scikit-learn uses for its fitted trees. Leaves carry the class
//! distribution of the training samples that reached them, which is what
//! the forest averages into probabilities.
//!
//! Trees are validated on construction and on deserialization, so
//! traversal never follows a dangling or backward child pointer.

use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Feature index marking a leaf node.
pub const LEAF: i32 = -2;

/// Child index of a leaf node.
pub const NO_CHILD: i32 = -1;

/// A node in the decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index to split on (`-2` for leaf nodes).
    pub feature: i32,
    /// Split threshold (features <= threshold go left).
    pub threshold: f64,
    /// Index of left child (`-1` for leaf).
    pub left_child: i32,
    /// Index of right child (`-1` for leaf).
    pub right_child: i32,
    /// Class fractions for leaf nodes (empty on split nodes).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distribution: Vec<f64>,
}

impl TreeNode {
    pub fn leaf(distribution: Vec<f64>) -> Self {
        Self {
            feature: LEAF,
            threshold: LEAF as f64,
            left_child: NO_CHILD,
            right_child: NO_CHILD,
            distribution,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn split(feature: usize, threshold: f64, left_child: usize, right_child: usize) -> Self {
        Self {
            feature: feature as i32,
            threshold,
            left_child: left_child as i32,
            right_child: right_child as i32,
            distribution: Vec::new(),
        }
    }

    /// Returns `true` if this node is a leaf (no children).
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.feature < 0
    }
}

/// Serialized form; converted through [`DecisionTree::from_nodes`].
#[derive(Serialize, Deserialize)]
struct TreeParts {
    n_features: usize,
    n_classes: usize,
    nodes: Vec<TreeNode>,
}

/// A decision tree classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TreeParts", into = "TreeParts")]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    n_classes: usize,
}

impl TryFrom<TreeParts> for DecisionTree {
    type Error = ClassifierError;

    fn try_from(parts: TreeParts) -> Result<Self, Self::Error> {
        DecisionTree::from_nodes(parts.nodes, parts.n_features, parts.n_classes)
    }
}

impl From<DecisionTree> for TreeParts {
    fn from(tree: DecisionTree) -> Self {
        TreeParts {
            n_features: tree.n_features,
            n_classes: tree.n_classes,
            nodes: tree.nodes,
        }
    }
}

impl DecisionTree {
    /// Build a tree from its node array (root at index 0).
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidModel`] if the array is empty, a
    /// split references an unknown feature or a child that is out of range
    /// or not after its parent, or a leaf distribution does not have one
    /// finite entry per class.
    pub fn from_nodes(
        nodes: Vec<TreeNode>,
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self, ClassifierError> {
        if nodes.is_empty() {
            return Err(ClassifierError::InvalidModel("tree has no nodes".into()));
        }

        let n = nodes.len();
        for (idx, node) in nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.distribution.len() != n_classes {
                    return Err(ClassifierError::InvalidModel(format!(
                        "leaf {} has {} class fractions, expected {}",
                        idx,
                        node.distribution.len(),
                        n_classes
                    )));
                }
                if node.distribution.iter().any(|p| !p.is_finite()) {
                    return Err(ClassifierError::InvalidModel(format!(
                        "leaf {} has a non-finite class fraction",
                        idx
                    )));
                }
                continue;
            }

            if node.feature as usize >= n_features {
                return Err(ClassifierError::InvalidModel(format!(
                    "node {} splits on feature {} of {}",
                    idx, node.feature, n_features
                )));
            }
            // Children must point forward, which also rules out cycles
            for child in [node.left_child, node.right_child] {
                if child <= idx as i32 || child as usize >= n {
                    return Err(ClassifierError::InvalidModel(format!(
                        "node {} has invalid child {}",
                        idx, child
                    )));
                }
            }
        }

        Ok(Self {
            nodes,
            n_features,
            n_classes,
        })
    }

    /// Class distribution of the leaf reached by `features`.
    ///
    /// Missing trailing features are read as `0.0`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return &node.distribution;
            }
            let feat_val = features.get(node.feature as usize).copied().unwrap_or(0.0);
            idx = if feat_val <= node.threshold {
                node.left_child as usize
            } else {
                node.right_child as usize
            };
        }
    }

    /// Most likely class index (earliest class wins ties).
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> usize {
        argmax(self.predict_proba(features))
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Expected number of features.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of classes in leaf distributions.
    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Access a node by index.
    #[must_use]
    pub fn node_at(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    /// Tree depth (longest root-to-leaf path).
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                max_depth = max_depth.max(depth);
            } else {
                stack.push((node.left_child as usize, depth + 1));
                stack.push((node.right_child as usize, depth + 1));
            }
        }
        max_depth
    }
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}
