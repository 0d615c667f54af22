//! Tree Ensemble - boosted decision trees in flat node-array form

use serde::{Deserialize, Serialize};

/// Deepest tree accepted at load. Attribution recurses once per level.
pub const MAX_TREE_DEPTH: usize = 128;

/// One node of a decision tree.
///
/// Children always sit at a higher index than their parent, so a tree can
/// be walked from the root without cycle checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        /// Branch taken by NaN / infinite inputs
        #[serde(default)]
        default_left: bool,
        left: usize,
        right: usize,
        /// Training samples reaching this node
        cover: f64,
    },
    Leaf {
        value: f64,
        cover: f64,
    },
}

impl Node {
    pub fn cover(&self) -> f64 {
        match self {
            Node::Split { cover, .. } | Node::Leaf { cover, .. } => *cover,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Check structure against a feature count. Returns a reason on failure.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let cover = node.cover();
            if !cover.is_finite() || cover <= 0.0 {
                return Err(format!("node {} has invalid cover {}", index, cover));
            }

            match node {
                Node::Leaf { value, .. } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {} has non-finite value", index));
                    }
                }
                Node::Split { feature, threshold, left, right, cover, .. } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} but the model has {} features",
                            index, feature, n_features
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has NaN threshold", index));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", index, child));
                        }
                    }
                    let children = self.nodes[*left].cover() + self.nodes[*right].cover();
                    if (children - cover).abs() > 1e-6 * cover.max(1.0) {
                        return Err(format!(
                            "node {} cover {} differs from children cover {}",
                            index, cover, children
                        ));
                    }
                }
            }
        }

        let depth = self.depth();
        if depth > MAX_TREE_DEPTH {
            return Err(format!("depth {} exceeds the limit of {}", depth, MAX_TREE_DEPTH));
        }
        Ok(())
    }

    /// Index of the child `x` is routed to from a split node.
    /// `x <= threshold` goes left; non-finite values follow `default_left`.
    pub(crate) fn route(threshold: f64, default_left: bool, value: f64) -> bool {
        if value.is_finite() {
            value <= threshold
        } else {
            default_left
        }
    }

    /// Output of the leaf `x` falls into.
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value, .. } => return *value,
                Node::Split { feature, threshold, default_left, left, right, .. } => {
                    index = if Self::route(*threshold, *default_left, x[*feature]) {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Cover-weighted mean of the leaf values.
    pub fn expected_value(&self) -> f64 {
        // Children come after parents, so a reverse sweep sees them first.
        let mut means = vec![0.0; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate().rev() {
            means[index] = match node {
                Node::Leaf { value, .. } => *value,
                Node::Split { left, right, .. } => {
                    let l = self.nodes[*left].cover();
                    let r = self.nodes[*right].cover();
                    (l * means[*left] + r * means[*right]) / (l + r)
                }
            };
        }
        means[0]
    }

    /// Number of splits on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate().rev() {
            if let Node::Split { left, right, .. } = node {
                depths[index] = 1 + depths[*left].max(depths[*right]);
            }
        }
        depths.first().copied().unwrap_or(0)
    }
}

/// Additive ensemble: raw margin = `base_score + Σ tree outputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Ordered input schema
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("ensemble has no trees".to_string());
        }
        if !self.base_score.is_finite() {
            return Err("base_score is not finite".to_string());
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features())
                .map_err(|reason| format!("tree {}: {}", index, reason))?;
        }
        Ok(())
    }

    pub fn margin(&self, x: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|tree| tree.predict(x)).sum::<f64>()
    }

    /// Mean margin over the training distribution
    pub fn expected_margin(&self) -> f64 {
        self.base_score + self.trees.iter().map(Tree::expected_value).sum::<f64>()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(Tree::depth).max().unwrap_or(0)
    }
}

pub fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}
