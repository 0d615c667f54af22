//! Classifier Module - frozen default-risk model
//!
//! Training happens elsewhere; this module only loads the exported
//! pipeline and runs inference on it.

pub mod pipeline;
pub mod threshold;
pub mod tree;

use crate::error::ScoringError;

// Re-export common types
pub use pipeline::{ModelMetadata, TreePipeline};
pub use threshold::{Decision, DecisionThreshold};
pub use tree::{Node, Tree, TreeEnsemble};

/// Binary classifier with a single inference entry point
pub trait Classifier: Send + Sync {
    /// Ordered input schema the model was trained on
    fn feature_names(&self) -> &[String];

    /// Probability of default, in [0, 1]
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ScoringError>;

    /// SHA-256 of the loaded artifact, when there is one
    fn digest(&self) -> Option<&str> {
        None
    }
}

/// Classifier backed by a tree ensemble that can be inspected for attribution
pub trait TreeClassifier: Classifier {
    fn ensemble(&self) -> &TreeEnsemble;

    /// Feature vector as the trees see it, after the model's own preprocessing
    fn ensemble_input(&self, features: &[f64]) -> Result<Vec<f64>, ScoringError>;
}
