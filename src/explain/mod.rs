//! Explain Module - per-client attribution of the default probability

pub mod engine;
pub mod tree_shap;
pub mod types;

pub use engine::explain;
pub use types::{ExplainResult, FeatureContribution};
