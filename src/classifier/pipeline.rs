//! Tree Pipeline - frozen preprocessing + boosted trees loaded from JSON
//!
//! The training side exports one JSON document:
//!
//! ```json
//! {
//!   "feature_names": ["EXT_SOURCE_1", "EXT_SOURCE_2"],
//!   "preprocessing": [{"impute": 0.5, "center": 0.5, "scale": 0.2}, {}],
//!   "ensemble": {"base_score": -1.2, "trees": [{"nodes": [...]}]}
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::tree::{sigmoid, TreeEnsemble};
use super::{Classifier, TreeClassifier};
use crate::error::ScoringError;

const ARTIFACT: &str = "model artifact";

/// Per-feature preprocessing: impute non-finite, then standardize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransform {
    /// Replacement for NaN / infinite inputs. `None` leaves them to the trees.
    #[serde(default)]
    pub impute: Option<f64>,
    #[serde(default)]
    pub center: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

impl Default for FeatureTransform {
    fn default() -> Self {
        Self { impute: None, center: 0.0, scale: 1.0 }
    }
}

impl FeatureTransform {
    pub fn apply(&self, value: f64) -> f64 {
        let value = match self.impute {
            Some(fill) if !value.is_finite() => fill,
            _ => value,
        };
        (value - self.center) / self.scale
    }
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    feature_names: Vec<String>,
    #[serde(default)]
    preprocessing: Vec<FeatureTransform>,
    ensemble: TreeEnsemble,
}

/// Model metadata
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub model_path: String,
    /// SHA-256 of the artifact bytes
    pub sha256: String,
    pub features: usize,
    pub trees: usize,
    pub max_depth: usize,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TreePipeline {
    preprocessing: Vec<FeatureTransform>,
    ensemble: TreeEnsemble,
    metadata: ModelMetadata,
}

impl TreePipeline {
    /// Load a pipeline artifact from disk
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        tracing::info!("Loading model from: {}", path.display());

        let bytes = std::fs::read(path)
            .map_err(|e| ScoringError::artifact(format!("{} {}", ARTIFACT, path.display()), e))?;
        let pipeline = Self::from_slice(&bytes, &path.display().to_string())?;

        tracing::info!(
            "Model loaded: {} features, {} trees, sha256={}",
            pipeline.metadata.features,
            pipeline.metadata.trees,
            pipeline.metadata.sha256
        );
        Ok(pipeline)
    }

    pub fn from_slice(bytes: &[u8], source: &str) -> Result<Self, ScoringError> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)
            .map_err(|e| ScoringError::artifact(ARTIFACT, e))?;

        let n_features = artifact.feature_names.len();
        if n_features == 0 {
            return Err(ScoringError::artifact(ARTIFACT, "feature_names is empty"));
        }

        let preprocessing = if artifact.preprocessing.is_empty() {
            vec![FeatureTransform::default(); n_features]
        } else {
            artifact.preprocessing
        };
        if preprocessing.len() != n_features {
            return Err(ScoringError::artifact(
                ARTIFACT,
                format!("{} preprocessing steps for {} features", preprocessing.len(), n_features),
            ));
        }
        for (name, step) in artifact.feature_names.iter().zip(&preprocessing) {
            if !step.scale.is_finite() || step.scale == 0.0 || !step.center.is_finite() {
                return Err(ScoringError::artifact(ARTIFACT, format!("invalid scaling for {}", name)));
            }
            if matches!(step.impute, Some(fill) if !fill.is_finite()) {
                return Err(ScoringError::artifact(ARTIFACT, format!("non-finite impute for {}", name)));
            }
        }

        let mut ensemble = artifact.ensemble;
        ensemble.feature_names = artifact.feature_names;
        ensemble.validate().map_err(|reason| ScoringError::artifact(ARTIFACT, reason))?;

        let metadata = ModelMetadata {
            model_path: source.to_string(),
            sha256: format!("{:x}", Sha256::digest(bytes)),
            features: n_features,
            trees: ensemble.trees.len(),
            max_depth: ensemble.max_depth(),
            loaded_at: Utc::now(),
        };

        Ok(Self { preprocessing, ensemble, metadata })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn check_arity(&self, features: &[f64]) -> Result<(), ScoringError> {
        if features.len() != self.ensemble.n_features() {
            return Err(ScoringError::mismatch(
                format!("{} features", self.ensemble.n_features()),
                format!("{} features", features.len()),
            ));
        }
        Ok(())
    }
}

impl Classifier for TreePipeline {
    fn feature_names(&self) -> &[String] {
        &self.ensemble.feature_names
    }

    fn predict_probability(&self, features: &[f64]) -> Result<f64, ScoringError> {
        let input = self.ensemble_input(features)?;
        Ok(sigmoid(self.ensemble.margin(&input)))
    }

    fn digest(&self) -> Option<&str> {
        Some(self.metadata.sha256.as_str())
    }
}

impl TreeClassifier for TreePipeline {
    fn ensemble(&self) -> &TreeEnsemble {
        &self.ensemble
    }

    fn ensemble_input(&self, features: &[f64]) -> Result<Vec<f64>, ScoringError> {
        self.check_arity(features)?;
        Ok(features
            .iter()
            .zip(&self.preprocessing)
            .map(|(value, step)| step.apply(*value))
            .collect())
    }
}
