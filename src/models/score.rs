//! Score result model

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::classifier::Decision;
use crate::explain::FeatureContribution;

/// NaN and infinities become `None` (JSON `null`)
pub fn finite_or_none(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// JSON object that keeps insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

/// Ordered `name -> value-or-null` map
pub type FeatureValues = OrderedMap<Option<f64>>;

impl FeatureValues {
    pub fn from_raw<'a>(names: impl IntoIterator<Item = &'a String>, values: &[f64]) -> Self {
        Self(
            names
                .into_iter()
                .zip(values)
                .map(|(name, value)| (name.clone(), finite_or_none(*value)))
                .collect(),
        )
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, name: &str) -> Option<&V> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of scoring one client. Built per request, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub client_id: i64,
    pub probability: f64,
    pub decision: Decision,
    pub threshold: f64,
    /// Baseline probability the attributions start from
    pub expected_value: f64,
    /// One per input feature, input order
    pub attributions: Vec<FeatureContribution>,
    pub feature_values: FeatureValues,
}

#[derive(Debug, Serialize)]
pub struct ShapValues {
    pub features: Vec<String>,
    pub shap_values: Vec<Option<f64>>,
}

#[derive(Debug, Serialize)]
pub struct ClientScoreResponse {
    pub client_id: i64,
    pub probability_of_default: Option<f64>,
    pub decision: Decision,
    pub decision_label: &'static str,
    pub threshold: f64,
    pub expected_value: Option<f64>,
    pub shap_values: ShapValues,
    pub client_feature_values: FeatureValues,
}

impl From<ScoreResult> for ClientScoreResponse {
    fn from(result: ScoreResult) -> Self {
        let (features, shap_values): (Vec<String>, Vec<Option<f64>>) = result
            .attributions
            .into_iter()
            .map(|c| (c.name, finite_or_none(c.contribution)))
            .unzip();

        Self {
            client_id: result.client_id,
            probability_of_default: finite_or_none(result.probability),
            decision: result.decision,
            decision_label: result.decision.label(),
            threshold: result.threshold,
            expected_value: finite_or_none(result.expected_value),
            shap_values: ShapValues { features, shap_values },
            client_feature_values: result.feature_values,
        }
    }
}
