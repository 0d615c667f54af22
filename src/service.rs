//! Scoring Service - composes store, classifier, threshold and explainer
//!
//! Everything is loaded once at startup and only read afterwards, so a
//! single instance is shared by all requests behind an `Arc`.

use std::collections::HashSet;

use serde::Serialize;

use crate::classifier::{DecisionThreshold, TreeClassifier, TreePipeline};
use crate::config::Config;
use crate::error::ScoringError;
use crate::explain;
use crate::models::{
    finite_or_none, DescriptionCatalog, FeatureDescription, FeatureImportanceEntry, FeatureRanking,
    FeatureValues, OrderedMap, PopulationStore, ScoreResult,
};

/// Full-population values of the top features plus the label column
#[derive(Debug, Clone, Serialize)]
pub struct FeatureData {
    #[serde(rename = "top_10_features")]
    pub top_features: Vec<String>,
    pub feature_data: OrderedMap<Vec<Option<f64>>>,
    pub target: Vec<Option<u8>>,
}

pub struct ScoringService {
    classifier: Box<dyn TreeClassifier>,
    store: PopulationStore,
    ranking: FeatureRanking,
    descriptions: DescriptionCatalog,
    threshold: DecisionThreshold,
}

impl ScoringService {
    /// Load every artifact named by `config`. Any failure is fatal.
    pub fn load(config: &Config) -> Result<Self, ScoringError> {
        let classifier = TreePipeline::load(&config.model_path)?;
        let store = PopulationStore::load(&config.population_path)?;
        let ranking = FeatureRanking::load(&config.feature_importance_path)?;
        let descriptions = DescriptionCatalog::load(&config.column_description_path)?;

        Self::new(
            Box::new(classifier),
            store,
            ranking,
            descriptions,
            DecisionThreshold::new(config.decision_threshold),
        )
    }

    /// Assemble a service, checking that the artifacts agree with each other.
    pub fn new(
        classifier: Box<dyn TreeClassifier>,
        store: PopulationStore,
        ranking: FeatureRanking,
        descriptions: DescriptionCatalog,
        threshold: DecisionThreshold,
    ) -> Result<Self, ScoringError> {
        if store.feature_names() != classifier.feature_names() {
            return Err(ScoringError::artifact(
                "population snapshot",
                format!(
                    "columns do not match the model schema ({} columns, model expects {})",
                    store.feature_names().len(),
                    classifier.feature_names().len()
                ),
            ));
        }

        let known: HashSet<&str> = store.feature_names().iter().map(String::as_str).collect();
        if let Some(unknown) = ranking.entries().iter().find(|e| !known.contains(e.feature.as_str())) {
            return Err(ScoringError::artifact(
                "feature importance table",
                format!("unknown feature {}", unknown.feature),
            ));
        }

        if !(0.0..=1.0).contains(&threshold.threshold) {
            return Err(ScoringError::artifact(
                "configuration",
                format!("threshold {} outside [0, 1]", threshold.threshold),
            ));
        }

        tracing::info!(
            "Scoring service ready: {} clients, {} ranked features, threshold {}",
            store.len(),
            ranking.len(),
            threshold.threshold
        );

        Ok(Self { classifier, store, ranking, descriptions, threshold })
    }

    /// Probability, decision and attribution for one stored client
    pub fn score_client(&self, client_id: i64) -> Result<ScoreResult, ScoringError> {
        let record = self.store.lookup(client_id)?;
        let feature_names = self.store.feature_names();

        let probability = self.classifier.predict_probability(&record.features)?;
        let decision = self.threshold.decide(probability);

        let input = self.classifier.ensemble_input(&record.features)?;
        let explanation = explain::explain(self.classifier.ensemble(), feature_names, &input)?;

        tracing::debug!(
            "Scored client {}: p={:.4} -> {:?}",
            client_id,
            probability,
            decision
        );

        Ok(ScoreResult {
            client_id,
            probability,
            decision,
            threshold: self.threshold.threshold,
            expected_value: explanation.expected_value,
            attributions: explanation.contributions,
            feature_values: FeatureValues::from_raw(feature_names, &record.features),
        })
    }

    pub fn feature_importance(&self, n: usize) -> &[FeatureImportanceEntry] {
        self.ranking.top_n(n)
    }

    pub fn feature_data(&self, n: usize) -> FeatureData {
        let top_features: Vec<String> = self
            .ranking
            .top_names(n)
            .into_iter()
            .map(str::to_string)
            .collect();

        let columns = top_features
            .iter()
            .filter_map(|name| {
                // Ranked names were checked against the store in `new`
                let position = self.store.feature_position(name)?;
                let values: Vec<Option<f64>> = self.store.column(position).map(finite_or_none).collect();
                Some((name.clone(), values))
            })
            .collect();

        FeatureData {
            top_features,
            feature_data: OrderedMap(columns),
            target: self.store.labels().collect(),
        }
    }

    pub fn feature_descriptions(&self) -> &[FeatureDescription] {
        self.descriptions.entries()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold.threshold
    }

    pub fn feature_count(&self) -> usize {
        self.store.feature_names().len()
    }

    pub fn client_count(&self) -> usize {
        self.store.len()
    }

    pub fn model_digest(&self) -> Option<&str> {
        self.classifier.digest()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::classifier::pipeline::tests::sample_pipeline;
    use crate::classifier::Decision;
    use crate::models::client::tests::sample_store;

    pub(crate) fn sample_ranking() -> FeatureRanking {
        FeatureRanking::from_reader("Feature,Importance\nDAYS_BIRTH,120\nEXT_SOURCE_1,340\n".as_bytes()).unwrap()
    }

    pub(crate) fn sample_service() -> ScoringService {
        ScoringService::new(
            Box::new(sample_pipeline()),
            sample_store(),
            sample_ranking(),
            DescriptionCatalog::parse("Row,Description\nDAYS_BIRTH,Age in days\n").unwrap(),
            DecisionThreshold::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_score_known_client() {
        let service = sample_service();
        let result = service.score_client(100002).unwrap();

        assert_eq!(result.client_id, 100002);
        assert!((0.0..=1.0).contains(&result.probability));
        assert_eq!(result.decision, service.threshold.decide(result.probability));
        assert_eq!(result.threshold, 0.36);
        assert_eq!(result.attributions.len(), 2);
        assert_eq!(result.attributions[0].name, "EXT_SOURCE_1");

        let total: f64 = result.attributions.iter().map(|a| a.contribution).sum();
        assert!((total - (result.probability - result.expected_value)).abs() < 1e-9);
    }

    #[test]
    fn test_every_client_has_valid_probability() {
        let service = sample_service();
        for id in [100002, 100003, 100004, 346699] {
            let result = service.score_client(id).unwrap();
            assert!((0.0..=1.0).contains(&result.probability), "client {}", id);
        }
    }

    #[test]
    fn test_unknown_client() {
        let service = sample_service();
        assert_eq!(service.score_client(999999999), Err(ScoringError::ClientNotFound(999999999)));
    }

    #[test]
    fn test_idempotent() {
        let service = sample_service();
        let first = service.score_client(100003).unwrap();
        let second = service.score_client(100003).unwrap();
        assert_eq!(first.probability.to_bits(), second.probability.to_bits());
        for (a, b) in first.attributions.iter().zip(&second.attributions) {
            assert_eq!(a.contribution.to_bits(), b.contribution.to_bits());
        }
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_finite_values_are_missing() {
        let service = sample_service();
        let result = service.score_client(100004).unwrap();
        assert_eq!(result.feature_values.get("EXT_SOURCE_1"), Some(&None));
        assert_eq!(result.feature_values.get("DAYS_BIRTH"), Some(&Some(-19046.0)));

        let data = service.feature_data(10);
        assert_eq!(data.feature_data.get("EXT_SOURCE_1").unwrap()[2], None);
        assert_eq!(data.feature_data.get("EXT_SOURCE_1").unwrap()[3], None);
    }

    #[test]
    fn test_threshold_drives_decision() {
        let strict = ScoringService::new(
            Box::new(sample_pipeline()),
            sample_store(),
            sample_ranking(),
            DescriptionCatalog::default(),
            DecisionThreshold::new(0.0),
        )
        .unwrap();
        assert_eq!(strict.score_client(100003).unwrap().decision, Decision::Denied);

        let lenient = ScoringService::new(
            Box::new(sample_pipeline()),
            sample_store(),
            sample_ranking(),
            DescriptionCatalog::default(),
            DecisionThreshold::new(1.0),
        )
        .unwrap();
        assert_eq!(lenient.score_client(100003).unwrap().decision, Decision::Approved);
    }

    #[test]
    fn test_feature_data_alignment() {
        let service = sample_service();
        let data = service.feature_data(10);
        assert_eq!(data.top_features, vec!["EXT_SOURCE_1", "DAYS_BIRTH"]);
        assert_eq!(data.feature_data.keys().collect::<Vec<_>>(), vec!["EXT_SOURCE_1", "DAYS_BIRTH"]);
        assert_eq!(data.target, vec![Some(1), Some(0), None, Some(0)]);
        assert!(data.feature_data.0.iter().all(|(_, values)| values.len() == data.target.len()));

        let top_one = service.feature_data(1);
        assert_eq!(top_one.top_features, vec!["EXT_SOURCE_1"]);
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let store = PopulationStore::from_reader("SK_ID_CURR,TARGET,DAYS_BIRTH,EXT_SOURCE_1\n1,0,1,2\n".as_bytes()).unwrap();
        let err = ScoringService::new(
            Box::new(sample_pipeline()),
            store,
            sample_ranking(),
            DescriptionCatalog::default(),
            DecisionThreshold::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ScoringError::ArtifactLoadFailure { .. }));
    }

    #[test]
    fn test_unknown_ranked_feature_rejected() {
        let ranking = FeatureRanking::from_reader("Feature,Importance\nAMT_CREDIT,1\n".as_bytes()).unwrap();
        let result = ScoringService::new(
            Box::new(sample_pipeline()),
            sample_store(),
            ranking,
            DescriptionCatalog::default(),
            DecisionThreshold::default(),
        );
        assert!(result.is_err());
    }
}
