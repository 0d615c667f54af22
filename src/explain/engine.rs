use super::tree_shap;
use super::types::{ExplainResult, FeatureContribution};
use crate::classifier::tree::{sigmoid, TreeEnsemble};
use crate::error::ScoringError;

/// Margin deltas below this use the logistic slope instead of the secant.
const MIN_MARGIN_DELTA: f64 = 1e-12;

/// Attribute the ensemble's default probability at `input` to its features.
///
/// `feature_names` must equal the ensemble schema (same names, same order)
/// and `input` is the vector after the model's preprocessing. Contributions
/// are TreeSHAP values computed on the log-odds margin and rescaled onto the
/// probability scale, so they sum to `probability - expected_value`.
pub fn explain(
    ensemble: &TreeEnsemble,
    feature_names: &[String],
    input: &[f64],
) -> Result<ExplainResult, ScoringError> {
    check_schema(ensemble, feature_names, input)?;

    let mut phi = vec![0.0; input.len()];
    for tree in &ensemble.trees {
        tree_shap::accumulate(tree, input, &mut phi);
    }

    let margin = ensemble.margin(input);
    let expected_margin = ensemble.expected_margin();
    let probability = sigmoid(margin);
    let expected_value = sigmoid(expected_margin);

    let margin_delta = margin - expected_margin;
    let scale = if margin_delta.abs() > MIN_MARGIN_DELTA {
        (probability - expected_value) / margin_delta
    } else {
        probability * (1.0 - probability)
    };

    let contributions = feature_names
        .iter()
        .zip(phi)
        .map(|(name, value)| FeatureContribution {
            name: name.clone(),
            contribution: value * scale,
        })
        .collect();

    Ok(ExplainResult {
        expected_value,
        probability,
        contributions,
    })
}

fn check_schema(ensemble: &TreeEnsemble, feature_names: &[String], input: &[f64]) -> Result<(), ScoringError> {
    let expected = &ensemble.feature_names;
    if feature_names.len() != expected.len() || input.len() != expected.len() {
        return Err(ScoringError::mismatch(
            format!("{} features", expected.len()),
            format!("{} names and {} values", feature_names.len(), input.len()),
        ));
    }
    if let Some((position, (want, got))) = expected
        .iter()
        .zip(feature_names)
        .enumerate()
        .find(|(_, (want, got))| want != got)
    {
        return Err(ScoringError::mismatch(
            format!("{} at position {}", want, position),
            got,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::pipeline::tests::sample_pipeline;
    use crate::classifier::{Classifier, TreeClassifier};

    fn names() -> Vec<String> {
        vec!["EXT_SOURCE_1".to_string(), "DAYS_BIRTH".to_string()]
    }

    #[test]
    fn test_contributions_sum_to_probability_shift() {
        let pipeline = sample_pipeline();
        let vectors = [
            [0.25, -20000.0],
            [0.9, -9000.0],
            [f64::NAN, -15000.0],
            [0.1, f64::INFINITY],
        ];
        for raw in vectors {
            let input = pipeline.ensemble_input(&raw).unwrap();
            let result = explain(pipeline.ensemble(), &names(), &input).unwrap();
            let probability = pipeline.predict_probability(&raw).unwrap();

            assert_eq!(result.probability, probability);
            assert_eq!(result.contributions.len(), 2);
            assert!(
                (result.total() - (probability - result.expected_value)).abs() < 1e-9,
                "raw = {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_expected_value_is_logistic_of_mean_margin() {
        let pipeline = sample_pipeline();
        let input = pipeline.ensemble_input(&[0.25, -20000.0]).unwrap();
        let result = explain(pipeline.ensemble(), &names(), &input).unwrap();
        // tree 1: 0.4*0.8 + 0.6*-0.6 = -0.04; tree 2: 0.2*0.9 + 0.3*0.1 + 0.5*-0.3 = 0.06
        let expected = sigmoid(-1.0 - 0.04 + 0.06);
        assert!((result.expected_value - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sign_follows_risk() {
        let pipeline = sample_pipeline();
        // Low EXT_SOURCE_1 lands on the +0.8 leaf: pushes toward default
        let input = pipeline.ensemble_input(&[0.25, -9000.0]).unwrap();
        let result = explain(pipeline.ensemble(), &names(), &input).unwrap();
        assert_eq!(result.contributions[0].name, "EXT_SOURCE_1");
        assert!(result.contributions[0].contribution > 0.0);
    }

    #[test]
    fn test_bitwise_reproducible() {
        let pipeline = sample_pipeline();
        let input = pipeline.ensemble_input(&[0.3, -12000.0]).unwrap();
        let first = explain(pipeline.ensemble(), &names(), &input).unwrap();
        let second = explain(pipeline.ensemble(), &names(), &input).unwrap();
        for (a, b) in first.contributions.iter().zip(&second.contributions) {
            assert_eq!(a.contribution.to_bits(), b.contribution.to_bits());
        }
    }

    #[test]
    fn test_wrong_length_is_mismatch() {
        let pipeline = sample_pipeline();
        let err = explain(pipeline.ensemble(), &names(), &[0.0]).unwrap_err();
        assert!(matches!(err, ScoringError::AttributionInputMismatch { .. }));
    }

    #[test]
    fn test_wrong_order_is_mismatch() {
        let pipeline = sample_pipeline();
        let reordered = vec!["DAYS_BIRTH".to_string(), "EXT_SOURCE_1".to_string()];
        let err = explain(pipeline.ensemble(), &reordered, &[0.0, 0.0]).unwrap_err();
        match err {
            ScoringError::AttributionInputMismatch { expected, actual } => {
                assert_eq!(expected, "EXT_SOURCE_1 at position 0");
                assert_eq!(actual, "DAYS_BIRTH");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
