//! Configuration module

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::classifier::threshold::DEFAULT_THRESHOLD;
use crate::models::ranking::DEFAULT_TOP_N;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Trained pipeline artifact (JSON)
    pub model_path: PathBuf,

    /// Client population snapshot (CSV)
    pub population_path: PathBuf,

    /// Global feature importance ranking (CSV)
    pub feature_importance_path: PathBuf,

    /// Feature descriptions (CSV, ISO-8859-1)
    pub column_description_path: PathBuf,

    /// Probability at or above which credit is denied
    pub decision_threshold: f64,

    /// Default size of the top-N feature slice
    pub top_n: usize,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. A variable that is set but does not
    /// parse is an error, never a silent fallback to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let path = |key: &str, default: &str| -> PathBuf {
            lookup(key).unwrap_or_else(|| default.to_string()).into()
        };

        Ok(Self {
            port: parse_var(&lookup, "PORT", 8000)?,
            model_path: path("MODEL_PATH", "model/model.json"),
            population_path: path("POPULATION_PATH", "data/sample_client_api.csv"),
            feature_importance_path: path("FEATURE_IMPORTANCE_PATH", "data/feature_importance.csv"),
            column_description_path: path(
                "COLUMN_DESCRIPTION_PATH",
                "data/HomeCredit_columns_description.csv",
            ),
            decision_threshold: parse_var(&lookup, "DECISION_THRESHOLD", DEFAULT_THRESHOLD)?,
            top_n: parse_var(&lookup, "TOP_N", DEFAULT_TOP_N)?,
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        })
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(format!(
                "DECISION_THRESHOLD must be within [0, 1], got {}",
                self.decision_threshold
            ));
        }
        if self.top_n == 0 {
            return Err("TOP_N must be at least 1".to_string());
        }
        Ok(())
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, String> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} has an invalid value: {:?}", key, raw)),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            model_path: "model/model.json".into(),
            population_path: "data/sample_client_api.csv".into(),
            feature_importance_path: "data/feature_importance.csv".into(),
            column_description_path: "data/HomeCredit_columns_description.csv".into(),
            decision_threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
            environment: "development".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_unset_vars_use_defaults() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.decision_threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.top_n, DEFAULT_TOP_N);
        assert_eq!(config.model_path, PathBuf::from("model/model.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_vars_override_defaults() {
        let config = from_vars(&[
            ("DECISION_THRESHOLD", "0.42"),
            ("TOP_N", " 15 "),
            ("ENVIRONMENT", "production"),
        ])
        .unwrap();
        assert_eq!(config.decision_threshold, 0.42);
        assert_eq!(config.top_n, 15);
        assert!(config.is_production());
    }

    #[test]
    fn test_malformed_threshold_is_rejected() {
        let err = from_vars(&[("DECISION_THRESHOLD", "0,40")]).unwrap_err();
        assert!(err.contains("DECISION_THRESHOLD"));
        assert!(from_vars(&[("DECISION_THRESHOLD", "")]).is_err());
    }

    #[test]
    fn test_malformed_top_n_is_rejected() {
        assert!(from_vars(&[("TOP_N", "ten")]).is_err());
        assert!(from_vars(&[("TOP_N", "-3")]).is_err());
        assert!(from_vars(&[("PORT", "http")]).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.decision_threshold, 0.36);
        assert_eq!(config.top_n, 10);
        assert!(config.validate().is_ok());
        assert!(!config.is_production());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = Config {
            decision_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            decision_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let config = Config {
            top_n: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
