//! Decision Threshold
//!
//! Turns a default probability into a credit decision.
//! The cutoff is a business parameter loaded from configuration.

use serde::{Deserialize, Serialize};

/// Cutoff chosen to balance false approvals against false denials
pub const DEFAULT_THRESHOLD: f64 = 0.36;

/// Credit decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    /// Label shown to loan officers on the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Approved => "Crédit accordé",
            Decision::Denied => "Crédit non accordé",
        }
    }
}

/// Threshold configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThreshold {
    /// Probability at or above which credit is denied (0.0 - 1.0)
    pub threshold: f64,
}

impl Default for DecisionThreshold {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl DecisionThreshold {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn decide(&self, probability: f64) -> Decision {
        decide(probability, self.threshold)
    }
}

/// `probability < threshold` approves, anything else denies.
pub fn decide(probability: f64, threshold: f64) -> Decision {
    if probability < threshold {
        Decision::Approved
    } else {
        Decision::Denied
    }
}
