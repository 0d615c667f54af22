//! Global feature importance ranking

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

pub const DEFAULT_TOP_N: usize = 10;

const ARTIFACT: &str = "feature importance table";

/// One row of the ranking, serialized with the table's own column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportanceEntry {
    #[serde(rename = "Feature")]
    pub feature: String,
    #[serde(rename = "Importance")]
    pub importance: f64,
}

/// Entries ordered by descending importance
#[derive(Debug, Clone)]
pub struct FeatureRanking {
    entries: Vec<FeatureImportanceEntry>,
}

impl FeatureRanking {
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        tracing::info!("Loading feature importance from: {}", path.display());
        let file = std::fs::File::open(path)
            .map_err(|e| ScoringError::artifact(format!("{} {}", ARTIFACT, path.display()), e))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScoringError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let entries = rdr
            .deserialize()
            .collect::<Result<Vec<FeatureImportanceEntry>, _>>()
            .map_err(|e| ScoringError::artifact(ARTIFACT, e))?;

        Self::new(entries)
    }

    /// Sorts descending; ties keep their input order.
    pub fn new(mut entries: Vec<FeatureImportanceEntry>) -> Result<Self, ScoringError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !entry.importance.is_finite() {
                return Err(ScoringError::artifact(ARTIFACT, format!("non-finite importance for {}", entry.feature)));
            }
            if !seen.insert(entry.feature.as_str()) {
                return Err(ScoringError::artifact(ARTIFACT, format!("duplicate feature {}", entry.feature)));
            }
        }

        entries.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        Ok(Self { entries })
    }

    /// First `min(n, len)` entries
    pub fn top_n(&self, n: usize) -> &[FeatureImportanceEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn top_names(&self, n: usize) -> Vec<&str> {
        self.top_n(n).iter().map(|e| e.feature.as_str()).collect()
    }

    pub fn entries(&self) -> &[FeatureImportanceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
