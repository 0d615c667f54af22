//! Feature description catalog

use std::path::Path;

use serde::Serialize;

use crate::error::ScoringError;

const ARTIFACT: &str = "column descriptions";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDescription {
    #[serde(rename = "Row")]
    pub row: String,
    #[serde(rename = "Description")]
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct DescriptionCatalog {
    entries: Vec<FeatureDescription>,
}

impl DescriptionCatalog {
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        tracing::info!("Loading column descriptions from: {}", path.display());
        let bytes = std::fs::read(path)
            .map_err(|e| ScoringError::artifact(format!("{} {}", ARTIFACT, path.display()), e))?;
        Self::from_latin1(&bytes)
    }

    /// The export is ISO-8859-1, where every byte is its own code point.
    pub fn from_latin1(bytes: &[u8]) -> Result<Self, ScoringError> {
        let text: String = bytes.iter().map(|&b| char::from(b)).collect();
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ScoringError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = rdr.headers().map_err(|e| ScoringError::artifact(ARTIFACT, e))?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ScoringError::artifact(ARTIFACT, format!("missing {} column", name)))
        };
        let row_pos = column("Row")?;
        let description_pos = column("Description")?;

        let mut entries = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| ScoringError::artifact(ARTIFACT, e))?;
            let row = record.get(row_pos).unwrap_or("");
            let description = record.get(description_pos).unwrap_or("");
            // Incomplete rows are dropped, not rejected
            if row.is_empty() || description.is_empty() {
                continue;
            }
            entries.push(FeatureDescription {
                row: row.to_string(),
                description: description.to_string(),
            });
        }

        tracing::debug!("Loaded {} column descriptions", entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[FeatureDescription] {
        &self.entries
    }
}
