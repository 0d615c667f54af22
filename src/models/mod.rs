//! Data models

pub mod client;
pub mod description;
pub mod ranking;
pub mod score;

pub use client::{ClientRecord, PopulationStore};
pub use description::{DescriptionCatalog, FeatureDescription};
pub use ranking::{FeatureImportanceEntry, FeatureRanking};
pub use score::{finite_or_none, ClientScoreResponse, FeatureValues, OrderedMap, ScoreResult};
