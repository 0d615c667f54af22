//! Client population model

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::ScoringError;

/// Identifier column
pub const ID_COLUMN: &str = "SK_ID_CURR";
/// Ground-truth label column
pub const TARGET_COLUMN: &str = "TARGET";

const ARTIFACT: &str = "population snapshot";

/// One applicant row
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    pub id: i64,
    /// `None` for applicants without a known outcome
    pub target: Option<u8>,
    /// Values in `PopulationStore::feature_names` order; may be non-finite
    pub features: Vec<f64>,
}

/// Read-only applicant table keyed by identifier
#[derive(Debug, Clone)]
pub struct PopulationStore {
    feature_names: Vec<String>,
    records: Vec<ClientRecord>,
    index: HashMap<i64, usize>,
}

impl PopulationStore {
    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        tracing::info!("Loading population from: {}", path.display());
        let file = std::fs::File::open(path)
            .map_err(|e| ScoringError::artifact(format!("{} {}", ARTIFACT, path.display()), e))?;
        let store = Self::from_reader(file)?;
        tracing::info!("Population loaded: {} clients, {} features", store.len(), store.feature_names.len());
        Ok(store)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScoringError> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = rdr.headers().map_err(|e| ScoringError::artifact(ARTIFACT, e))?.clone();

        let id_pos = headers
            .iter()
            .position(|h| h == ID_COLUMN)
            .ok_or_else(|| ScoringError::artifact(ARTIFACT, format!("missing {} column", ID_COLUMN)))?;
        let target_pos = headers.iter().position(|h| h == TARGET_COLUMN);

        let feature_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != id_pos && Some(*i) != target_pos)
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut records = Vec::new();
        let mut index = HashMap::new();

        for (line, row) in rdr.records().enumerate() {
            let row = row.map_err(|e| ScoringError::artifact(ARTIFACT, e))?;
            let record = parse_row(&row, id_pos, target_pos, &feature_columns)
                .map_err(|reason| ScoringError::artifact(ARTIFACT, format!("row {}: {}", line + 1, reason)))?;

            if index.insert(record.id, records.len()).is_some() {
                return Err(ScoringError::artifact(ARTIFACT, format!("duplicate {} {}", ID_COLUMN, record.id)));
            }
            records.push(record);
        }

        Ok(Self {
            feature_names: feature_columns.into_iter().map(|(_, name)| name).collect(),
            records,
            index,
        })
    }

    /// Exact identifier match
    pub fn lookup(&self, client_id: i64) -> Result<&ClientRecord, ScoringError> {
        self.index
            .get(&client_id)
            .map(|&i| &self.records[i])
            .ok_or(ScoringError::ClientNotFound(client_id))
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_position(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Values of one feature across the population, snapshot order
    pub fn column(&self, position: usize) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(move |r| r.features[position])
    }

    /// Ground-truth labels aligned with `column`
    pub fn labels(&self) -> impl Iterator<Item = Option<u8>> + '_ {
        self.records.iter().map(|r| r.target)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn parse_row(
    row: &StringRecord,
    id_pos: usize,
    target_pos: Option<usize>,
    feature_columns: &[(usize, String)],
) -> Result<ClientRecord, String> {
    let field = |pos: usize| row.get(pos).unwrap_or("");

    let id = parse_id(field(id_pos))?;
    let target = match target_pos {
        Some(pos) => parse_target(field(pos))?,
        None => None,
    };
    let features = feature_columns
        .iter()
        .map(|(pos, name)| parse_value(field(*pos)).map_err(|_| format!("invalid {} value {:?}", name, field(*pos))))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ClientRecord { id, target, features })
}

fn parse_id(raw: &str) -> Result<i64, String> {
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(id);
    }
    // Pandas exports integer columns with gaps as floats ("100002.0")
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        _ => Err(format!("invalid {} {:?}", ID_COLUMN, raw)),
    }
}

fn parse_target(raw: &str) -> Result<Option<u8>, String> {
    match parse_value(raw) {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) if v == 0.0 => Ok(Some(0)),
        Ok(v) if v == 1.0 => Ok(Some(1)),
        _ => Err(format!("invalid {} {:?}", TARGET_COLUMN, raw)),
    }
}

/// Empty cells are missing; `nan`, `inf` and `-inf` parse as their IEEE values.
fn parse_value(raw: &str) -> Result<f64, std::num::ParseFloatError> {
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE_POPULATION: &str = "\
SK_ID_CURR,TARGET,EXT_SOURCE_1,DAYS_BIRTH
100002,1,0.083,-9461
100003,0,0.311,-16765
100004,,inf,-19046
346699,0,,-12000
";

    pub(crate) fn sample_store() -> PopulationStore {
        PopulationStore::from_reader(SAMPLE_POPULATION.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_and_lookup() {
        let store = sample_store();
        assert_eq!(store.len(), 4);
        assert_eq!(store.feature_names(), &["EXT_SOURCE_1".to_string(), "DAYS_BIRTH".to_string()]);

        let client = store.lookup(100003).unwrap();
        assert_eq!(client.target, Some(0));
        assert_eq!(client.features, vec![0.311, -16765.0]);
    }

    #[test]
    fn test_unknown_client() {
        let store = sample_store();
        assert_eq!(store.lookup(999999999), Err(ScoringError::ClientNotFound(999999999)));
    }

    #[test]
    fn test_missing_values_are_kept_as_data() {
        let store = sample_store();
        let client = store.lookup(100004).unwrap();
        assert_eq!(client.target, None);
        assert_eq!(client.features[0], f64::INFINITY);
        assert!(store.lookup(346699).unwrap().features[0].is_nan());
    }

    #[test]
    fn test_column_and_labels_are_aligned() {
        let store = sample_store();
        let position = store.feature_position("DAYS_BIRTH").unwrap();
        let column: Vec<f64> = store.column(position).collect();
        let labels: Vec<Option<u8>> = store.labels().collect();
        assert_eq!(column, vec![-9461.0, -16765.0, -19046.0, -12000.0]);
        assert_eq!(labels, vec![Some(1), Some(0), None, Some(0)]);
        assert_eq!(store.feature_position("UNKNOWN"), None);
    }

    #[test]
    fn test_float_formatted_ids() {
        let csv = "SK_ID_CURR,TARGET,A\n100002.0,1.0,1\n";
        let store = PopulationStore::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(store.lookup(100002).unwrap().target, Some(1));
    }

    #[test]
    fn test_target_column_is_optional() {
        let csv = "SK_ID_CURR,A,B\n1,0.5,2\n";
        let store = PopulationStore::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(store.feature_names().len(), 2);
        assert_eq!(store.lookup(1).unwrap().target, None);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let csv = "SK_ID_CURR,TARGET,A\n1,0,1\n1,1,2\n";
        let err = PopulationStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_bad_cells_rejected() {
        assert!(PopulationStore::from_reader("A,B\n1,2\n".as_bytes()).is_err());
        assert!(PopulationStore::from_reader("SK_ID_CURR,TARGET,A\n1,2,0\n".as_bytes()).is_err());
        assert!(PopulationStore::from_reader("SK_ID_CURR,TARGET,A\n1,0,abc\n".as_bytes()).is_err());
    }
}
