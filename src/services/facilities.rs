use crate::core::filters::{is_qualifying, QualifyingTypes};
use crate::models::FacilityRecord;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading the facility dataset
#[derive(Debug, Error)]
pub enum FacilityError {
    #[error("Failed to read facility dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Facility dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported facility dataset layout: {0}")]
    InvalidFormat(String),

    #[error("Malformed facility record #{index} ({name}): {reason}")]
    MalformedRecord {
        index: usize,
        name: String,
        reason: String,
    },
}

/// Read-only facility dataset
///
/// Every record held by the store has a valid coordinate. Records that fail
/// validation are dropped at load time and counted in [`FacilityStore::skipped`].
#[derive(Debug, Clone, Default)]
pub struct FacilityStore {
    records: Vec<FacilityRecord>,
    skipped: usize,
}

impl FacilityStore {
    /// Build a store from already-parsed records, dropping malformed ones
    pub fn new(records: Vec<FacilityRecord>) -> Self {
        let mut store = Self::default();
        for (index, record) in records.into_iter().enumerate() {
            store.push(index, record);
        }
        store
    }

    /// Load the dataset from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FacilityError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| FacilityError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let store = Self::from_json(&contents)?;

        tracing::info!(
            "Loaded {} facilities from {} ({} skipped)",
            store.len(),
            path.display(),
            store.skipped
        );

        Ok(store)
    }

    /// Parse a dataset from JSON
    ///
    /// Accepts a GeoJSON `FeatureCollection`, an array of features carrying a
    /// `properties` object, or an array of bare property objects.
    pub fn from_json(json: &str) -> Result<Self, FacilityError> {
        let value: Value = serde_json::from_str(json)?;

        let entries = match value {
            Value::Array(entries) => entries,
            Value::Object(mut object) => match object.remove("features") {
                Some(Value::Array(features)) => features,
                _ => {
                    return Err(FacilityError::InvalidFormat(
                        "expected an array or a FeatureCollection with a features array".into(),
                    ))
                }
            },
            _ => {
                return Err(FacilityError::InvalidFormat(
                    "expected an array or a FeatureCollection".into(),
                ))
            }
        };

        let mut store = Self::default();
        for (index, mut entry) in entries.into_iter().enumerate() {
            let properties = if entry.get("properties").is_some() {
                entry["properties"].take()
            } else {
                entry
            };

            let name = properties
                .get("STA_NAME")
                .and_then(Value::as_str)
                .unwrap_or("unnamed")
                .to_string();

            match serde_json::from_value::<FacilityRecord>(properties) {
                Ok(record) => store.push(index, record),
                Err(e) => store.skip(FacilityError::MalformedRecord {
                    index,
                    name,
                    reason: e.to_string(),
                }),
            }
        }

        Ok(store)
    }

    fn push(&mut self, index: usize, record: FacilityRecord) {
        if record.coordinate().is_some() {
            self.records.push(record);
        } else {
            let reason = match (record.latitude, record.longitude) {
                (Some(lat), Some(lon)) => format!("coordinate out of range ({}, {})", lat, lon),
                _ => "missing G_LAT/G_LON".to_string(),
            };
            self.skip(FacilityError::MalformedRecord {
                index,
                name: record.name,
                reason,
            });
        }
    }

    fn skip(&mut self, diagnostic: FacilityError) {
        tracing::warn!("Skipping facility: {}", diagnostic);
        self.skipped += 1;
    }

    pub fn records(&self) -> &[FacilityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records dropped as malformed
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Records whose service type is in the qualifying set
    pub fn qualifying<'a>(
        &'a self,
        qualifying: &'a QualifyingTypes,
    ) -> impl Iterator<Item = &'a FacilityRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| is_qualifying(record, qualifying))
    }
}
