//! The raw forecast record handed to the feature pipeline by an extractor.

use crate::transform::error::SchemaMismatch;
use crate::types::columns::catalogue_position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Location metadata reported alongside a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub utc_offset_seconds: f64,
}

/// Hourly samples keyed by variable name.
///
/// `date` holds one ISO-8601 timestamp per sample (the Open-Meteo `time` key is accepted
/// as an alias). Every other key is a numeric series; `null` samples become `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyData {
    #[serde(alias = "time")]
    pub date: Vec<String>,
    #[serde(flatten)]
    pub variables: BTreeMap<String, Vec<Option<f64>>>,
}

impl HourlyData {
    /// Variables in tabulation order: known Open-Meteo variables first, in catalogue
    /// order, followed by any other variables sorted by name.
    pub fn ordered_variables(&self) -> Vec<(&str, &[Option<f64>])> {
        let mut ordered: Vec<(&str, &[Option<f64>])> = self
            .variables
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
            .collect();
        // BTreeMap iteration is already lexical, so a stable sort keeps extras sorted by name.
        ordered.sort_by_key(|(name, _)| catalogue_position(name).unwrap_or(usize::MAX));
        ordered
    }
}

/// A single forecast window for one location: the input contract of the feature pipeline.
///
/// Usually deserialized from JSON with top-level `coordinates` and `hourly` keys:
///
/// ```rust
/// use forecast_features::RawForecast;
///
/// let json = r#"{
///     "coordinates": {"latitude": 52.52, "longitude": 13.41, "elevation": 38.0, "utc_offset_seconds": 3600.0},
///     "hourly": {"date": ["2025-03-01T00:00", "2025-03-01T01:00"], "temperature_2m": [4.2, null]}
/// }"#;
/// let record = RawForecast::from_json_str(json).unwrap();
/// assert_eq!(record.len(), 2);
/// assert_eq!(record.hourly.variables["temperature_2m"], vec![Some(4.2), None]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawForecast {
    pub coordinates: Coordinates,
    pub hourly: HourlyData,
}

impl RawForecast {
    pub fn new(
        coordinates: Coordinates,
        date: Vec<String>,
        variables: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Self {
        Self {
            coordinates,
            hourly: HourlyData { date, variables },
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Number of hourly samples (`N`).
    pub fn len(&self) -> usize {
        self.hourly.date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hourly.date.is_empty()
    }

    /// Checks the record's shape: at least one sample, every `required` variable present,
    /// and every variable exactly as long as `date`.
    ///
    /// Timestamp contents are checked later, when dates are normalized.
    pub fn validate<S: AsRef<str>>(&self, required: &[S]) -> Result<(), SchemaMismatch> {
        if self.is_empty() {
            return Err(SchemaMismatch::Empty);
        }
        for name in required {
            let name = name.as_ref();
            if !self.hourly.variables.contains_key(name) {
                return Err(SchemaMismatch::MissingVariable(name.to_string()));
            }
        }
        let expected = self.len();
        for (name, values) in &self.hourly.variables {
            if values.len() != expected {
                return Err(SchemaMismatch::LengthMismatch {
                    variable: name.clone(),
                    expected,
                    found: values.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(variables: &[(&str, Vec<Option<f64>>)]) -> RawForecast {
        RawForecast::new(
            Coordinates {
                latitude: 53.87,
                longitude: -1.91,
                elevation: 150.0,
                utc_offset_seconds: 0.0,
            },
            vec!["2025-01-01T00:00".to_string(), "2025-01-01T01:00".to_string()],
            variables
                .iter()
                .map(|(name, values)| (name.to_string(), values.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_deserializes_open_meteo_time_alias_and_nulls() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"{
            "coordinates": {"latitude": 1.0, "longitude": 2.0, "elevation": 3.0, "utc_offset_seconds": 0},
            "hourly": {"time": ["2025-01-01T00:00"], "visibility": [24140], "snow_depth": [null]}
        }"#;
        let record = RawForecast::from_json_str(json)?;
        assert_eq!(record.hourly.date, vec!["2025-01-01T00:00"]);
        assert_eq!(record.hourly.variables["visibility"], vec![Some(24140.0)]);
        assert_eq!(record.hourly.variables["snow_depth"], vec![None]);
        assert_eq!(record.coordinates.utc_offset_seconds, 0.0);
        Ok(())
    }

    #[test]
    fn test_validate_reports_missing_variable() {
        let record = record(&[("temperature_2m", vec![Some(1.0), Some(2.0)])]);
        assert_eq!(
            record.validate(&["temperature_2m", "visibility"]),
            Err(SchemaMismatch::MissingVariable("visibility".to_string()))
        );
    }

    #[test]
    fn test_validate_reports_length_mismatch() {
        let record = record(&[
            ("temperature_2m", vec![Some(1.0), Some(2.0)]),
            ("visibility", vec![Some(1.0)]),
        ]);
        assert_eq!(
            record.validate(&["temperature_2m"]),
            Err(SchemaMismatch::LengthMismatch {
                variable: "visibility".to_string(),
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_validate_rejects_empty_series() {
        let mut record = record(&[]);
        record.hourly.date.clear();
        assert_eq!(record.validate::<&str>(&[]), Err(SchemaMismatch::Empty));
    }

    #[test]
    fn test_orders_known_variables_before_extras() {
        let record = record(&[
            ("zeta_index", vec![None, None]),
            ("visibility", vec![None, None]),
            ("alpha_index", vec![None, None]),
            ("temperature_2m", vec![None, None]),
        ]);
        let names: Vec<&str> = record
            .hourly
            .ordered_variables()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec!["temperature_2m", "visibility", "alpha_index", "zeta_index"]
        );
    }
}
