//! Configuration of the feature pipeline.

use crate::transform::error::TransformError;
use crate::types::columns::{self, DEFAULT_ROUNDED_COLUMNS};
use bon::Builder;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMP_WINDOW: usize = 3;
pub const DEFAULT_HUMIDITY_WINDOW: usize = 6;
pub const DEFAULT_ROUND_PRECISION: u32 = 1;

// Beyond this many decimals scaling by 10^p stops being exact for typical magnitudes.
const MAX_PRECISION: u32 = 15;

/// Rounds `column` to `precision` decimals during the rounding stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingRule {
    pub column: String,
    pub precision: u32,
}

impl RoundingRule {
    pub fn new(column: impl Into<String>, precision: u32) -> Self {
        Self {
            column: column.into(),
            precision,
        }
    }
}

/// Tunable parameters of [`crate::FeaturePipeline`].
///
/// Build one with the builder, or deserialize it from JSON; missing keys fall back to
/// the defaults (3 hour temperature window, 6 hour humidity window, 1 decimal rounding).
///
/// ```rust
/// use forecast_features::PipelineConfig;
///
/// let config = PipelineConfig::builder().temp_window(4).build();
/// assert_eq!(config.temp_window, 4);
/// assert_eq!(config.humidity_window, 6);
///
/// let from_json = PipelineConfig::from_json_str(r#"{"round_precision": 2}"#).unwrap();
/// assert_eq!(from_json.round_precision, 2);
/// assert_eq!(from_json.temp_window, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct PipelineConfig {
    /// Trailing window, in rows, of `temp_{h}_hour_average`.
    #[serde(default = "default_temp_window")]
    #[builder(default = DEFAULT_TEMP_WINDOW)]
    pub temp_window: usize,

    /// Trailing window, in rows, of `humidity_{h}_hour_average`.
    #[serde(default = "default_humidity_window")]
    #[builder(default = DEFAULT_HUMIDITY_WINDOW)]
    pub humidity_window: usize,

    /// Decimals kept by the default rounding rules.
    #[serde(default = "default_round_precision")]
    #[builder(default = DEFAULT_ROUND_PRECISION)]
    pub round_precision: u32,

    /// Explicit `(column, precision)` rules replacing the default rounding set.
    #[serde(default)]
    pub rounded_columns: Option<Vec<RoundingRule>>,
}

fn default_temp_window() -> usize {
    DEFAULT_TEMP_WINDOW
}

fn default_humidity_window() -> usize {
    DEFAULT_HUMIDITY_WINDOW
}

fn default_round_precision() -> u32 {
    DEFAULT_ROUND_PRECISION
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The effective rounding rules: the explicit list if one was given, otherwise every
    /// default continuous column at `round_precision`.
    pub fn rounding_rules(&self) -> Vec<RoundingRule> {
        match &self.rounded_columns {
            Some(rules) => rules.clone(),
            None => DEFAULT_ROUNDED_COLUMNS
                .iter()
                .map(|column| RoundingRule::new(*column, self.round_precision))
                .collect(),
        }
    }

    pub fn temperature_average_column(&self) -> String {
        columns::temperature_average(self.temp_window)
    }

    pub fn humidity_average_column(&self) -> String {
        columns::humidity_average(self.humidity_window)
    }

    pub(crate) fn validate(&self) -> Result<(), TransformError> {
        if self.temp_window == 0 {
            return Err(TransformError::InvalidConfig(
                "temp_window must be at least 1".to_string(),
            ));
        }
        if self.humidity_window == 0 {
            return Err(TransformError::InvalidConfig(
                "humidity_window must be at least 1".to_string(),
            ));
        }
        for rule in self.rounding_rules() {
            if rule.column.is_empty() {
                return Err(TransformError::InvalidConfig(
                    "rounding rule without a column name".to_string(),
                ));
            }
            if rule.precision > MAX_PRECISION {
                return Err(TransformError::InvalidConfig(format!(
                    "precision {} for '{}' exceeds {}",
                    rule.precision, rule.column, MAX_PRECISION
                )));
            }
        }
        Ok(())
    }
}
