//! The feature pipeline: validation followed by the fixed sequence of stages.

use crate::frames::enriched_frame::EnrichedFrame;
use crate::transform::config::PipelineConfig;
use crate::transform::error::{Stage, TransformError};
use crate::transform::stages::{self, StageResult};
use crate::types::columns::{FEATURE_INPUTS, RELATIVE_HUMIDITY_2M, TEMPERATURE_2M};
use crate::types::raw_forecast::RawForecast;
use polars::prelude::DataFrame;

/// Stages applied to the tabulated frame, in order.
const FRAME_STAGES: [Stage; 12] = [
    Stage::DateNormalization,
    Stage::Rounding,
    Stage::TemperatureAverage,
    Stage::HumidityAverage,
    Stage::TemperatureDelta,
    Stage::DayNight,
    Stage::ComfortComparison,
    Stage::WindDirection,
    Stage::WindRisk,
    Stage::PrecipitationFlags,
    Stage::ComfortIndex,
    Stage::VisibilityNormalization,
];

/// Deterministically maps a [`RawForecast`] to its enriched hourly table.
///
/// The pipeline holds only configuration, so one instance can process any number of
/// records; each [`FeaturePipeline::run`] works on its own table and either returns the
/// complete result or an error, never a partial table.
///
/// # Examples
///
/// ```rust
/// use forecast_features::{FeaturePipeline, PipelineConfig};
///
/// let pipeline = FeaturePipeline::new(PipelineConfig::default()).unwrap();
/// assert_eq!(pipeline.required_variables().len(), 17);
/// ```
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl FeaturePipeline {
    /// Creates a pipeline, rejecting configurations no record could satisfy
    /// (zero-length windows, unnamed or absurdly precise rounding rules).
    pub fn new(config: PipelineConfig) -> Result<Self, TransformError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Hourly variables a record must carry: every stage input plus every rounded column.
    pub fn required_variables(&self) -> Vec<String> {
        let mut required: Vec<String> = FEATURE_INPUTS.iter().map(|v| v.to_string()).collect();
        for rule in self.config.rounding_rules() {
            if !required.contains(&rule.column) {
                required.push(rule.column);
            }
        }
        required
    }

    /// Runs every stage over `record`.
    ///
    /// # Errors
    ///
    /// * [`TransformError::SchemaMismatch`] if the record is empty, lacks a required variable
    ///   or has series of differing lengths.
    /// * [`TransformError::MalformedTimestamp`] if a `date` entry cannot be parsed.
    /// * [`TransformError::DegenerateSeries`] if visibility is constant over the window.
    /// * [`TransformError::StageFailed`] for any other failure, tagged with its stage.
    pub fn run(&self, record: &RawForecast) -> Result<EnrichedFrame, TransformError> {
        record.validate(&self.required_variables())?;

        let mut frame = stages::tabulate(record)
            .map_err(|failure| TransformError::from_stage(Stage::Tabulation, failure))?;
        for stage in FRAME_STAGES {
            frame = self
                .apply(stage, frame)
                .map_err(|failure| TransformError::from_stage(stage, failure))?;
        }

        Ok(EnrichedFrame::new(
            frame,
            self.config.temperature_average_column(),
            self.config.humidity_average_column(),
        ))
    }

    fn apply(&self, stage: Stage, frame: DataFrame) -> StageResult {
        match stage {
            // Already applied by `run` when the record became a frame.
            Stage::Tabulation => Ok(frame),
            Stage::DateNormalization => stages::normalize_dates(frame),
            Stage::Rounding => stages::round_columns(frame, &self.config.rounding_rules()),
            Stage::TemperatureAverage => stages::rolling_average(
                frame,
                TEMPERATURE_2M,
                &self.config.temperature_average_column(),
                self.config.temp_window,
            ),
            Stage::HumidityAverage => stages::rolling_average(
                frame,
                RELATIVE_HUMIDITY_2M,
                &self.config.humidity_average_column(),
                self.config.humidity_window,
            ),
            Stage::TemperatureDelta => stages::temperature_delta(frame),
            Stage::DayNight => stages::day_night_flags(frame),
            Stage::ComfortComparison => stages::comfort_comparison(frame),
            Stage::WindDirection => stages::wind_direction_bucket(frame),
            Stage::WindRisk => stages::wind_risk_index(frame),
            Stage::PrecipitationFlags => stages::precipitation_flags(frame),
            Stage::ComfortIndex => stages::comfort_index_column(frame),
            Stage::VisibilityNormalization => stages::normalize_visibility(frame),
        }
    }
}
