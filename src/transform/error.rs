use polars::error::PolarsError;
use std::fmt;
use thiserror::Error;

/// Identifies a step of the feature pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Tabulation,
    DateNormalization,
    Rounding,
    TemperatureAverage,
    HumidityAverage,
    TemperatureDelta,
    DayNight,
    ComfortComparison,
    WindDirection,
    WindRisk,
    PrecipitationFlags,
    ComfortIndex,
    VisibilityNormalization,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Tabulation => "tabulation",
            Stage::DateNormalization => "date_normalization",
            Stage::Rounding => "rounding",
            Stage::TemperatureAverage => "temperature_average",
            Stage::HumidityAverage => "humidity_average",
            Stage::TemperatureDelta => "temperature_delta",
            Stage::DayNight => "day_night",
            Stage::ComfortComparison => "comfort_comparison",
            Stage::WindDirection => "wind_direction",
            Stage::WindRisk => "wind_risk",
            Stage::PrecipitationFlags => "precipitation_flags",
            Stage::ComfortIndex => "comfort_index",
            Stage::VisibilityNormalization => "visibility_normalization",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ways a raw record can disagree with the shape the pipeline expects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaMismatch {
    #[error("hourly series is empty")]
    Empty,

    #[error("required hourly variable '{0}' is missing")]
    MissingVariable(String),

    #[error("hourly variable '{variable}' has {found} samples, expected {expected}")]
    LengthMismatch {
        variable: String,
        expected: usize,
        found: usize,
    },
}

/// Failure raised inside a single stage. The pipeline lifts it into a [`TransformError`],
/// attaching the stage identity where the failure has no dedicated variant.
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error("cannot parse timestamp '{value}' at row {row}")]
    MalformedTimestamp { row: usize, value: String },

    #[error("timestamps must increase by a fixed interval of {expected_seconds}s; row {row} is {found_seconds}s after its predecessor")]
    IrregularInterval {
        row: usize,
        expected_seconds: i64,
        found_seconds: i64,
    },

    #[error("column '{column}' has no range to normalize over")]
    DegenerateSeries { column: String },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Malformed timestamp '{value}' at row {row}")]
    MalformedTimestamp { row: usize, value: String },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatch),

    #[error("Column '{column}' is constant across the series; cannot normalize")]
    DegenerateSeries { column: String },

    #[error("Stage '{stage}' failed")]
    StageFailed {
        stage: Stage,
        #[source]
        source: StageFailure,
    },

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl TransformError {
    pub(crate) fn from_stage(stage: Stage, failure: StageFailure) -> Self {
        match failure {
            StageFailure::MalformedTimestamp { row, value } => {
                TransformError::MalformedTimestamp { row, value }
            }
            StageFailure::DegenerateSeries { column } => TransformError::DegenerateSeries { column },
            source => TransformError::StageFailed { stage, source },
        }
    }

    /// The stage a wrapped failure came from, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            TransformError::StageFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
