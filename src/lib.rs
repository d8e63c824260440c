mod error;
mod extract;
mod frames;
mod sink;
mod transform;
mod types;
mod utils;
mod weather_pipeline;

#[cfg(test)]
mod test_support;

pub use error::ForecastError;
pub use weather_pipeline::*;

pub use extract::error::ExtractError;
pub use extract::open_meteo::*;

pub use frames::daily_frame::*;
pub use frames::enriched_frame::*;

pub use sink::error::SinkError;
pub use sink::parquet::ParquetSink;
pub use sink::sqlite::SqliteSink;
pub use sink::{Sink, DEFAULT_TABLE};

pub use transform::config::*;
pub use transform::error::{SchemaMismatch, Stage, StageFailure, TransformError};
pub use transform::features;
pub use transform::pipeline::FeaturePipeline;
pub use transform::stages::parse_timestamp;

pub use types::columns;
pub use types::compass::CompassDirection;
pub use types::raw_forecast::{Coordinates, HourlyData, RawForecast};
pub use types::rows::{DailyRollup, EnrichedRow};
