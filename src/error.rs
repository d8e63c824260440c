use crate::extract::error::ExtractError;
use crate::sink::error::SinkError;
use crate::transform::error::TransformError;
use polars::error::PolarsError;
use thiserror::Error;

/// Any failure of an end-to-end run.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
