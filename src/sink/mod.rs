//! Destinations for enriched frames.
//!
//! A sink appends every row of a frame to its named table. Re-running a forecast appends
//! again; sinks never deduplicate or upsert.

pub mod error;
pub mod parquet;
pub mod sqlite;

use crate::frames::enriched_frame::EnrichedFrame;
use crate::sink::error::SinkError;

/// Default table name for loaded forecasts.
pub const DEFAULT_TABLE: &str = "weather";

pub trait Sink {
    /// Appends all rows of `frame`, returning the number of rows written.
    ///
    /// Either every row is written or none is.
    fn append(&mut self, frame: &EnrichedFrame) -> Result<usize, SinkError>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn append(&mut self, frame: &EnrichedFrame) -> Result<usize, SinkError> {
        (**self).append(frame)
    }
}
