//! The end-to-end run: extract a forecast, derive its features and load the result.

use crate::error::ForecastError;
use crate::extract::open_meteo::OpenMeteoExtractor;
use crate::frames::enriched_frame::EnrichedFrame;
use crate::sink::Sink;
use crate::transform::config::PipelineConfig;
use crate::transform::error::TransformError;
use crate::transform::pipeline::FeaturePipeline;
use crate::types::columns::DATE;
use crate::types::raw_forecast::RawForecast;
use bon::bon;
use chrono::NaiveDateTime;
use log::{error, info};

/// What a run loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub rows_loaded: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
}

impl RunSummary {
    fn new(frame: &EnrichedFrame, rows_loaded: usize) -> Result<Self, ForecastError> {
        let dates = frame.frame.column(DATE)?.datetime()?;
        Ok(Self {
            rows_loaded,
            first_timestamp: dates.as_datetime_iter().flatten().next(),
            last_timestamp: dates.as_datetime_iter().flatten().last(),
        })
    }
}

/// Extracts a forecast, runs the feature pipeline over it and appends the result to a sink.
///
/// A failure at any step aborts the run before anything is loaded.
///
/// # Examples
///
/// ```no_run
/// use forecast_features::{SqliteSink, WeatherPipeline};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = SqliteSink::open("db/weather.db", "weather")?;
/// let mut pipeline = WeatherPipeline::builder().sink(sink).build()?;
/// let summary = pipeline.run().await?;
/// println!("loaded {} rows", summary.rows_loaded);
/// # Ok(())
/// # }
/// ```
pub struct WeatherPipeline<S: Sink> {
    extractor: OpenMeteoExtractor,
    features: FeaturePipeline,
    sink: S,
}

#[bon]
impl<S: Sink> WeatherPipeline<S> {
    /// Assembles a run. The extractor and configuration default to
    /// [`OpenMeteoExtractor::default`] and [`PipelineConfig::default`].
    #[builder]
    pub fn new(
        sink: S,
        #[builder(default)] extractor: OpenMeteoExtractor,
        #[builder(default)] config: PipelineConfig,
    ) -> Result<Self, TransformError> {
        Ok(Self {
            extractor,
            features: FeaturePipeline::new(config)?,
            sink,
        })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Fetches the forecast and loads its enriched rows.
    pub async fn run(&mut self) -> Result<RunSummary, ForecastError> {
        info!("Extracting forecast");
        let record = self.extractor.extract().await.inspect_err(|e| {
            error!("Extraction failed: {}", e);
        })?;
        self.run_with(&record)
    }

    /// Loads the enriched rows of an already extracted `record`.
    pub fn run_with(&mut self, record: &RawForecast) -> Result<RunSummary, ForecastError> {
        info!("Transforming {} hourly samples", record.len());
        let frame = self.features.run(record).inspect_err(|e| {
            error!("Feature pipeline failed: {}", e);
        })?;

        let rows_loaded = self.sink.append(&frame).inspect_err(|e| {
            error!("Loading failed: {}", e);
        })?;
        let summary = RunSummary::new(&frame, rows_loaded)?;
        info!(
            "Loaded {} rows covering {:?} to {:?}",
            summary.rows_loaded, summary.first_timestamp, summary.last_timestamp
        );
        Ok(summary)
    }
}
