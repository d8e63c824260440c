use forecast_features::{
    ForecastError, OpenMeteoExtractor, PipelineConfig, SqliteSink, WeatherPipeline, DEFAULT_TABLE,
};
use std::env;

#[tokio::main]
async fn main() -> Result<(), ForecastError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    configure_polars_display();

    let extractor = OpenMeteoExtractor::builder()
        .latitude(52.52)
        .longitude(13.41)
        .days_ahead(1)
        .build();
    let sink = SqliteSink::open("db/weather.db", DEFAULT_TABLE)?;

    let mut pipeline = WeatherPipeline::builder()
        .sink(sink)
        .extractor(extractor)
        .config(PipelineConfig::default())
        .build()?;
    let summary = pipeline.run().await?;

    println!("{:#?}", summary);
    println!(
        "{} rows now in '{}'",
        pipeline.sink().row_count()?,
        pipeline.sink().table()
    );

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    // show 20 rows
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
