//! Runs the feature pipeline over a raw forecast JSON file and prints the enriched table
//! plus its daily rollups.
//!
//! Usage: `cargo run --example transform_file -- forecast.json [config.json]`

use forecast_features::{FeaturePipeline, PipelineConfig, RawForecast};
use std::env;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    env::set_var("POLARS_FMT_MAX_COLS", "-1");

    let mut args = env::args().skip(1);
    let input = args.next().ok_or("usage: transform_file <forecast.json> [config.json]")?;
    let config = match args.next() {
        Some(path) => PipelineConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => PipelineConfig::default(),
    };

    let record = RawForecast::from_json_slice(&std::fs::read(&input)?)?;
    let enriched = FeaturePipeline::new(config)?.run(&record)?;
    println!("{}", enriched.frame);

    for rollup in enriched.daily().collect_rollups()? {
        println!(
            "{}: mean {:?}°C, max {:?}°C, min {:?}°C, rain {:?} mm",
            rollup.date,
            rollup.temperature_2m_mean,
            rollup.temperature_2m_max,
            rollup.temperature_2m_min,
            rollup.precipitation_sum
        );
    }

    if let Some(frost) = enriched.first_at_or_below("temperature_2m", 0.0)? {
        println!("First frost at {}", frost);
    }

    Ok(())
}
