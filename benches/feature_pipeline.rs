use criterion::{black_box, criterion_group, criterion_main, Criterion};
use forecast_features::{columns, Coordinates, FeaturePipeline, PipelineConfig, RawForecast};
use std::collections::BTreeMap;

fn synthetic_forecast(hours: usize) -> RawForecast {
    let dates = (0..hours)
        .map(|i| {
            let day = 1 + i / 24;
            format!("2025-01-{:02}T{:02}:00", day, i % 24)
        })
        .collect();
    let variables: BTreeMap<String, Vec<Option<f64>>> = columns::HOURLY_VARIABLES
        .iter()
        .enumerate()
        .map(|(v, name)| {
            let values = (0..hours)
                .map(|i| Some(((i * 7 + v * 13) % 360) as f64 * 0.37))
                .collect();
            (name.to_string(), values)
        })
        .collect();
    RawForecast::new(
        Coordinates {
            latitude: 52.52,
            longitude: 13.41,
            elevation: 38.0,
            utc_offset_seconds: 0.0,
        },
        dates,
        variables,
    )
}

fn bench_feature_pipeline(c: &mut Criterion) {
    // 30 days fits in January, so the synthetic dates stay valid.
    let record = synthetic_forecast(24 * 30);
    let pipeline = FeaturePipeline::new(PipelineConfig::default()).unwrap();

    c.bench_function("feature_pipeline_720_hours", |b| {
        b.iter(|| pipeline.run(black_box(&record)).unwrap())
    });
    c.bench_function("daily_rollups_720_hours", |b| {
        let enriched = pipeline.run(&record).unwrap();
        b.iter(|| enriched.daily().collect_rollups().unwrap())
    });
}

criterion_group!(benches, bench_feature_pipeline);
criterion_main!(benches);
