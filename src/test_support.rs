//! Synthetic forecast records shared by the unit tests.

use crate::types::columns::*;
use crate::types::raw_forecast::{Coordinates, RawForecast};
use chrono::{Duration, NaiveDate};

pub(crate) fn hourly_dates(hours: usize) -> Vec<String> {
    let start = NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..hours)
        .map(|i| {
            (start + Duration::hours(i as i64))
                .format("%Y-%m-%dT%H:%M")
                .to_string()
        })
        .collect()
}

/// Plausible value of `variable` at hour `i`. Visibility varies so it can be normalized.
fn sample(variable: &str, i: usize) -> Option<f64> {
    let hour = (i % 24) as f64;
    let value = match variable {
        TEMPERATURE_2M => 5.0 + hour * 0.5,
        APPARENT_TEMPERATURE => 3.5 + hour * 0.5,
        RELATIVE_HUMIDITY_2M => 60.0 + (i % 10) as f64,
        PRECIPITATION => {
            if i % 5 == 0 {
                0.3
            } else {
                0.0
            }
        }
        SNOW_DEPTH => 0.0,
        VISIBILITY => 10000.0 + hour * 500.0,
        WIND_SPEED_180M => 12.0 + (i % 7) as f64,
        WIND_DIRECTION_180M => ((i * 30) % 360) as f64,
        WIND_GUSTS_10M => 20.0 + (i % 9) as f64,
        _ => 1.0 + hour,
    };
    Some(value)
}

/// `hours` hourly samples of every catalogue variable, starting 2025-03-01T00:00.
pub(crate) fn forecast(hours: usize) -> RawForecast {
    forecast_with(hours, |_, _| None)
}

/// Like [`forecast`], with `overrides` supplying the value of a variable at an hour
/// where it returns `Some`.
pub(crate) fn forecast_with(
    hours: usize,
    overrides: impl Fn(&str, usize) -> Option<f64>,
) -> RawForecast {
    let variables = HOURLY_VARIABLES
        .iter()
        .map(|name| {
            let values = (0..hours)
                .map(|i| overrides(name, i).or_else(|| sample(name, i)))
                .collect();
            (name.to_string(), values)
        })
        .collect();
    RawForecast::new(
        Coordinates {
            latitude: 52.52,
            longitude: 13.41,
            elevation: 38.0,
            utc_offset_seconds: 3600.0,
        },
        hourly_dates(hours),
        variables,
    )
}
