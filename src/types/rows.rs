//! Typed views of collected table rows.

use crate::types::compass::CompassDirection;
use chrono::{NaiveDate, NaiveDateTime};

/// One enriched hourly sample, as collected from an [`crate::EnrichedFrame`].
///
/// Only the variables the feature stages read are carried here; pass-through variables
/// remain available on the frame itself. Derived fields lacking history are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub date: NaiveDateTime,
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub snow_depth: Option<f64>,
    pub visibility: Option<f64>,
    pub wind_speed_180m: Option<f64>,
    pub wind_direction_180m: Option<f64>,
    pub wind_gusts_10m: Option<f64>,
    pub temp_average: Option<f64>,
    pub humidity_average: Option<f64>,
    pub temp_change: Option<f64>,
    pub hour: u32,
    pub is_daytime: bool,
    pub is_nighttime: bool,
    pub is_colder: Option<bool>,
    pub is_warmer: Option<bool>,
    pub wind_direction: Option<CompassDirection>,
    pub wind_risk: Option<f64>,
    pub is_rain: bool,
    pub is_snow: bool,
    pub comfort_index: Option<f64>,
    pub visibility_norm: Option<f64>,
}

/// Aggregates of one calendar day of enriched rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRollup {
    pub date: NaiveDate,
    pub temperature_2m_mean: Option<f64>,
    pub temperature_2m_max: Option<f64>,
    pub temperature_2m_min: Option<f64>,
    pub precipitation_sum: Option<f64>,
    pub wind_speed_180m_mean: Option<f64>,
    pub relative_humidity_2m_mean: Option<f64>,
}
