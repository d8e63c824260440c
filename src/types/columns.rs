//! Column names shared by the raw forecast record, the feature stages and the sinks.

/// Timestamp column of the hourly table.
pub const DATE: &str = "date";

pub const TEMPERATURE_2M: &str = "temperature_2m";
pub const RELATIVE_HUMIDITY_2M: &str = "relative_humidity_2m";
pub const DEW_POINT_2M: &str = "dew_point_2m";
pub const APPARENT_TEMPERATURE: &str = "apparent_temperature";
pub const PRECIPITATION_PROBABILITY: &str = "precipitation_probability";
pub const PRECIPITATION: &str = "precipitation";
pub const SNOW_DEPTH: &str = "snow_depth";
pub const WEATHER_CODE: &str = "weather_code";
pub const PRESSURE_MSL: &str = "pressure_msl";
pub const SURFACE_PRESSURE: &str = "surface_pressure";
pub const CLOUD_COVER: &str = "cloud_cover";
pub const VISIBILITY: &str = "visibility";
pub const VAPOUR_PRESSURE_DEFICIT: &str = "vapour_pressure_deficit";
pub const EVAPOTRANSPIRATION: &str = "evapotranspiration";
pub const ET0_FAO_EVAPOTRANSPIRATION: &str = "et0_fao_evapotranspiration";
pub const WIND_SPEED_180M: &str = "wind_speed_180m";
pub const WIND_DIRECTION_180M: &str = "wind_direction_180m";
pub const WIND_GUSTS_10M: &str = "wind_gusts_10m";
pub const TEMPERATURE_180M: &str = "temperature_180m";
pub const SOIL_TEMPERATURE_54CM: &str = "soil_temperature_54cm";
pub const SOIL_MOISTURE_27_TO_81CM: &str = "soil_moisture_27_to_81cm";

// Derived columns, in the order the stages append them.
pub const TEMP_CHANGE: &str = "temp_change";
pub const HOUR: &str = "hour";
pub const IS_DAYTIME: &str = "is_daytime";
pub const IS_NIGHTTIME: &str = "is_nighttime";
pub const IS_COLDER: &str = "is_colder";
pub const IS_WARMER: &str = "is_warmer";
pub const WIND_DIRECTION: &str = "wind_direction";
pub const WIND_RISK: &str = "wind_risk";
pub const IS_RAIN: &str = "is_rain";
pub const IS_SNOW: &str = "is_snow";
pub const COMFORT_INDEX: &str = "comfort_index";
pub const VISIBILITY_NORM: &str = "visibility_norm";

/// The hourly variables requested from Open-Meteo, in the order they are tabulated.
pub const HOURLY_VARIABLES: [&str; 21] = [
    TEMPERATURE_2M,
    RELATIVE_HUMIDITY_2M,
    DEW_POINT_2M,
    APPARENT_TEMPERATURE,
    PRECIPITATION_PROBABILITY,
    PRECIPITATION,
    SNOW_DEPTH,
    WEATHER_CODE,
    PRESSURE_MSL,
    SURFACE_PRESSURE,
    CLOUD_COVER,
    VISIBILITY,
    VAPOUR_PRESSURE_DEFICIT,
    EVAPOTRANSPIRATION,
    ET0_FAO_EVAPOTRANSPIRATION,
    WIND_SPEED_180M,
    WIND_DIRECTION_180M,
    WIND_GUSTS_10M,
    TEMPERATURE_180M,
    SOIL_TEMPERATURE_54CM,
    SOIL_MOISTURE_27_TO_81CM,
];

/// Continuous variables rounded by default before any feature is derived.
pub const DEFAULT_ROUNDED_COLUMNS: [&str; 13] = [
    TEMPERATURE_2M,
    DEW_POINT_2M,
    APPARENT_TEMPERATURE,
    PRESSURE_MSL,
    SURFACE_PRESSURE,
    VAPOUR_PRESSURE_DEFICIT,
    ET0_FAO_EVAPOTRANSPIRATION,
    WIND_SPEED_180M,
    WIND_DIRECTION_180M,
    WIND_GUSTS_10M,
    TEMPERATURE_180M,
    SOIL_TEMPERATURE_54CM,
    SOIL_MOISTURE_27_TO_81CM,
];

/// Variables read by at least one feature stage. These must be present in every record.
pub const FEATURE_INPUTS: [&str; 9] = [
    TEMPERATURE_2M,
    RELATIVE_HUMIDITY_2M,
    APPARENT_TEMPERATURE,
    PRECIPITATION,
    SNOW_DEPTH,
    VISIBILITY,
    WIND_SPEED_180M,
    WIND_DIRECTION_180M,
    WIND_GUSTS_10M,
];

pub fn temperature_average(window: usize) -> String {
    format!("temp_{window}_hour_average")
}

pub fn humidity_average(window: usize) -> String {
    format!("humidity_{window}_hour_average")
}

/// Position of `name` in [`HOURLY_VARIABLES`], used to give the table a stable column order.
pub(crate) fn catalogue_position(name: &str) -> Option<usize> {
    HOURLY_VARIABLES.iter().position(|v| *v == name)
}
