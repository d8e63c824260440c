//! The ordered DataFrame stages of the feature pipeline.
//!
//! Each stage takes the table produced by the previous one and appends or replaces
//! columns. Stages read inputs into plain vectors, derive the new values with the
//! functions in [`crate::transform::features`] and write them back as a new column.

use crate::transform::config::RoundingRule;
use crate::transform::error::StageFailure;
use crate::transform::features::{
    comfort_index, deltas, feels_colder, feels_warmer, is_daytime, is_nighttime,
    min_max_normalize, rolling_mean, round_half_even, wind_risk,
};
use crate::types::columns::*;
use crate::types::compass::CompassDirection;
use crate::types::raw_forecast::RawForecast;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;

pub type StageResult = Result<DataFrame, StageFailure>;

const OFFSET_FORMATS: [&str; 7] = [
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    Ok(df.column(name)?.f64()?.into_iter().collect())
}

fn timestamps(df: &DataFrame) -> PolarsResult<Vec<Option<NaiveDateTime>>> {
    Ok(df.column(DATE)?.datetime()?.as_datetime_iter().collect())
}

/// A parsed `date` entry: the wall-clock time that is stored, and the instant used to
/// check spacing. The two differ only when the entry carries an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ParsedTimestamp {
    local: NaiveDateTime,
    instant: NaiveDateTime,
}

impl ParsedTimestamp {
    fn naive(datetime: NaiveDateTime) -> Self {
        Self {
            local: datetime,
            instant: datetime,
        }
    }

    fn with_offset(datetime: DateTime<FixedOffset>) -> Self {
        Self {
            local: datetime.naive_local(),
            instant: datetime.naive_utc(),
        }
    }
}

fn parse_parts(value: &str) -> Option<ParsedTimestamp> {
    let value = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(ParsedTimestamp::with_offset(datetime));
    }
    for format in OFFSET_FORMATS {
        if let Ok(datetime) = DateTime::parse_from_str(value, format) {
            return Some(ParsedTimestamp::with_offset(datetime));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ParsedTimestamp::naive(datetime));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(ParsedTimestamp::naive)
}

/// Parses an ISO-8601 timestamp and keeps its wall-clock time, discarding any offset.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    parse_parts(value).map(|parsed| parsed.local)
}

/// One row per timestamp; `date` stays textual until [`normalize_dates`].
pub fn tabulate(record: &RawForecast) -> StageResult {
    let mut columns: Vec<Column> = Vec::with_capacity(record.hourly.variables.len() + 1);
    columns.push(Series::new(DATE.into(), record.hourly.date.as_slice()).into());
    for (name, values) in record.hourly.ordered_variables() {
        columns.push(Series::new(name.into(), values).into());
    }
    Ok(DataFrame::new(columns)?)
}

/// Replaces the textual `date` column with naive local datetimes and checks the series
/// advances by the interval between its first two timestamps.
///
/// Spacing is measured on absolute instants when entries carry offsets, so a series that
/// crosses a daylight-saving change stays regular even though its wall-clock hours repeat
/// or skip.
pub fn normalize_dates(mut df: DataFrame) -> StageResult {
    let raw = df.column(DATE)?.str()?;
    let mut parsed = Vec::with_capacity(raw.len());
    for (row, value) in raw.into_iter().enumerate() {
        let value = value.unwrap_or_default();
        let timestamp =
            parse_parts(value).ok_or_else(|| StageFailure::MalformedTimestamp {
                row,
                value: value.to_string(),
            })?;
        parsed.push(timestamp);
    }
    let instants: Vec<NaiveDateTime> = parsed.iter().map(|p| p.instant).collect();
    check_fixed_interval(&instants)?;

    let dates = DatetimeChunked::from_naive_datetime(
        DATE.into(),
        parsed.into_iter().map(|p| p.local),
        TimeUnit::Milliseconds,
    );
    df.with_column(dates.into_series())?;
    Ok(df)
}

fn check_fixed_interval(timestamps: &[NaiveDateTime]) -> Result<(), StageFailure> {
    let Some(expected) = timestamps
        .get(1)
        .zip(timestamps.first())
        .map(|(second, first)| *second - *first)
    else {
        return Ok(());
    };
    for (offset, pair) in timestamps.windows(2).enumerate() {
        let found = pair[1] - pair[0];
        if found != expected || found.num_seconds() <= 0 {
            return Err(StageFailure::IrregularInterval {
                row: offset + 1,
                expected_seconds: expected.num_seconds(),
                found_seconds: found.num_seconds(),
            });
        }
    }
    Ok(())
}

pub fn round_columns(mut df: DataFrame, rules: &[RoundingRule]) -> StageResult {
    for rule in rules {
        let rounded: Vec<Option<f64>> = df
            .column(&rule.column)?
            .f64()?
            .into_iter()
            .map(|value| value.map(|v| round_half_even(v, rule.precision)))
            .collect();
        df.with_column(Series::new(rule.column.as_str().into(), rounded))?;
    }
    Ok(df)
}

pub fn rolling_average(mut df: DataFrame, source: &str, target: &str, window: usize) -> StageResult {
    let averages = rolling_mean(&float_values(&df, source)?, window);
    df.with_column(Series::new(target.into(), averages))?;
    Ok(df)
}

pub fn temperature_delta(mut df: DataFrame) -> StageResult {
    let changes = deltas(&float_values(&df, TEMPERATURE_2M)?);
    df.with_column(Series::new(TEMP_CHANGE.into(), changes))?;
    Ok(df)
}

pub fn day_night_flags(mut df: DataFrame) -> StageResult {
    let hours: Vec<Option<u32>> = timestamps(&df)?
        .into_iter()
        .map(|timestamp| timestamp.map(|t| t.hour()))
        .collect();
    let hour: Vec<Option<i32>> = hours.iter().map(|h| h.map(|h| h as i32)).collect();
    let daytime: Vec<Option<i32>> = hours
        .iter()
        .map(|h| h.map(|h| i32::from(is_daytime(h))))
        .collect();
    let nighttime: Vec<Option<i32>> = hours
        .iter()
        .map(|h| h.map(|h| i32::from(is_nighttime(h))))
        .collect();

    df.with_column(Series::new(HOUR.into(), hour))?;
    df.with_column(Series::new(IS_DAYTIME.into(), daytime))?;
    df.with_column(Series::new(IS_NIGHTTIME.into(), nighttime))?;
    Ok(df)
}

pub fn comfort_comparison(mut df: DataFrame) -> StageResult {
    let apparent = float_values(&df, APPARENT_TEMPERATURE)?;
    let temperature = float_values(&df, TEMPERATURE_2M)?;

    let colder: Vec<Option<bool>> = apparent
        .iter()
        .zip(&temperature)
        .map(|(a, t)| feels_colder(*a, *t))
        .collect();
    let warmer: Vec<Option<bool>> = apparent
        .iter()
        .zip(&temperature)
        .map(|(a, t)| feels_warmer(*a, *t))
        .collect();

    df.with_column(Series::new(IS_COLDER.into(), colder))?;
    df.with_column(Series::new(IS_WARMER.into(), warmer))?;
    Ok(df)
}

pub fn wind_direction_bucket(mut df: DataFrame) -> StageResult {
    let labels: Vec<Option<&'static str>> = float_values(&df, WIND_DIRECTION_180M)?
        .into_iter()
        .map(|degrees| {
            degrees
                .and_then(CompassDirection::from_degrees)
                .map(|d| d.as_str())
        })
        .collect();
    df.with_column(Series::new(WIND_DIRECTION.into(), labels))?;
    Ok(df)
}

pub fn wind_risk_index(mut df: DataFrame) -> StageResult {
    let speed = float_values(&df, WIND_SPEED_180M)?;
    let gusts = float_values(&df, WIND_GUSTS_10M)?;
    let risk: Vec<Option<f64>> = speed
        .iter()
        .zip(&gusts)
        .map(|(s, g)| wind_risk(*s, *g))
        .collect();
    df.with_column(Series::new(WIND_RISK.into(), risk))?;
    Ok(df)
}

fn positive_flag(values: &[Option<f64>]) -> Vec<i32> {
    values
        .iter()
        .map(|v| i32::from(v.is_some_and(|v| v > 0.0)))
        .collect()
}

pub fn precipitation_flags(mut df: DataFrame) -> StageResult {
    let rain = positive_flag(&float_values(&df, PRECIPITATION)?);
    let snow = positive_flag(&float_values(&df, SNOW_DEPTH)?);
    df.with_column(Series::new(IS_RAIN.into(), rain))?;
    df.with_column(Series::new(IS_SNOW.into(), snow))?;
    Ok(df)
}

pub fn comfort_index_column(mut df: DataFrame) -> StageResult {
    let temperature = float_values(&df, TEMPERATURE_2M)?;
    let humidity = float_values(&df, RELATIVE_HUMIDITY_2M)?;
    let wind_speed = float_values(&df, WIND_SPEED_180M)?;
    let index: Vec<Option<f64>> = temperature
        .iter()
        .zip(&humidity)
        .zip(&wind_speed)
        .map(|((t, rh), ws)| comfort_index(*t, *rh, *ws))
        .collect();
    df.with_column(Series::new(COMFORT_INDEX.into(), index))?;
    Ok(df)
}

pub fn normalize_visibility(mut df: DataFrame) -> StageResult {
    let normalized = min_max_normalize(&float_values(&df, VISIBILITY)?).ok_or_else(|| {
        StageFailure::DegenerateSeries {
            column: VISIBILITY.to_string(),
        }
    })?;
    df.with_column(Series::new(VISIBILITY_NORM.into(), normalized))?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parses_naive_and_offset_timestamps() {
        assert_eq!(parse_timestamp("2025-01-01T05:00"), Some(at(5)));
        assert_eq!(parse_timestamp("2025-01-01T05:00:00"), Some(at(5)));
        assert_eq!(parse_timestamp("2025-01-01 05:00:00"), Some(at(5)));
        assert_eq!(parse_timestamp("2025-01-01"), Some(at(0)));
        // The offset is dropped, not applied: wall-clock time survives.
        assert_eq!(parse_timestamp("2025-01-01T05:00:00+02:00"), Some(at(5)));
        assert_eq!(parse_timestamp("2025-01-01T05:00:00Z"), Some(at(5)));
        assert_eq!(parse_timestamp("2025-01-01T05:00-03:00"), Some(at(5)));
        assert_eq!(parse_timestamp("2025-01-01T05:00:00+0200"), Some(at(5)));
        assert_eq!(parse_timestamp("2025-01-01 05:00-0330"), Some(at(5)));
        assert_eq!(parse_timestamp("2025-01-01T05:00:00.000+0100"), Some(at(5)));
    }

    #[test]
    fn test_rejects_unparseable_timestamps() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2025-13-01T00:00"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_normalize_dates_reports_offending_row() -> PolarsResult<()> {
        let df = df!("date" => &["2025-01-01T00:00", "not a date"])?;
        match normalize_dates(df) {
            Err(StageFailure::MalformedTimestamp { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "not a date");
            }
            other => panic!("expected malformed timestamp, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_normalize_dates_requires_fixed_interval() -> PolarsResult<()> {
        let df = df!("date" => &["2025-01-01T00:00", "2025-01-01T01:00", "2025-01-01T03:00"])?;
        match normalize_dates(df) {
            Err(StageFailure::IrregularInterval {
                row,
                expected_seconds,
                found_seconds,
            }) => {
                assert_eq!(row, 2);
                assert_eq!(expected_seconds, 3600);
                assert_eq!(found_seconds, 7200);
            }
            other => panic!("expected irregular interval, got {other:?}"),
        }

        let backwards = df!("date" => &["2025-01-01T01:00", "2025-01-01T00:00"])?;
        assert!(matches!(
            normalize_dates(backwards),
            Err(StageFailure::IrregularInterval { row: 1, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_normalize_dates_accepts_daylight_saving_change() -> Result<(), Box<dyn std::error::Error>> {
        // Clocks fall back from +02:00 to +01:00, so the 02:00 wall-clock hour repeats.
        let df = df!("date" => &[
            "2025-10-26T01:00+02:00",
            "2025-10-26T02:00+02:00",
            "2025-10-26T02:00+01:00",
            "2025-10-26T03:00+01:00",
        ])?;
        let df = normalize_dates(df)?;
        let hours: Vec<Option<u32>> = timestamps(&df)?
            .into_iter()
            .map(|t| t.map(|t| t.hour()))
            .collect();
        assert_eq!(hours, vec![Some(1), Some(2), Some(2), Some(3)]);
        Ok(())
    }

    #[test]
    fn test_normalize_dates_measures_offsets_as_instants() -> PolarsResult<()> {
        // Same wall-clock step, but the offset change makes the real gap two hours.
        let df = df!("date" => &[
            "2025-03-30T00:00+01:00",
            "2025-03-30T01:00+01:00",
            "2025-03-30T02:00+00:00",
        ])?;
        assert!(matches!(
            normalize_dates(df),
            Err(StageFailure::IrregularInterval {
                row: 2,
                expected_seconds: 3600,
                found_seconds: 7200,
            })
        ));
        Ok(())
    }

    #[test]
    fn test_normalize_dates_produces_datetime_column() -> Result<(), Box<dyn std::error::Error>> {
        let df = df!("date" => &["2025-01-01T04:00+01:00", "2025-01-01T05:00+01:00"])?;
        let df = normalize_dates(df)?;
        assert!(matches!(
            df.column("date")?.dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
        assert_eq!(timestamps(&df)?, vec![Some(at(4)), Some(at(5))]);
        Ok(())
    }

    #[test]
    fn test_rounding_leaves_unlisted_columns_alone() -> Result<(), Box<dyn std::error::Error>> {
        let df = df!(
            "temperature_2m" => &[12.25f64, 12.35f64],
            "relative_humidity_2m" => &[81.27f64, 80.01f64],
        )?;
        let df = round_columns(df, &[RoundingRule::new("temperature_2m", 1)])?;
        let temperature = df.column("temperature_2m")?.f64()?;
        assert_eq!(temperature.get(0), Some(12.2));
        let humidity = df.column("relative_humidity_2m")?.f64()?;
        assert_eq!(humidity.get(0), Some(81.27));
        assert_eq!(humidity.get(1), Some(80.01));
        Ok(())
    }

    #[test]
    fn test_wind_bucket_writes_labels() -> Result<(), Box<dyn std::error::Error>> {
        let df = df!("wind_direction_180m" => &[Some(0.0f64), Some(44.0), Some(45.0), Some(360.0), None])?;
        let df = wind_direction_bucket(df)?;
        let labels: Vec<Option<&str>> = df.column("wind_direction")?.str()?.into_iter().collect();
        assert_eq!(labels, vec![Some("N"), Some("NE"), Some("NE"), Some("N"), None]);
        Ok(())
    }

    #[test]
    fn test_precipitation_flags_treat_missing_as_dry() -> Result<(), Box<dyn std::error::Error>> {
        let df = df!(
            "precipitation" => &[Some(0.0f64), Some(0.2), None],
            "snow_depth" => &[Some(0.01f64), Some(0.0), None],
        )?;
        let df = precipitation_flags(df)?;
        let rain: Vec<Option<i32>> = df.column("is_rain")?.i32()?.into_iter().collect();
        let snow: Vec<Option<i32>> = df.column("is_snow")?.i32()?.into_iter().collect();
        assert_eq!(rain, vec![Some(0), Some(1), Some(0)]);
        assert_eq!(snow, vec![Some(1), Some(0), Some(0)]);
        Ok(())
    }

    #[test]
    fn test_constant_visibility_is_degenerate() -> PolarsResult<()> {
        let df = df!("visibility" => &[24140.0f64, 24140.0, 24140.0])?;
        assert!(matches!(
            normalize_visibility(df),
            Err(StageFailure::DegenerateSeries { column }) if column == "visibility"
        ));
        Ok(())
    }
}
