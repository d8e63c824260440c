//! Contains the `EnrichedFrame` structure returned by the feature pipeline.

use crate::frames::daily_frame::DailyRollupFrame;
use crate::types::columns::*;
use crate::types::compass::CompassDirection;
use crate::types::rows::EnrichedRow;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

/// The enriched hourly table: every raw variable plus the derived feature columns,
/// one row per timestamp in ascending order.
///
/// The `date` column holds naive local datetimes (the forecast location's wall-clock
/// time). Query helpers return new frames and leave this one untouched.
#[derive(Debug, Clone)]
pub struct EnrichedFrame {
    /// The underlying Polars DataFrame.
    pub frame: DataFrame,
    temp_average_column: String,
    humidity_average_column: String,
}

impl EnrichedFrame {
    pub(crate) fn new(
        frame: DataFrame,
        temp_average_column: String,
        humidity_average_column: String,
    ) -> Self {
        Self {
            frame,
            temp_average_column,
            humidity_average_column,
        }
    }

    /// Number of rows (timestamps).
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Name of the rolling temperature average column, e.g. `temp_3_hour_average`.
    pub fn temp_average_column(&self) -> &str {
        &self.temp_average_column
    }

    /// Name of the rolling humidity average column, e.g. `humidity_6_hour_average`.
    pub fn humidity_average_column(&self) -> &str {
        &self.humidity_average_column
    }

    /// Keeps the rows matching a Polars predicate.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use forecast_features::{EnrichedFrame};
    /// use polars::prelude::{col, lit};
    ///
    /// # fn rainy(enriched: &EnrichedFrame) -> Result<(), polars::prelude::PolarsError> {
    /// let rainy_hours = enriched.filter(col("is_rain").eq(lit(1)))?;
    /// println!("{} rainy hours", rainy_hours.height());
    /// # Ok(())
    /// # }
    /// ```
    pub fn filter(&self, predicate: Expr) -> PolarsResult<EnrichedFrame> {
        let frame = self.frame.clone().lazy().filter(predicate).collect()?;
        Ok(EnrichedFrame::new(
            frame,
            self.temp_average_column.clone(),
            self.humidity_average_column.clone(),
        ))
    }

    /// Rows with `start <= date <= end`.
    pub fn get_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> PolarsResult<EnrichedFrame> {
        self.filter(
            col(DATE)
                .gt_eq(lit(start))
                .and(col(DATE).lt_eq(lit(end))),
        )
    }

    /// Rows falling on the given local calendar day.
    pub fn get_for_day(&self, day: NaiveDate) -> PolarsResult<EnrichedFrame> {
        let start = day.and_time(NaiveTime::MIN);
        let next_day = start + Duration::days(1);
        self.filter(
            col(DATE)
                .gt_eq(lit(start))
                .and(col(DATE).lt(lit(next_day))),
        )
    }

    /// First timestamp at which `column` is at or below `threshold`, skipping missing values.
    ///
    /// Useful for questions like "when does the temperature first drop below freezing".
    pub fn first_at_or_below(
        &self,
        column: &str,
        threshold: f64,
    ) -> PolarsResult<Option<NaiveDateTime>> {
        let dates = self.frame.column(DATE)?.datetime()?;
        let values = self.frame.column(column)?.f64()?;
        Ok(dates
            .as_datetime_iter()
            .zip(values)
            .find_map(|(date, value)| match value {
                Some(v) if v <= threshold => date,
                _ => None,
            }))
    }

    /// Daily aggregates of this table, see [`DailyRollupFrame`].
    pub fn daily(&self) -> DailyRollupFrame {
        DailyRollupFrame::from_hourly(self.frame.clone().lazy())
    }

    /// Materializes the table as typed rows.
    ///
    /// # Errors
    ///
    /// Returns a [`PolarsError`] if a derived column is missing or has an unexpected type,
    /// which only happens for frames not produced by the pipeline.
    pub fn collect_rows(&self) -> PolarsResult<Vec<EnrichedRow>> {
        let df = &self.frame;
        let dates: Vec<Option<NaiveDateTime>> =
            df.column(DATE)?.datetime()?.as_datetime_iter().collect();
        let temperature = df.column(TEMPERATURE_2M)?.f64()?;
        let humidity = df.column(RELATIVE_HUMIDITY_2M)?.f64()?;
        let apparent = df.column(APPARENT_TEMPERATURE)?.f64()?;
        let precipitation = df.column(PRECIPITATION)?.f64()?;
        let snow_depth = df.column(SNOW_DEPTH)?.f64()?;
        let visibility = df.column(VISIBILITY)?.f64()?;
        let wind_speed = df.column(WIND_SPEED_180M)?.f64()?;
        let wind_bearing = df.column(WIND_DIRECTION_180M)?.f64()?;
        let wind_gusts = df.column(WIND_GUSTS_10M)?.f64()?;
        let temp_average = df.column(&self.temp_average_column)?.f64()?;
        let humidity_average = df.column(&self.humidity_average_column)?.f64()?;
        let temp_change = df.column(TEMP_CHANGE)?.f64()?;
        let hour = df.column(HOUR)?.i32()?;
        let is_daytime = df.column(IS_DAYTIME)?.i32()?;
        let is_nighttime = df.column(IS_NIGHTTIME)?.i32()?;
        let is_colder = df.column(IS_COLDER)?.bool()?;
        let is_warmer = df.column(IS_WARMER)?.bool()?;
        let wind_direction = df.column(WIND_DIRECTION)?.str()?;
        let wind_risk = df.column(WIND_RISK)?.f64()?;
        let is_rain = df.column(IS_RAIN)?.i32()?;
        let is_snow = df.column(IS_SNOW)?.i32()?;
        let comfort_index = df.column(COMFORT_INDEX)?.f64()?;
        let visibility_norm = df.column(VISIBILITY_NORM)?.f64()?;

        let flag = |values: &Int32Chunked, i: usize| values.get(i).is_some_and(|v| v != 0);

        let mut rows = Vec::with_capacity(dates.len());
        for (i, date) in dates.into_iter().enumerate() {
            let date = date.ok_or_else(|| {
                PolarsError::ComputeError(format!("row {i} has no timestamp").into())
            })?;
            rows.push(EnrichedRow {
                date,
                temperature_2m: temperature.get(i),
                relative_humidity_2m: humidity.get(i),
                apparent_temperature: apparent.get(i),
                precipitation: precipitation.get(i),
                snow_depth: snow_depth.get(i),
                visibility: visibility.get(i),
                wind_speed_180m: wind_speed.get(i),
                wind_direction_180m: wind_bearing.get(i),
                wind_gusts_10m: wind_gusts.get(i),
                temp_average: temp_average.get(i),
                humidity_average: humidity_average.get(i),
                temp_change: temp_change.get(i),
                hour: hour.get(i).unwrap_or_default() as u32,
                is_daytime: flag(is_daytime, i),
                is_nighttime: flag(is_nighttime, i),
                is_colder: is_colder.get(i),
                is_warmer: is_warmer.get(i),
                wind_direction: wind_direction.get(i).and_then(CompassDirection::from_label),
                wind_risk: wind_risk.get(i),
                is_rain: flag(is_rain, i),
                is_snow: flag(is_snow, i),
                comfort_index: comfort_index.get(i),
                visibility_norm: visibility_norm.get(i),
            });
        }
        Ok(rows)
    }
}
