//! Contains the `DailyRollupFrame` structure: calendar-day aggregates of an enriched table.

use crate::types::columns::{
    DATE, PRECIPITATION, RELATIVE_HUMIDITY_2M, TEMPERATURE_2M, WIND_SPEED_180M,
};
use crate::types::rows::DailyRollup;
use chrono::NaiveDate;
use polars::prelude::*;

pub const TEMPERATURE_2M_MEAN: &str = "temperature_2m_mean";
pub const TEMPERATURE_2M_MAX: &str = "temperature_2m_max";
pub const TEMPERATURE_2M_MIN: &str = "temperature_2m_min";
pub const PRECIPITATION_SUM: &str = "precipitation_sum";
pub const WIND_SPEED_180M_MEAN: &str = "wind_speed_180m_mean";
pub const RELATIVE_HUMIDITY_2M_MEAN: &str = "relative_humidity_2m_mean";

/// A lazy view of one row per local calendar day.
///
/// Days are taken from the naive local `date` column; days without rows do not appear and
/// partial days are aggregated over the hours present. Missing samples are skipped by every
/// aggregate. Nothing is computed until the frame is collected.
#[derive(Clone)]
pub struct DailyRollupFrame {
    /// The underlying Polars LazyFrame with a `date` column of type `Date`.
    pub frame: LazyFrame,
}

impl DailyRollupFrame {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    /// Groups an hourly enriched frame by calendar day, keeping the input day order.
    pub(crate) fn from_hourly(hourly: LazyFrame) -> Self {
        let frame = hourly
            .group_by_stable([col(DATE).dt().date().alias(DATE)])
            .agg([
                col(TEMPERATURE_2M).mean().alias(TEMPERATURE_2M_MEAN),
                col(TEMPERATURE_2M).max().alias(TEMPERATURE_2M_MAX),
                col(TEMPERATURE_2M).min().alias(TEMPERATURE_2M_MIN),
                col(PRECIPITATION).sum().alias(PRECIPITATION_SUM),
                col(WIND_SPEED_180M).mean().alias(WIND_SPEED_180M_MEAN),
                col(RELATIVE_HUMIDITY_2M).mean().alias(RELATIVE_HUMIDITY_2M_MEAN),
            ]);
        Self::new(frame)
    }

    pub fn filter(&self, predicate: Expr) -> DailyRollupFrame {
        DailyRollupFrame::new(self.frame.clone().filter(predicate))
    }

    /// Rollups for days `start..=end`.
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> DailyRollupFrame {
        self.filter(col(DATE).gt_eq(lit(start)).and(col(DATE).lt_eq(lit(end))))
    }

    /// Collects the frame into typed rollups.
    pub fn collect_rollups(&self) -> PolarsResult<Vec<DailyRollup>> {
        let df = self.frame.clone().collect()?;
        let dates: Vec<Option<NaiveDate>> = df.column(DATE)?.date()?.as_date_iter().collect();
        let mean = df.column(TEMPERATURE_2M_MEAN)?.f64()?;
        let max = df.column(TEMPERATURE_2M_MAX)?.f64()?;
        let min = df.column(TEMPERATURE_2M_MIN)?.f64()?;
        let precipitation = df.column(PRECIPITATION_SUM)?.f64()?;
        let wind_speed = df.column(WIND_SPEED_180M_MEAN)?.f64()?;
        let humidity = df.column(RELATIVE_HUMIDITY_2M_MEAN)?.f64()?;

        dates
            .into_iter()
            .enumerate()
            .map(|(i, date)| {
                let date = date.ok_or_else(|| {
                    PolarsError::ComputeError(format!("rollup {i} has no date").into())
                })?;
                Ok(DailyRollup {
                    date,
                    temperature_2m_mean: mean.get(i),
                    temperature_2m_max: max.get(i),
                    temperature_2m_min: min.get(i),
                    precipitation_sum: precipitation.get(i),
                    wind_speed_180m_mean: wind_speed.get(i),
                    relative_humidity_2m_mean: humidity.get(i),
                })
            })
            .collect()
    }
}
