//! Pure numeric building blocks of the feature stages.
//!
//! Every function here works on plain values or slices so it can be tested without a
//! data frame. `None` is the "no value" marker and propagates through each calculation.

/// Decimals kept by derived indices (wind risk, comfort terms, normalized visibility).
pub const FEATURE_PRECISION: u32 = 1;

const DAYTIME_START_HOUR: u32 = 6;
const DAYTIME_END_HOUR: u32 = 18;
const NIGHTTIME_START_HOUR: u32 = 19;
const NIGHTTIME_END_HOUR: u32 = 5;

/// Rounds to `decimals` places, resolving ties to the even neighbour.
///
/// The value is scaled by `10^decimals`, rounded ties-to-even and scaled back, so
/// `0.25` becomes `0.2` and `0.75` becomes `0.8` at one decimal.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Trailing simple moving average over `window` consecutive samples.
///
/// The first `window - 1` positions have no complete window and yield `None`, as does any
/// window containing a missing sample.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let samples = &values[i + 1 - window..=i];
            let sum = samples
                .iter()
                .try_fold(0.0, |acc, sample| sample.map(|v| acc + v))?;
            Some(sum / window as f64)
        })
        .collect()
}

/// Difference between each sample and its predecessor; the first sample has none.
pub fn deltas(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if !values.is_empty() {
        out.push(None);
    }
    for pair in values.windows(2) {
        out.push(match (pair[0], pair[1]) {
            (Some(previous), Some(current)) => Some(current - previous),
            _ => None,
        });
    }
    out
}

/// Hours 6 through 18 inclusive.
pub fn is_daytime(hour: u32) -> bool {
    (DAYTIME_START_HOUR..=DAYTIME_END_HOUR).contains(&hour)
}

/// Hours 19 through 23 and 0 through 5. Never overlaps [`is_daytime`].
pub fn is_nighttime(hour: u32) -> bool {
    hour >= NIGHTTIME_START_HOUR || hour <= NIGHTTIME_END_HOUR
}

/// Whether it feels colder than the air temperature truncated toward zero.
pub fn feels_colder(apparent: Option<f64>, temperature: Option<f64>) -> Option<bool> {
    Some(apparent? < temperature?.trunc())
}

/// Whether it feels warmer than the air temperature truncated toward zero.
pub fn feels_warmer(apparent: Option<f64>, temperature: Option<f64>) -> Option<bool> {
    Some(apparent? > temperature?.trunc())
}

/// `round(speed * 0.6 + gusts * 0.4, 1)`.
pub fn wind_risk(speed: Option<f64>, gusts: Option<f64>) -> Option<f64> {
    Some(round_half_even(
        speed? * 0.6 + gusts? * 0.4,
        FEATURE_PRECISION,
    ))
}

/// Sum of three independently rounded penalty terms for heat, humidity and wind.
///
/// The terms are `round(t * -0.1, 1)`, `round(rh * -0.03, 1)` and `round(ws * -0.02, 1)`;
/// the sum itself is not rounded again.
pub fn comfort_index(
    temperature: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
) -> Option<f64> {
    let heat = round_half_even(temperature? * -0.1, FEATURE_PRECISION);
    let damp = round_half_even(humidity? * -0.03, FEATURE_PRECISION);
    let wind = round_half_even(wind_speed? * -0.02, FEATURE_PRECISION);
    Some(heat + damp + wind)
}

/// Observed `(min, max)` of the present samples, or `None` when nothing spans a range.
pub fn value_range(values: &[Option<f64>]) -> Option<(f64, f64)> {
    let (min, max) = values
        .iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(*v), max.max(*v))
        });
    if min < max {
        Some((min, max))
    } else {
        None
    }
}

/// Min-max scales the series into `[0, 1]`, rounded to one decimal.
///
/// Returns `None` when the series is constant (or empty), since the range would be zero.
pub fn min_max_normalize(values: &[Option<f64>]) -> Option<Vec<Option<f64>>> {
    let (min, max) = value_range(values)?;
    let span = max - min;
    Some(
        values
            .iter()
            .map(|v| v.map(|v| round_half_even((v - min) / span, FEATURE_PRECISION)))
            .collect(),
    )
}
