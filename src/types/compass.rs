//! Defines the `CompassDirection` enum used to bucket wind directions.

use std::fmt;

/// One of the eight principal compass points, each covering a 45° sector
/// centred on its bearing (N covers 337.5°..22.5°).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum CompassDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassDirection {
    /// All directions, clockwise from north. The index of a variant in this list is its bucket.
    pub const ALL: [CompassDirection; 8] = [
        CompassDirection::N,
        CompassDirection::NE,
        CompassDirection::E,
        CompassDirection::SE,
        CompassDirection::S,
        CompassDirection::SW,
        CompassDirection::W,
        CompassDirection::NW,
    ];

    /// Buckets a bearing in degrees into a compass direction.
    ///
    /// The bucket is `floor((degrees + 22.5) / 45) mod 8`, so bearings wrap around:
    /// 360° and -45° map like 0° and 315°.
    ///
    /// # Returns
    ///
    /// * `Some(CompassDirection)` for any finite bearing.
    /// * `None` for `NaN` or infinite input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use forecast_features::CompassDirection;
    ///
    /// assert_eq!(CompassDirection::from_degrees(44.0), Some(CompassDirection::NE));
    /// assert_eq!(CompassDirection::from_degrees(45.0), Some(CompassDirection::NE));
    /// assert_eq!(CompassDirection::from_degrees(360.0), Some(CompassDirection::N));
    /// assert_eq!(CompassDirection::from_degrees(f64::NAN), None);
    /// ```
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let bucket = ((degrees + 22.5) / 45.0).floor() as i64;
        Some(Self::ALL[bucket.rem_euclid(8) as usize])
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompassDirection::N => "N",
            CompassDirection::NE => "NE",
            CompassDirection::E => "E",
            CompassDirection::SE => "SE",
            CompassDirection::S => "S",
            CompassDirection::SW => "SW",
            CompassDirection::W => "W",
            CompassDirection::NW => "NW",
        }
    }

    /// Parses a label as written to the `wind_direction` column.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == label)
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_sector_boundaries() {
        assert_eq!(CompassDirection::from_degrees(0.0), Some(CompassDirection::N));
        assert_eq!(CompassDirection::from_degrees(22.4), Some(CompassDirection::N));
        assert_eq!(CompassDirection::from_degrees(22.5), Some(CompassDirection::NE));
        assert_eq!(CompassDirection::from_degrees(44.0), Some(CompassDirection::NE));
        assert_eq!(CompassDirection::from_degrees(45.0), Some(CompassDirection::NE));
        assert_eq!(CompassDirection::from_degrees(90.0), Some(CompassDirection::E));
        assert_eq!(CompassDirection::from_degrees(180.0), Some(CompassDirection::S));
        assert_eq!(CompassDirection::from_degrees(270.0), Some(CompassDirection::W));
        assert_eq!(CompassDirection::from_degrees(337.4), Some(CompassDirection::NW));
        assert_eq!(CompassDirection::from_degrees(337.5), Some(CompassDirection::N));
    }

    #[test]
    fn test_wraps_full_turns_and_negative_bearings() {
        assert_eq!(CompassDirection::from_degrees(360.0), Some(CompassDirection::N));
        assert_eq!(CompassDirection::from_degrees(405.0), Some(CompassDirection::NE));
        assert_eq!(CompassDirection::from_degrees(-45.0), Some(CompassDirection::NW));
    }

    #[test]
    fn test_rejects_non_finite_bearings() {
        assert_eq!(CompassDirection::from_degrees(f64::NAN), None);
        assert_eq!(CompassDirection::from_degrees(f64::INFINITY), None);
    }

    #[test]
    fn test_labels_round_trip() {
        for direction in CompassDirection::ALL {
            assert_eq!(CompassDirection::from_label(direction.as_str()), Some(direction));
        }
        assert_eq!(CompassDirection::from_label("NNE"), None);
        assert_eq!(CompassDirection::SW.to_string(), "SW");
    }
}
