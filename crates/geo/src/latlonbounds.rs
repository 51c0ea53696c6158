use crate::Coordinate;

/// A rectangle in latitude/longitude space (degrees)
///
/// The bounds are stored as provided, corners are never swapped.
/// Use [`LatLonBounds::valid`] to check that the minimum lies strictly below the maximum on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonBounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl LatLonBounds {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        LatLonBounds {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Bounds spanned by the north-west and south-east corner
    pub const fn from_nw_se(nw: Coordinate, se: Coordinate) -> Self {
        LatLonBounds::new(se.latitude, nw.longitude, nw.latitude, se.longitude)
    }

    pub fn valid(&self) -> bool {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lat < self.max_lat
            && self.min_lon < self.max_lon
    }

    pub fn northwest(&self) -> Coordinate {
        Coordinate::latlon(self.max_lat, self.min_lon)
    }

    pub fn southeast(&self) -> Coordinate {
        Coordinate::latlon(self.min_lat, self.max_lon)
    }

    pub fn contains(&self, coord: Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coord.latitude) && (self.min_lon..=self.max_lon).contains(&coord.longitude)
    }
}

impl std::fmt::Display for LatLonBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} - {}]", self.northwest(), self.southeast())
    }
}
