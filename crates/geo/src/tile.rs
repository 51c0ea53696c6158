use crate::{Coordinate, LatLonBounds};
use std::f64::consts::PI;

/// An XYZ web mercator tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Tile {
    pub const TILE_SIZE: u32 = 256;

    /// Projects a coordinate on the tile grid of the given zoom level using the spherical web mercator formula.
    ///
    /// Coordinates outside of the mercator range are not clamped:
    /// - positions west or north of the grid origin produce negative indices
    ///   (the exact mercator latitude limit already rounds to y = -1, [`crate::TileRange::for_bounds`] snaps it to row 0)
    /// - positions on or beyond the east/south edge produce indices >= 2^zoom (e.g. longitude 180)
    /// - latitudes that make the formula undefined (±90°) produce NaN which is converted to 0
    ///
    /// Use [`Tile::is_valid`] to detect these cases.
    pub fn for_coordinate(coord: Coordinate, zoom: i32) -> Tile {
        let n = f64::powi(2.0, zoom);
        let lat_rad = coord.latitude.to_radians();

        let x = ((coord.longitude + 180.0) / 360.0 * n).floor();
        let y = (n * (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0).floor();

        // float to int casts saturate, NaN becomes 0
        Tile {
            x: x as i32,
            y: y as i32,
            z: zoom,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    /// Number of tiles along one axis at this zoom level
    pub fn tiles_per_axis(zoom: i32) -> i64 {
        1i64 << zoom.clamp(0, 62)
    }

    /// True when the tile lies within the `[0, 2^z)` grid of its zoom level
    pub fn is_valid(&self) -> bool {
        let n = Tile::tiles_per_axis(self.z);
        self.z >= 0 && (0..n).contains(&(self.x as i64)) && (0..n).contains(&(self.y as i64))
    }

    pub fn upper_left(&self) -> Coordinate {
        let z2 = f64::powi(2.0, self.z);
        let lon_degrees = self.x as f64 / z2 * 360.0 - 180.0;
        let lat_rad = (PI * (1.0 - 2.0 * self.y as f64 / z2)).sinh().atan();

        Coordinate::latlon(lat_rad.to_degrees(), lon_degrees)
    }

    pub fn lower_right(&self) -> Coordinate {
        Tile {
            x: self.x + 1,
            y: self.y + 1,
            z: self.z,
        }
        .upper_left()
    }

    pub fn bounds(&self) -> LatLonBounds {
        LatLonBounds::from_nw_se(self.upper_left(), self.lower_right())
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
