use crate::{Error, LatLonBounds, Result, Tile, constants::MAX_MERCATOR_LATITUDE};

/// Inclusive range of tile indices along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub lo: i32,
    pub hi: i32,
}

impl AxisRange {
    pub const fn new(lo: i32, hi: i32) -> Self {
        AxisRange { lo, hi }
    }

    /// Number of tiles in the range, 0 for an inverted range
    pub fn len(&self) -> u32 {
        if self.hi < self.lo {
            0
        } else {
            (self.hi as i64 - self.lo as i64 + 1) as u32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hi < self.lo
    }

    pub fn contains(&self, index: i32) -> bool {
        (self.lo..=self.hi).contains(&index)
    }
}

impl std::fmt::Display for AxisRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.lo, self.hi)
    }
}

/// The tiles covering a bounding box at a zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: i32,
    pub x: AxisRange,
    pub y: AxisRange,
}

impl TileRange {
    /// Resolves the tiles covering `bounds`.
    ///
    /// The north-west corner tile provides the lower x and y index, the south-east corner tile the upper ones.
    /// An inverted range on either axis (inverted bounds or a box crossing the antimeridian) is an error.
    ///
    /// Corners that lie exactly on the edge of the world are snapped onto the grid:
    /// longitude 180 and the southern mercator limit are exclusive edges and map to the last column/row,
    /// the northern mercator limit maps to row 0.
    pub fn for_bounds(bounds: LatLonBounds, zoom: i32) -> Result<TileRange> {
        let tiles_per_axis = Tile::tiles_per_axis(zoom);
        let mut nw = Tile::for_coordinate(bounds.northwest(), zoom);
        let mut se = Tile::for_coordinate(bounds.southeast(), zoom);

        if bounds.max_lon == 180.0 && se.x as i64 == tiles_per_axis {
            se.x -= 1;
        }

        if on_mercator_limit(-bounds.min_lat) && se.y as i64 == tiles_per_axis {
            se.y -= 1;
        }

        if on_mercator_limit(bounds.max_lat) && nw.y == -1 {
            nw.y = 0;
        }

        let range = TileRange {
            zoom,
            x: AxisRange::new(nw.x, se.x),
            y: AxisRange::new(nw.y, se.y),
        };

        if range.x.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "Inverted tile range along x ({}) for bounds {bounds}: the bounds are inverted or cross the antimeridian",
                range.x
            )));
        }

        if range.y.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "Inverted tile range along y ({}) for bounds {bounds}: the bounds are inverted",
                range.y
            )));
        }

        log::debug!("Tile range for {bounds} at zoom {zoom}: x {} y {}", range.x, range.y);
        Ok(range)
    }

    /// Number of tile columns
    pub fn width(&self) -> u32 {
        self.x.len()
    }

    /// Number of tile rows
    pub fn height(&self) -> u32 {
        self.y.len()
    }

    pub fn tile_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn top_left(&self) -> Tile {
        Tile {
            x: self.x.lo,
            y: self.y.lo,
            z: self.zoom,
        }
    }

    pub fn bottom_right(&self) -> Tile {
        Tile {
            x: self.x.hi,
            y: self.y.hi,
            z: self.zoom,
        }
    }

    pub fn contains(&self, tile: Tile) -> bool {
        tile.z == self.zoom && self.x.contains(tile.x) && self.y.contains(tile.y)
    }
}

fn on_mercator_limit(latitude: f64) -> bool {
    (latitude - MAX_MERCATOR_LATITUDE).abs() < 1e-9
}

impl std::fmt::Display for TileRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} ({}x{} tiles)", self.top_left(), self.bottom_right(), self.width(), self.height())
    }
}
