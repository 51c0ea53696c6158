#![warn(clippy::unwrap_used)]

pub type Result<T = ()> = std::result::Result<T, Error>;
pub mod constants;
mod coordinate;
mod error;
mod latlonbounds;
mod tile;
pub mod tilegrid;
mod tilerange;

pub use coordinate::Coordinate;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use latlonbounds::LatLonBounds;
#[doc(inline)]
pub use tile::Tile;
#[doc(inline)]
pub use tilegrid::GridCell;
#[doc(inline)]
pub use tilegrid::GridEntry;
#[doc(inline)]
pub use tilegrid::PixelOffset;
#[doc(inline)]
pub use tilegrid::TileGrid;
#[doc(inline)]
pub use tilerange::AxisRange;
#[doc(inline)]
pub use tilerange::TileRange;
