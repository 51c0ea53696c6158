//! Stitches web map tiles covering a bounding box into a single image.
//!
//! * [`geo`]: web mercator tile math (tile ranges and the grid layout)
//! * [`inf`]: shared infrastructure (progress reporting, atomic file writes, durations)
//! * [`stitcher`]: tile fetching and image composition

pub use geo;
pub use inf;
pub use stitcher;

pub use stitcher::{Error, Result, StitchConfig, StitchOutcome, stitch_tiles};
