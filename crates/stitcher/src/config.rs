use std::path::{Path, PathBuf};
use std::time::Duration;

use bon::bon;
use geo::{LatLonBounds, constants::MAX_MERCATOR_LATITUDE, constants::MAX_ZOOM_LEVEL};
use image::Rgba;

use crate::{Error, Result, TileSource, output_format};

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_MAX_TILE_COUNT: u64 = 10_000;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub fn default_user_agent() -> String {
    format!("tilestitch/{}", env!("CARGO_PKG_VERSION"))
}

/// Immutable settings of a stitch run, the builder validates the settings
///
/// ```no_run
/// # use stitcher::StitchConfig;
/// let config = StitchConfig::builder()
///     .bounds(geo::LatLonBounds::new(44.80924, -0.64236, 44.87959, -0.46795))
///     .zoom(17)
///     .output("bordeaux.png")
///     .tile_cache_dir("downloaded_tiles")
///     .build()?;
/// # Ok::<(), stitcher::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct StitchConfig {
    bounds: LatLonBounds,
    zoom: i32,
    output: PathBuf,
    tile_source: TileSource,
    tile_cache_dir: Option<PathBuf>,
    concurrency: usize,
    max_tile_count: u64,
    request_timeout: Duration,
    max_retries: u32,
    tile_size: u32,
    user_agent: String,
    background: Rgba<u8>,
}

#[bon]
impl StitchConfig {
    #[builder]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bounds: LatLonBounds,
        zoom: i32,
        #[builder(into)] output: PathBuf,
        #[builder(default)] tile_source: TileSource,
        #[builder(into)] tile_cache_dir: Option<PathBuf>,
        #[builder(default = DEFAULT_CONCURRENCY)] concurrency: usize,
        #[builder(default = DEFAULT_MAX_TILE_COUNT)] max_tile_count: u64,
        #[builder(default = DEFAULT_REQUEST_TIMEOUT)] request_timeout: Duration,
        #[builder(default = DEFAULT_MAX_RETRIES)] max_retries: u32,
        #[builder(default = geo::Tile::TILE_SIZE)] tile_size: u32,
        #[builder(default = default_user_agent(), into)] user_agent: String,
        #[builder(default = TRANSPARENT)] background: Rgba<u8>,
    ) -> Result<Self> {
        if !bounds.valid() {
            return Err(Error::Config(format!(
                "Invalid bounding box {bounds}: the minimum latitude and longitude must be smaller than the maximum"
            )));
        }

        if bounds.min_lat < -MAX_MERCATOR_LATITUDE || bounds.max_lat > MAX_MERCATOR_LATITUDE {
            return Err(Error::Config(format!(
                "Bounding box {bounds} exceeds the web mercator latitude range (±{MAX_MERCATOR_LATITUDE})"
            )));
        }

        if bounds.min_lon < -180.0 || bounds.max_lon > 180.0 {
            return Err(Error::Config(format!("Bounding box {bounds} exceeds the longitude range (±180)")));
        }

        if !(0..=MAX_ZOOM_LEVEL).contains(&zoom) {
            return Err(Error::Config(format!("Zoom level {zoom} out of range [0, {MAX_ZOOM_LEVEL}]")));
        }

        if concurrency == 0 {
            return Err(Error::Config("Concurrency must be at least 1".to_string()));
        }

        if max_tile_count == 0 {
            return Err(Error::Config("Maximum tile count must be at least 1".to_string()));
        }

        if tile_size == 0 {
            return Err(Error::Config("Tile size must be greater than 0".to_string()));
        }

        if request_timeout.is_zero() {
            return Err(Error::Config("Request timeout must be greater than 0".to_string()));
        }

        output_format(&output)?;

        Ok(StitchConfig {
            bounds,
            zoom,
            output,
            tile_source,
            tile_cache_dir,
            concurrency,
            max_tile_count,
            request_timeout,
            max_retries,
            tile_size,
            user_agent,
            background,
        })
    }

    pub fn bounds(&self) -> LatLonBounds {
        self.bounds
    }

    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn tile_source(&self) -> &TileSource {
        &self.tile_source
    }

    pub fn tile_cache_dir(&self) -> Option<&Path> {
        self.tile_cache_dir.as_deref()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn max_tile_count(&self) -> u64 {
        self.max_tile_count
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn background(&self) -> Rgba<u8> {
        self.background
    }
}
