use std::collections::HashSet;
use std::sync::Mutex;

use geo::{LatLonBounds, Tile, TileRange};
use image::{ImageFormat, Rgba, RgbaImage};
use inf::progressinfo::{CallbackProgress, ComputationStatus, DummyProgress};
use stitcher::{
    DirectoryTileCache, Error, FetchError, SourceTileFetcher, StitchConfig, TileFetcher, TileSource, TileStitcher,
    TileTransport,
};

const TILE_SIZE: u32 = 8;
const URL_TEMPLATE: &str = "test://tiles/{z}/{x}/{y}.{ext}";

/// Serves a single colored square for every tile within the served zoom level
struct SolidTileServer {
    zoom: i32,
    missing: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl SolidTileServer {
    fn new(zoom: i32) -> Self {
        SolidTileServer {
            zoom,
            missing: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn without(mut self, tile: Tile) -> Self {
        self.missing.insert(source().tile_url(tile));
        self
    }

    fn request_count(&self) -> usize {
        self.requests.lock().expect("poisoned").len()
    }
}

fn tile_color(x: i32, y: i32) -> Rgba<u8> {
    Rgba([(x % 251) as u8, (y % 241) as u8, 128, 255])
}

fn parse_tile(url: &str) -> Option<Tile> {
    let path = url.strip_prefix("test://tiles/")?.strip_suffix(".png")?;
    let mut parts = path.split('/').map(|v| v.parse::<i32>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(z)), Some(Ok(x)), Some(Ok(y))) => Some(Tile { x, y, z }),
        _ => None,
    }
}

impl TileTransport for SolidTileServer {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.requests.lock().expect("poisoned").push(url.to_string());
        if self.missing.contains(url) {
            return Err(FetchError::HttpStatus(404));
        }

        let tile = parse_tile(url).ok_or(FetchError::HttpStatus(400))?;
        if tile.z != self.zoom {
            return Err(FetchError::HttpStatus(404));
        }

        let mut data = std::io::Cursor::new(Vec::new());
        RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, tile_color(tile.x, tile.y))
            .write_to(&mut data, ImageFormat::Png)
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        Ok(data.into_inner())
    }
}

fn source() -> TileSource {
    TileSource::new(URL_TEMPLATE, "png").expect("valid template")
}

fn test_config(bounds: LatLonBounds, zoom: i32, output: &std::path::Path) -> stitcher::Result<StitchConfig> {
    StitchConfig::builder()
        .bounds(bounds)
        .zoom(zoom)
        .output(output)
        .tile_source(source())
        .tile_size(TILE_SIZE)
        .concurrency(16)
        .build()
}

#[test_log::test(tokio::test)]
async fn stitch_bordeaux_at_zoom_17() -> stitcher::Result {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("bordeaux.png");
    let bounds = LatLonBounds::new(44.80924, -0.64236, 44.87959, -0.46795);

    let config = test_config(bounds, 17, &output)?;
    let stitcher = TileStitcher::new(config, SourceTileFetcher::new(source(), SolidTileServer::new(17), TILE_SIZE));

    let grid = stitcher.plan()?;
    assert_eq!((grid.width(), grid.height()), (64, 37));

    let outcome = stitcher.run(DummyProgress).await?;
    assert!(outcome.is_complete());
    assert_eq!(outcome.total_tiles, 2368);
    assert_eq!(outcome.range.x.lo, 65302);
    assert_eq!(outcome.range.y.lo, 47211);

    let image = image::open(&output)?.to_rgba8();
    assert_eq!(image.dimensions(), (64 * TILE_SIZE, 37 * TILE_SIZE));

    // every tile lands in its own cell
    for tile in [Tile { x: 65302, y: 47211, z: 17 }, Tile { x: 65365, y: 47247, z: 17 }, Tile { x: 65330, y: 47220, z: 17 }] {
        let px = (tile.x - 65302) as u32 * TILE_SIZE;
        let py = (tile.y - 47211) as u32 * TILE_SIZE;
        assert_eq!(*image.get_pixel(px, py), tile_color(tile.x, tile.y));
        assert_eq!(*image.get_pixel(px + TILE_SIZE - 1, py + TILE_SIZE - 1), tile_color(tile.x, tile.y));
    }
    Ok(())
}

#[test_log::test(tokio::test)]
async fn single_tile_box() -> stitcher::Result {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("single.png");
    let bounds = LatLonBounds::new(50.8, 4.3, 50.9, 4.5);

    let config = test_config(bounds, 10, &output)?;
    let outcome = TileStitcher::new(config, SourceTileFetcher::new(source(), SolidTileServer::new(10), TILE_SIZE))
        .run(DummyProgress)
        .await?;

    assert_eq!(outcome.total_tiles, 1);
    let image = image::open(&output)?.to_rgba8();
    assert_eq!(image.dimensions(), (TILE_SIZE, TILE_SIZE));
    assert!(image.pixels().all(|p| *p == tile_color(524, 343)));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn stitch_whole_world() -> stitcher::Result {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("world.png");
    let bounds = LatLonBounds::new(-85.0, -180.0, 85.0, 180.0);

    let config = test_config(bounds, 2, &output)?;
    let outcome = TileStitcher::new(config, SourceTileFetcher::new(source(), SolidTileServer::new(2), TILE_SIZE))
        .run(DummyProgress)
        .await?;

    assert!(outcome.is_complete());
    assert_eq!(outcome.total_tiles, 16);
    let image = image::open(&output)?.to_rgba8();
    assert_eq!(image.dimensions(), (4 * TILE_SIZE, 4 * TILE_SIZE));
    assert_eq!(*image.get_pixel(4 * TILE_SIZE - 1, 4 * TILE_SIZE - 1), tile_color(3, 3));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn missing_tiles_are_reported() -> stitcher::Result {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("partial.png");
    let bounds = LatLonBounds::new(44.80924, -0.64236, 44.87959, -0.46795);
    let missing = Tile { x: 2042, y: 1475, z: 12 };

    let config = test_config(bounds, 12, &output)?;
    let server = SolidTileServer::new(12).without(missing);
    let outcome = TileStitcher::new(config, SourceTileFetcher::new(source(), server, TILE_SIZE))
        .run(DummyProgress)
        .await?;

    assert_eq!(outcome.total_tiles, 6);
    assert_eq!(outcome.failed_count(), 1);
    assert_eq!(outcome.failures[0].tile, missing);
    assert_eq!(outcome.failures[0].error, FetchError::HttpStatus(404));

    let image = image::open(&output)?.to_rgba8();
    assert_eq!(*image.get_pixel(2 * TILE_SIZE, 0), Rgba([0, 0, 0, 0]));
    assert_eq!(*image.get_pixel(0, 0), tile_color(2040, 1475));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn oversized_request_is_rejected_before_fetching() -> stitcher::Result {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("large.png");
    let config = StitchConfig::builder()
        .bounds(LatLonBounds::new(40.0, -5.0, 50.0, 5.0))
        .zoom(16)
        .output(&output)
        .tile_source(source())
        .tile_size(TILE_SIZE)
        .build()?;

    let range = TileRange::for_bounds(config.bounds(), config.zoom()).expect("valid range");
    assert!(range.tile_count() > config.max_tile_count());

    let stitcher = TileStitcher::new(config, SourceTileFetcher::new(source(), SolidTileServer::new(16), TILE_SIZE));
    assert!(matches!(stitcher.run(DummyProgress).await, Err(Error::Config(_))));
    assert!(!output.exists());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn cancelled_run_writes_nothing() -> stitcher::Result {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("cancelled.png");
    let bounds = LatLonBounds::new(44.80924, -0.64236, 44.87959, -0.46795);

    let config = test_config(bounds, 17, &output)?;
    let fetcher = SourceTileFetcher::new(source(), SolidTileServer::new(17), TILE_SIZE);
    let stitcher = TileStitcher::new(config, fetcher);

    let progress = CallbackProgress::<(), _>::with_cb(|pos, _| {
        if pos > 0.1 {
            ComputationStatus::Abort
        } else {
            ComputationStatus::Continue
        }
    });

    assert!(matches!(stitcher.run(&progress).await, Err(Error::Cancelled)));
    assert!(progress.completed() < 2368);
    assert!(!output.exists());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn cached_tiles_are_not_requested_again() -> stitcher::Result {
    let dir = tempfile::tempdir()?;
    let cache = DirectoryTileCache::new(dir.path().join("cache"), "png");
    let tile = Tile { x: 524, y: 343, z: 10 };

    let fetcher = SourceTileFetcher::new(source(), SolidTileServer::new(10), TILE_SIZE).with_cache(cache.clone());
    fetcher.fetch(tile).await.expect("tile available");
    fetcher.fetch(tile).await.expect("tile available");

    assert!(cache.tile_path(tile).exists());
    assert_eq!(fetcher.transport().request_count(), 1);
    Ok(())
}
