use std::path::PathBuf;

use futures::StreamExt;
use geo::{GridCell, Tile, TileGrid, TileRange};
use inf::progressinfo::ProgressNotification;

use crate::{
    Canvas, DirectoryTileCache, Error, FetchError, HttpTransport, Result, RetryPolicy, SourceTileFetcher, StitchConfig,
    TileFetcher, TileOrigin,
};

/// Stages of a stitch run
///
/// `Init -> RangeResolved -> CanvasAllocated -> Fetching -> Composing -> Done`,
/// every stage can end in `Failed`. While `Fetching` the tiles are placed on the canvas as soon as they arrive,
/// `Composing` is entered once every tile is accounted for and ends with the output written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchState {
    Init,
    RangeResolved,
    CanvasAllocated,
    Fetching,
    Composing,
    Done,
    Failed,
}

/// A tile that could not be placed on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct TileFailure {
    pub tile: Tile,
    pub cell: GridCell,
    pub error: FetchError,
}

#[derive(Debug, Clone)]
pub struct StitchOutcome {
    pub output: PathBuf,
    pub range: TileRange,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub total_tiles: usize,
    pub cache_hits: usize,
    pub failures: Vec<TileFailure>,
}

impl StitchOutcome {
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn placed_count(&self) -> usize {
        self.total_tiles - self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl std::fmt::Display for StitchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "completed, {}/{} tiles failed", self.failed_count(), self.total_tiles)
    }
}

/// Fetches all tiles covering the configured bounds and assembles them into a single image
pub struct TileStitcher<F: TileFetcher> {
    config: StitchConfig,
    fetcher: F,
}

impl<F: TileFetcher> TileStitcher<F> {
    pub fn new(config: StitchConfig, fetcher: F) -> Self {
        TileStitcher { config, fetcher }
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Resolves the tile grid of the run without fetching anything
    pub fn plan(&self) -> Result<TileGrid> {
        plan_grid(&self.config)
    }

    /// Runs the stitch pipeline, the progress is ticked once for every tile.
    ///
    /// Individual tile failures are reported in the outcome, the affected regions keep the background color.
    /// When the progress notification cancels the run, no new tiles are requested,
    /// pending requests are dropped and no output is written.
    pub async fn run(&self, progress: impl ProgressNotification) -> Result<StitchOutcome> {
        let mut state = StitchState::Init;
        let result = self.execute(&mut state, &progress).await;

        match &result {
            Ok(outcome) => {
                transition(&mut state, StitchState::Done);
                log::info!("Stitching {}: {outcome}", self.config.output().to_string_lossy());
            }
            Err(e) => {
                let failed_in = state;
                transition(&mut state, StitchState::Failed);
                log::debug!("Stitch run failed while {failed_in:?}: {e}");
            }
        }

        result
    }

    async fn execute(&self, state: &mut StitchState, progress: &impl ProgressNotification) -> Result<StitchOutcome> {
        let grid = self.plan()?;
        transition(state, StitchState::RangeResolved);

        let mut canvas = Canvas::for_grid(&grid, self.config.background())?;
        transition(state, StitchState::CanvasAllocated);

        log::info!(
            "Fetching {} tiles ({}x{}) at zoom level {}",
            grid.len(),
            grid.width(),
            grid.height(),
            self.config.zoom()
        );
        progress.reset(grid.len() as u64);
        transition(state, StitchState::Fetching);

        let fetcher = &self.fetcher;
        let mut results = futures::stream::iter(grid.iter())
            .map(|entry| async move { (entry, fetcher.fetch(entry.tile).await) })
            .buffer_unordered(self.config.concurrency());

        let mut failures = Vec::new();
        let mut cache_hits = 0;
        let mut accounted = 0;

        while let Some((entry, result)) = results.next().await {
            let placement = result.and_then(|fetched| {
                if fetched.origin == TileOrigin::Cache {
                    cache_hits += 1;
                }

                canvas
                    .place(&fetched.image, entry.offset)
                    .map_err(|e| FetchError::Decode(e.to_string()))
            });

            if let Err(error) = placement {
                log::warn!("Failed to obtain tile {}: {error}", entry.tile);
                failures.push(TileFailure {
                    tile: entry.tile,
                    cell: entry.cell,
                    error,
                });
            }

            accounted += 1;
            // dropping the stream on cancellation aborts the pending requests
            progress.tick()?;
        }

        if accounted != grid.len() {
            return Err(Error::Runtime(format!(
                "Only {accounted} of {} tiles were processed",
                grid.len()
            )));
        }

        transition(state, StitchState::Composing);
        failures.sort_by_key(|failure: &TileFailure| (failure.cell.x, failure.cell.y));

        let (width, height) = (canvas.width(), canvas.height());
        let output = self.config.output().to_path_buf();
        // encoding is cpu bound, run it on the blocking pool
        tokio::task::spawn_blocking(move || canvas.finalize(&output))
            .await
            .map_err(|e| Error::Runtime(format!("Image encoding task failed: {e}")))??;

        Ok(StitchOutcome {
            output: self.config.output().to_path_buf(),
            range: *grid.range(),
            width,
            height,
            total_tiles: grid.len(),
            cache_hits,
            failures,
        })
    }
}

/// Resolves the tile grid covering the configured bounds.
/// Fails when the bounds do not map to a valid tile range or the tile count exceeds the configured maximum.
pub fn plan_grid(config: &StitchConfig) -> Result<TileGrid> {
    let zoom = config.zoom();
    let range = TileRange::for_bounds(config.bounds(), zoom).map_err(|e| Error::Config(e.to_string()))?;

    if !range.top_left().is_valid() || !range.bottom_right().is_valid() {
        return Err(Error::Config(format!(
            "Tile range {range} exceeds the tile grid of zoom level {zoom}"
        )));
    }

    if range.tile_count() > config.max_tile_count() {
        return Err(Error::Config(format!(
            "Bounding box requires {} tiles at zoom level {zoom}, the maximum is {}",
            range.tile_count(),
            config.max_tile_count()
        )));
    }

    TileGrid::new(range, config.tile_size()).map_err(|e| Error::Config(e.to_string()))
}

fn transition(state: &mut StitchState, next: StitchState) {
    log::debug!("Stitch state {:?} -> {next:?}", *state);
    *state = next;
}

/// Stitches the tiles of the configured tile source using http, reading through the tile cache when configured
pub async fn stitch_tiles(config: StitchConfig, progress: impl ProgressNotification) -> Result<StitchOutcome> {
    let transport = HttpTransport::new(
        config.request_timeout(),
        config.user_agent(),
        RetryPolicy::with_max_retries(config.max_retries()),
    )?;

    let mut fetcher = SourceTileFetcher::new(config.tile_source().clone(), transport, config.tile_size());
    if let Some(dir) = config.tile_cache_dir() {
        fetcher = fetcher.with_cache(DirectoryTileCache::new(dir, config.tile_source().extension()));
    }

    TileStitcher::new(config, fetcher).run(progress).await
}
