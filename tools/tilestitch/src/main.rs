use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use comfy_table::Table;
use env_logger::{Env, TimestampPrecision};
use geo::{LatLonBounds, TileGrid};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use inf::duration::Recorder;
use inf::progressinfo::{CallbackProgress, ComputationStatus};
use stitcher::{StitchConfig, StitchOutcome, TileSource};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Stitch(#[from] stitcher::Error),
    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] log::SetLoggerError),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
#[clap(name = "tilestitch", about = "Stitch web map tiles covering a bounding box into a single image")]
pub struct Opt {
    #[clap(long = "min-lat", allow_negative_numbers = true)]
    pub min_lat: f64,

    #[clap(long = "min-lon", allow_negative_numbers = true)]
    pub min_lon: f64,

    #[clap(long = "max-lat", allow_negative_numbers = true)]
    pub max_lat: f64,

    #[clap(long = "max-lon", allow_negative_numbers = true)]
    pub max_lon: f64,

    #[clap(long = "zoom", short = 'z')]
    pub zoom: i32,

    #[clap(long = "output", short = 'o')]
    pub output: PathBuf,

    /// Tile url template containing {z}, {x} and {y} placeholders, {ext} is replaced by the tile extension
    #[clap(long = "url", short = 'u', env = "TILESTITCH_URL", default_value = stitcher::tilesource::OPENSTREETMAP_URL_TEMPLATE)]
    pub url: String,

    #[clap(long = "ext", env = "TILESTITCH_EXT", default_value = "png")]
    pub extension: String,

    /// Directory where downloaded tiles are kept, tiles present in the directory are not downloaded again
    #[clap(long = "tile-dir", env = "TILESTITCH_TILE_DIR")]
    pub tile_dir: Option<PathBuf>,

    #[clap(long = "concurrency", short = 'j', env = "TILESTITCH_CONCURRENCY", default_value_t = stitcher::config::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    #[clap(long = "max-tiles", env = "TILESTITCH_MAX_TILES", default_value_t = stitcher::config::DEFAULT_MAX_TILE_COUNT)]
    pub max_tiles: u64,

    /// Request timeout in seconds
    #[clap(long = "timeout", env = "TILESTITCH_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    #[clap(long = "retries", env = "TILESTITCH_RETRIES", default_value_t = stitcher::config::DEFAULT_MAX_RETRIES)]
    pub retries: u32,

    #[clap(long = "user-agent", env = "TILESTITCH_USER_AGENT")]
    pub user_agent: Option<String>,

    #[clap(long = "tile-size", default_value = "256")]
    pub tile_size: u32,

    /// Print the tile range and image size without downloading anything
    #[clap(long = "dry-run")]
    pub dry_run: bool,

    #[clap(long = "noprogress")]
    pub no_progress: bool,
}

impl Opt {
    fn stitch_config(&self) -> Result<StitchConfig> {
        let bounds = LatLonBounds::new(self.min_lat, self.min_lon, self.max_lat, self.max_lon);

        Ok(StitchConfig::builder()
            .bounds(bounds)
            .zoom(self.zoom)
            .output(&self.output)
            .tile_source(TileSource::new(&self.url, &self.extension)?)
            .maybe_tile_cache_dir(self.tile_dir.clone())
            .concurrency(self.concurrency)
            .max_tile_count(self.max_tiles)
            .request_timeout(Duration::from_secs(self.timeout))
            .max_retries(self.retries)
            .tile_size(self.tile_size)
            .maybe_user_agent(self.user_agent.clone())
            .build()?)
    }
}

fn print_plan(config: &StitchConfig, grid: &TileGrid) {
    let (width, height) = grid.pixel_size();

    let mut table = Table::new();
    table
        .set_header(vec!["Plan", "Value"])
        .add_row(vec!["Bounds", &config.bounds().to_string()])
        .add_row(vec!["Zoom level", &config.zoom().to_string()])
        .add_row(vec!["Tile range", &grid.range().to_string()])
        .add_row(vec!["Tiles", &format!("{} ({}x{})", grid.len(), grid.width(), grid.height())])
        .add_row(vec!["Image size", &format!("{width}x{height}")])
        .add_row(vec!["Tile url", config.tile_source().url_template()]);

    println!("{table}");
}

fn print_outcome(outcome: &StitchOutcome, recorder: &Recorder) {
    let mut table = Table::new();
    table
        .set_header(vec!["Summary", "Value"])
        .add_row(vec!["Tile range", &outcome.range.to_string()])
        .add_row(vec!["Tiles", &outcome.total_tiles.to_string()])
        .add_row(vec!["Placed", &outcome.placed_count().to_string()])
        .add_row(vec!["Failed", &outcome.failed_count().to_string()])
        .add_row(vec!["From cache", &outcome.cache_hits.to_string()])
        .add_row(vec!["Image size", &format!("{}x{}", outcome.width, outcome.height)])
        .add_row(vec!["Elapsed", &recorder.elapsed_time_string()]);

    println!("{table}");

    if !outcome.is_complete() {
        let mut failures = Table::new();
        failures.set_header(vec!["Tile", "Column", "Row", "Error"]);
        for failure in &outcome.failures {
            failures.add_row(vec![
                failure.tile.to_string(),
                failure.cell.x.to_string(),
                failure.cell.y.to_string(),
                failure.error.to_string(),
            ]);
        }

        println!("{failures}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    let logger = env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp(Some(TimestampPrecision::Millis))
        .build();

    let multi = MultiProgress::new();
    let level = logger.filter();
    LogWrapper::new(multi.clone(), logger).try_init()?;
    log::set_max_level(level);

    let config = opt.stitch_config()?;
    let grid = stitcher::plan_grid(&config)?;

    if opt.dry_run {
        print_plan(&config, &grid);
        return Ok(());
    }

    let progress = if opt.no_progress {
        ProgressBar::hidden()
    } else {
        multi.add(ProgressBar::new(grid.len() as u64))
    };
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {wide_bar} {pos}/{len} tiles ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, stopping the download");
                cancelled.store(true, Ordering::SeqCst);
            }
        });
    }

    let recorder = Recorder::new();
    let p = progress.clone();
    let total_tiles = grid.len() as f64;
    let outcome = stitcher::stitch_tiles(
        config,
        CallbackProgress::<(), _>::with_cb(move |pos, _| {
            progress.set_position((pos * total_tiles).round() as u64);
            if cancelled.load(Ordering::SeqCst) {
                ComputationStatus::Abort
            } else {
                ComputationStatus::Continue
            }
        }),
    )
    .await;

    match outcome {
        Ok(outcome) => {
            p.finish_with_message("Stitching done");
            print_outcome(&outcome, &recorder);
            println!("Image written to {}", std::path::absolute(&outcome.output)?.to_string_lossy());
            Ok(())
        }
        Err(e) => {
            p.abandon();
            Err(e.into())
        }
    }
}
