#![warn(clippy::unwrap_used)]

mod compositor;
pub mod config;
mod fetcher;
mod orchestrator;
mod tilecache;
mod tileimage;
pub mod tilesource;
pub mod transport;

#[cfg(test)]
mod testutils;

use thiserror::Error;

pub use compositor::Canvas;
pub use compositor::output_format;
pub use config::StitchConfig;
pub use fetcher::FetchError;
pub use fetcher::FetchedTile;
pub use fetcher::SourceTileFetcher;
pub use fetcher::TileFetcher;
pub use fetcher::TileOrigin;
pub use orchestrator::StitchOutcome;
pub use orchestrator::StitchState;
pub use orchestrator::TileFailure;
pub use orchestrator::TileStitcher;
pub use orchestrator::plan_grid;
pub use orchestrator::stitch_tiles;
pub use tilecache::DirectoryTileCache;
pub use tileimage::TileImage;
pub use tilesource::TileSource;
pub use transport::HttpTransport;
pub use transport::RetryPolicy;
pub use transport::TileTransport;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Error: {0}")]
    Runtime(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
    #[error("Error: {0}")]
    InfError(inf::Error),
}

impl From<inf::Error> for Error {
    fn from(err: inf::Error) -> Self {
        match err {
            inf::Error::Cancelled => Error::Cancelled,
            inf::Error::IOError(err) => Error::IOError(err),
            _ => Error::InfError(err),
        }
    }
}

pub type Result<T = ()> = std::result::Result<T, Error>;
